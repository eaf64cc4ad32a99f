//! The application controller: owns the context, the scene and the modal,
//! and turns window input into their operations.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::context::AppContext;
use crate::events::{Event, SubscriptionId, Topic};
use crate::localization::{LocaleError, LocaleTable, Localization};
use crate::modal::{Modal, ModalClick};
use crate::project::{self, Filter, ProjectError, ProjectRecord};
use crate::scene::navbar::NavTarget;
use crate::scene::{Frame, MainScene, Updatable};
use crate::storage::Preferences;
use crate::ui::draw::DrawList;
use crate::ui::theme::{Theme, ThemeMode};
use crate::ui::{Action, KeyBindings, KeyCombo, MouseButton, SequenceDetector, Size};

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("locale table: {0}")]
    Locale(#[from] LocaleError),
    #[error("projects: {0}")]
    Projects(#[from] ProjectError),
}

const VAPORWAVE_TIME: Duration = Duration::from_secs(10);
/// One full hue turn every three seconds.
const VAPORWAVE_DEG_PER_SEC: f32 = 120.0;

pub struct Showcase {
    ctx: AppContext,
    /// Every loaded record, newest first.
    records: Vec<Rc<ProjectRecord>>,
    filter: Filter,
    scene: MainScene,
    modal: Modal,
    /// Filled by the cartridge click callback, drained after input.
    selections: Rc<RefCell<Vec<Rc<ProjectRecord>>>>,
    theme: Rc<RefCell<Theme>>,
    theme_sub: Option<SubscriptionId>,
    bindings: KeyBindings,
    konami: SequenceDetector,
    vaporwave_since: Option<Instant>,
    cursor: (f32, f32),
    last_frame: Instant,
}

impl Showcase {
    /// Load the locale table and project sources, then build the scene.
    pub fn boot(
        settings: &Settings,
        prefs: Preferences,
        viewport: Size,
        now: Instant,
    ) -> Result<Self, BootError> {
        let table = LocaleTable::load(&settings.locale_table)?;
        let locale = Localization::restore(Rc::new(table), &prefs, &settings.default_locale);
        let ctx = AppContext::new(locale, prefs, settings.default_theme);
        let records = project::load_all(&settings.projects_dir)?;
        Ok(Self::from_parts(
            ctx,
            records,
            settings.star_count,
            settings.seed,
            viewport,
            now,
        ))
    }

    /// Build from already-loaded parts. `records` should be sorted.
    pub fn from_parts(
        mut ctx: AppContext,
        records: Vec<ProjectRecord>,
        star_count: usize,
        seed: Option<u64>,
        viewport: Size,
        now: Instant,
    ) -> Self {
        let theme = Rc::new(RefCell::new(Theme::for_mode(ctx.theme_mode)));
        let handler_theme = Rc::clone(&theme);
        let theme_sub = ctx.bus.subscribe(Topic::ThemeChanged, move |event| {
            if let Event::ThemeChanged { mode } = event {
                *handler_theme.borrow_mut() = Theme::for_mode(*mode);
            }
        });

        let bindings = KeyBindings::defaults();
        let hint = bindings.label_for(Action::ToggleTheme);
        let mut scene = MainScene::new(&mut ctx, star_count, seed, viewport, hint, now);

        let records: Vec<Rc<ProjectRecord>> = records.into_iter().map(Rc::new).collect();
        let selections = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&selections);
        scene.add_projects(
            &records,
            Some(Box::new(move |record: &Rc<ProjectRecord>| {
                sink.borrow_mut().push(Rc::clone(record));
            })),
            now,
        );

        log::info!(
            "showcase ready: {} projects, locale {}, theme {}",
            records.len(),
            ctx.locale.locale(),
            ctx.theme_mode.as_str()
        );

        Self {
            ctx,
            records,
            filter: Filter::All,
            scene,
            modal: Modal::new(viewport, now),
            selections,
            theme,
            theme_sub: Some(theme_sub),
            bindings,
            konami: SequenceDetector::konami(),
            vaporwave_since: None,
            cursor: (0.0, 0.0),
            last_frame: now,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn scene(&self) -> &MainScene {
        &self.scene
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn records(&self) -> &[Rc<ProjectRecord>] {
        &self.records
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn theme(&self) -> Theme {
        self.theme.borrow().clone()
    }

    pub fn is_vaporwave(&self) -> bool {
        self.vaporwave_since.is_some()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Show only records matching `filter`. Returns false if it was already
    /// active.
    pub fn apply_filter(&mut self, filter: Filter, now: Instant) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        let visible: Vec<&str> = project::filter(&self.records, filter)
            .into_iter()
            .map(|r| r.slug.as_str())
            .collect();
        log::debug!("filter {} shows {} project(s)", filter.as_str(), visible.len());
        self.scene.filter_cartridges(visible, now);
        self.ctx.bus.publish(&Event::FilterChanged { filter });
        true
    }

    pub fn switch_locale(&mut self, code: &str) -> Result<bool, LocaleError> {
        let changed = self.ctx.switch_locale(code)?;
        if changed {
            log::info!("locale switched to {code}");
            self.modal.relocalize(&self.ctx.locale);
        }
        Ok(changed)
    }

    pub fn cycle_locale(&mut self) {
        let next = self.ctx.locale.next_locale().to_string();
        if let Err(e) = self.switch_locale(&next) {
            log::warn!("{e}");
        }
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        let mode = self.ctx.toggle_theme();
        log::info!("theme {}", mode.as_str());
        mode
    }

    pub fn open_project(&mut self, record: Rc<ProjectRecord>, now: Instant) {
        self.scene.reset_pointer();
        self.modal
            .open(record, &self.ctx.locale, self.scene.page_mut(), now);
    }

    fn open_selected(&mut self, now: Instant) {
        let picked = self.selections.borrow_mut().pop();
        self.selections.borrow_mut().clear();
        if let Some(record) = picked {
            self.open_project(record, now);
        }
    }

    fn start_vaporwave(&mut self, now: Instant) {
        self.vaporwave_since = Some(now);
        let msg = self.ctx.locale.text_or_key("toast_vaporwave_on").to_string();
        self.scene.show_toast(msg, now);
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Returns true if the key did something.
    pub fn key_pressed(&mut self, combo: KeyCombo, now: Instant) -> bool {
        if self.konami.push(combo.key) {
            self.start_vaporwave(now);
            return true;
        }
        let Some(action) = self.bindings.lookup(combo) else {
            return false;
        };
        match action {
            Action::CloseModal => self.modal.close(now),
            Action::CycleLocale => {
                self.cycle_locale();
                true
            }
            Action::ToggleTheme => {
                self.toggle_theme();
                true
            }
            Action::SetFilter(filter) => self.apply_filter(filter, now),
        }
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.cursor = (x, y);
        if !self.modal.is_open() {
            self.scene.pointer_moved(x, y);
        }
    }

    pub fn pointer_pressed(&mut self, button: MouseButton) {
        if !self.modal.is_open() {
            self.scene.pointer_pressed(button);
        }
    }

    pub fn pointer_released(&mut self, button: MouseButton, now: Instant) {
        if self.modal.is_open() {
            if button != MouseButton::Left {
                return;
            }
            let (x, y) = self.cursor;
            if let Some(ModalClick::Link(url)) = self.modal.click(x, y, now) {
                log::info!("link activated: {url}");
            }
            return;
        }
        match self.scene.pointer_released(button) {
            Some(NavTarget::Locale(i)) => {
                if let Some(code) = self.scene.navbar().locale_code(i).map(str::to_string)
                    && let Err(e) = self.switch_locale(&code)
                {
                    log::warn!("{e}");
                }
            }
            Some(NavTarget::Filter(filter)) => {
                self.apply_filter(filter, now);
            }
            Some(NavTarget::ToggleTheme) => {
                self.toggle_theme();
            }
            None => self.open_selected(now),
        }
    }

    /// Wheel delta in pixels, positive scrolls down.
    pub fn scroll(&mut self, delta: f32) {
        if !self.modal.is_open() {
            self.scene.scroll(delta);
        }
    }

    pub fn resize(&mut self, viewport: Size) {
        self.scene.resize(viewport);
        self.modal.resize(viewport);
    }

    // -----------------------------------------------------------------------
    // Frame
    // -----------------------------------------------------------------------

    pub fn frame(&mut self, now: Instant) {
        let frame = Frame::from_elapsed(now, now.saturating_duration_since(self.last_frame));
        self.last_frame = now;

        self.scene.update(&frame);
        self.open_selected(now);
        if self.modal.update(now, self.scene.page_mut()) {
            let (x, y) = self.cursor;
            self.scene.pointer_moved(x, y);
        }

        if let Some(since) = self.vaporwave_since {
            let elapsed = now.saturating_duration_since(since);
            if elapsed >= VAPORWAVE_TIME {
                self.vaporwave_since = None;
                self.scene.set_hue_shift(None);
                let msg = self.ctx.locale.text_or_key("toast_vaporwave_off").to_string();
                self.scene.show_toast(msg, now);
            } else {
                let deg = (elapsed.as_secs_f32() * VAPORWAVE_DEG_PER_SEC) % 360.0;
                self.scene.set_hue_shift(Some(deg));
            }
        }
    }

    pub fn draw(&self, list: &mut DrawList) {
        let theme = self.theme.borrow();
        self.scene.draw(list, &theme, &self.ctx.locale);
        self.modal.draw(list, &theme);
    }

    /// Tear the scene down and drop every subscription.
    pub fn shutdown(&mut self) {
        self.scene.teardown(&mut self.ctx.bus);
        if let Some(id) = self.theme_sub.take() {
            self.ctx.bus.unsubscribe(Topic::ThemeChanged, id);
        }
        log::info!("showcase shut down");
    }
}
