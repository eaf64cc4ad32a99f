//! Retained scene: shelf grid of cartridges over a star field, with the
//! navbar, footer and toast on top.

pub mod cartridge;
pub mod footer;
pub mod layout;
pub mod navbar;
pub mod star;
pub mod text;
pub mod toast;

use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::RngExt;
use rand::rngs::StdRng;
use slotmap::{SlotMap, new_key_type};

use crate::context::AppContext;
use crate::events::EventBus;
use crate::localization::Localization;
use crate::modal::PageScroll;
use crate::project::ProjectRecord;
use crate::rng::rng_for;
use crate::ui::draw::{DrawList, PanelCommand};
use crate::ui::input::PointerEvents;
use crate::ui::theme::Theme;
use crate::ui::{MouseButton, PointerEvent, PointerTracker, Rect, Size};

use cartridge::Cartridge;
use footer::Footer;
use layout::GridLayout;
use navbar::{NavTarget, Navbar};
use star::StarField;
use toast::Toast;

new_key_type! {
    /// Handle into the cartridge arena. Survives relayout.
    pub struct EntityId;
}

/// Per-frame timing handed to every [`Updatable`].
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub now: Instant,
    /// Elapsed time in 60 Hz frames.
    pub dt: f32,
}

/// Longest step a single frame may take, in 60 Hz frames.
const MAX_DT: f32 = 4.0;

impl Frame {
    pub fn from_elapsed(now: Instant, elapsed: Duration) -> Self {
        Self {
            now,
            dt: (elapsed.as_secs_f32() * 60.0).min(MAX_DT),
        }
    }
}

/// Anything advanced once per frame.
pub trait Updatable {
    fn update(&mut self, frame: &Frame);
}

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTarget {
    Nav(NavTarget),
    Cartridge(EntityId),
}

pub type ClickHandler = Box<dyn FnMut(&Rc<ProjectRecord>)>;

const MAX_ENTRANCE_DELAY_MS: u64 = 500;

pub struct MainScene {
    viewport: Size,
    layout: GridLayout,
    cartridges: SlotMap<EntityId, Cartridge>,
    /// Insertion order; update and draw follow it.
    order: Vec<EntityId>,
    on_click: Option<ClickHandler>,
    navbar: Navbar,
    footer: Footer,
    stars: StarField,
    toast: Option<Toast>,
    pointer: PointerTracker<HitTarget>,
    page: PageScroll,
    rng: StdRng,
    live: bool,
    now: Instant,
    hue_shift: Option<f32>,
}

impl MainScene {
    pub fn new(
        ctx: &mut AppContext,
        star_count: usize,
        seed: Option<u64>,
        viewport: Size,
        theme_hint: Option<String>,
        now: Instant,
    ) -> Self {
        let mut rng = rng_for(seed);
        let stars = StarField::new(star_count, viewport, &mut rng);
        let navbar = Navbar::new(ctx, theme_hint, viewport);
        let footer = Footer::new(&ctx.locale, &mut ctx.bus);
        let layout = GridLayout::compute(viewport, 0).clear_of(navbar.bottom());
        let mut page = PageScroll::default();
        page.set_max(layout.content_height() - layout.viewport.height);
        Self {
            viewport,
            layout,
            cartridges: SlotMap::with_key(),
            order: Vec::new(),
            on_click: None,
            navbar,
            footer,
            stars,
            toast: None,
            pointer: PointerTracker::new(),
            page,
            rng,
            live: true,
            now,
            hue_shift: None,
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn navbar(&self) -> &Navbar {
        &self.navbar
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    /// Cartridge ids in insertion order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    pub fn cartridge(&self, id: EntityId) -> Option<&Cartridge> {
        self.cartridges.get(id)
    }

    pub fn id_of(&self, slug: &str) -> Option<EntityId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.cartridges[id].slug() == slug)
    }

    pub fn page(&self) -> &PageScroll {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut PageScroll {
        &mut self.page
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(Toast::new(message, now));
    }

    pub fn set_hue_shift(&mut self, degrees: Option<f32>) {
        self.hue_shift = degrees;
    }

    pub fn hovered(&self) -> Option<HitTarget> {
        self.pointer.hovered()
    }

    /// Slugs of cartridges meant to be visible, in insertion order.
    pub fn visible_slugs(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&id| &self.cartridges[id])
            .filter(|c| c.is_visible())
            .map(Cartridge::slug)
            .collect()
    }

    fn grid(&self, count: usize) -> GridLayout {
        GridLayout::compute(self.viewport, count).clear_of(self.navbar.bottom())
    }

    /// Relayout for a new viewport. Entities keep their ids and state.
    pub fn resize(&mut self, viewport: Size) {
        log::debug!("scene resize {}x{}", viewport.width, viewport.height);
        self.viewport = viewport;
        self.navbar.resize(viewport);
        self.layout = self.grid(self.order.len());
        for (&id, slot) in self.order.iter().zip(self.layout.slots()) {
            self.cartridges[id].set_slot(slot.x, slot.y, slot.width);
        }
        self.stars.resize(viewport);
        self.sync_page_range();
        self.refresh_hover();
    }

    /// Replace every cartridge with one per record, in order.
    pub fn add_projects(
        &mut self,
        records: &[Rc<ProjectRecord>],
        on_click: Option<ClickHandler>,
        now: Instant,
    ) {
        self.clear_cartridges();
        self.layout = self.grid(records.len());
        for (record, slot) in records.iter().zip(self.layout.slots()) {
            let phase = self.rng.random_range(0.0..std::f32::consts::TAU);
            let delay = Duration::from_millis(self.rng.random_range(0..=MAX_ENTRANCE_DELAY_MS));
            let cart = Cartridge::new(
                Rc::clone(record),
                slot.x,
                slot.y,
                slot.width,
                phase,
                delay,
                now,
            );
            let id = self.cartridges.insert(cart);
            self.order.push(id);
        }
        self.on_click = on_click;
        self.sync_page_range();
        log::info!("scene holds {} cartridges", self.order.len());
    }

    fn clear_cartridges(&mut self) {
        let events = self.pointer.reset();
        self.apply_hover(events);
        for (_, cart) in self.cartridges.iter_mut() {
            cart.dispose();
        }
        self.cartridges.clear();
        self.order.clear();
    }

    /// Show exactly the cartridges whose slug is in `visible`.
    pub fn filter_cartridges<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>, now: Instant) {
        let visible: HashSet<&str> = visible.into_iter().collect();
        for cart in self.cartridges.values_mut() {
            let show = visible.contains(cart.slug());
            cart.set_visible(show, now);
        }
        self.refresh_hover();
    }

    fn sync_page_range(&mut self) {
        self.page
            .set_max(self.layout.content_height() - self.layout.viewport.height);
    }

    /// Navbar first, then cartridges top-most first.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<HitTarget> {
        if let Some(target) = self.navbar.hit_test(x, y) {
            return Some(HitTarget::Nav(target));
        }
        let scene_y = y + self.page.offset();
        self.order
            .iter()
            .rev()
            .copied()
            .find(|&id| self.cartridges[id].hit(x, scene_y))
            .map(HitTarget::Cartridge)
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let hit = self.hit_test(x, y);
        let events = self.pointer.moved(x, y, hit);
        self.apply_hover(events);
    }

    pub fn pointer_pressed(&mut self, button: MouseButton) {
        let (x, y) = self.pointer.cursor();
        let hit = self.hit_test(x, y);
        self.pointer.pressed(button, hit);
    }

    /// Runs cartridge clicks itself; navbar clicks are returned.
    pub fn pointer_released(&mut self, button: MouseButton) -> Option<NavTarget> {
        let (x, y) = self.pointer.cursor();
        let hit = self.hit_test(x, y);
        match self.pointer.released(button, hit)? {
            PointerEvent::Click(HitTarget::Nav(target), MouseButton::Left) => Some(target),
            PointerEvent::Click(HitTarget::Cartridge(id), MouseButton::Left) => {
                self.click_cartridge(id);
                None
            }
            _ => None,
        }
    }

    /// Fire the click callback for `id`, then play the bounce.
    pub fn click_cartridge(&mut self, id: EntityId) {
        let now = self.now;
        let Some(cart) = self.cartridges.get_mut(id) else {
            return;
        };
        if let Some(handler) = self.on_click.as_mut() {
            handler(cart.record());
        }
        cart.on_click(now);
    }

    /// Drop hover and press, e.g. while the modal covers the scene.
    pub fn reset_pointer(&mut self) {
        let events = self.pointer.reset();
        self.apply_hover(events);
    }

    /// Scroll the page; ignored while locked.
    pub fn scroll(&mut self, delta: f32) {
        if self.page.scroll_by(delta) {
            self.refresh_hover();
        }
    }

    fn refresh_hover(&mut self) {
        let (x, y) = self.pointer.cursor();
        let hit = self.hit_test(x, y);
        let events = self.pointer.refresh(hit);
        self.apply_hover(events);
    }

    fn apply_hover(&mut self, events: PointerEvents<HitTarget>) {
        let now = self.now;
        for event in events {
            match event {
                PointerEvent::HoverEnter(HitTarget::Cartridge(id)) => {
                    if let Some(c) = self.cartridges.get_mut(id) {
                        c.on_hover(now);
                    }
                }
                PointerEvent::HoverLeave(HitTarget::Cartridge(id)) => {
                    if let Some(c) = self.cartridges.get_mut(id) {
                        c.on_hover_out(now);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn draw(&self, list: &mut DrawList, theme: &Theme, l10n: &Localization) {
        if !self.live {
            return;
        }
        let (w, h) = (self.viewport.width, self.viewport.height);
        list.panel(PanelCommand::fill(Rect::new(0.0, 0.0, w, h), theme.background, 0.0));
        self.stars.draw(list, theme);

        let scroll = self.page.offset();
        for row in 0..self.layout.rows() {
            let y = self.layout.shelf_y(row) - scroll;
            list.panel(PanelCommand::fill(
                Rect::new(0.0, y + theme.shelf_height, w, 4.0),
                theme.shelf_shadow,
                0.0,
            ));
            list.panel(PanelCommand::fill(
                Rect::new(0.0, y, w, theme.shelf_height),
                theme.shelf,
                0.0,
            ));
            list.panel(PanelCommand::fill(
                Rect::new(0.0, y, w, 2.0),
                theme.shelf_highlight,
                0.0,
            ));
        }

        for &id in &self.order {
            self.cartridges[id].draw(list, theme, l10n, self.hue_shift, scroll);
        }

        self.navbar.draw(list, theme, l10n.locale());
        self.footer.draw(list, theme, self.viewport);
        if let Some(toast) = &self.toast {
            toast.draw(list, theme, self.viewport);
        }
    }

    /// Dispose every entity and release bus subscriptions. The scene draws
    /// nothing afterwards.
    pub fn teardown(&mut self, bus: &mut EventBus) {
        if !self.live {
            return;
        }
        self.clear_cartridges();
        self.on_click = None;
        self.navbar.dispose(bus);
        self.footer.dispose(bus);
        self.toast = None;
        self.live = false;
        log::debug!("scene torn down");
    }
}

impl Updatable for MainScene {
    fn update(&mut self, frame: &Frame) {
        if !self.live {
            return;
        }
        self.now = frame.now;
        self.stars.update(frame);
        for &id in &self.order {
            self.cartridges[id].update(frame);
        }
        self.navbar.update(frame);
        if let Some(toast) = self.toast.as_mut() {
            toast.update(frame);
            if toast.is_finished(frame.now) {
                self.toast = None;
            }
        }
    }
}
