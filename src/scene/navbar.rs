use std::cell::Cell;
use std::rc::Rc;

use super::layout::MOBILE_BREAKPOINT;
use super::text::LocalizedText;
use super::{Frame, Updatable};
use crate::context::AppContext;
use crate::events::{Event, EventBus, SubscriptionId, Topic};
use crate::project::Filter;
use crate::ui::draw::{DrawList, PanelCommand, TextCommand, estimate_text_width};
use crate::ui::theme::{Theme, with_alpha};
use crate::ui::{Rect, Size};

/// What a navbar button does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavTarget {
    /// Index into the locale table's locale list.
    Locale(usize),
    Filter(Filter),
    ToggleTheme,
}

struct NavButton {
    target: NavTarget,
    label: LocalizedText,
    /// Appended to the label, e.g. a key hint.
    suffix: Option<String>,
    rect: Rect,
}

impl NavButton {
    fn caption(&self) -> String {
        match &self.suffix {
            Some(s) => format!("{} ({s})", self.label.text()),
            None => self.label.text().to_string(),
        }
    }
}

const BUTTON_GAP: f32 = 5.0;
const PAD_H: f32 = 10.0;
const PAD_V: f32 = 6.0;

/// Page margin: one eightieth of the width, at least 20px.
pub fn margin(width: f32) -> f32 {
    (width / 80.0).floor().max(20.0)
}

/// Language buttons on the left, filter buttons in the middle (second row
/// on narrow screens), theme toggle on the right.
pub struct Navbar {
    locales: Vec<String>,
    buttons: Vec<NavButton>,
    active_filter: Rc<Cell<Filter>>,
    filter_sub: Option<SubscriptionId>,
    viewport: Size,
    font_size: f32,
}

impl Navbar {
    pub fn new(ctx: &mut AppContext, theme_hint: Option<String>, viewport: Size) -> Self {
        let locales: Vec<String> = ctx.locale.table().locales().to_vec();
        let mut buttons = Vec::new();
        for (i, code) in locales.iter().enumerate() {
            buttons.push(NavButton {
                target: NavTarget::Locale(i),
                label: LocalizedText::new(&format!("lang_{code}"), &ctx.locale, &mut ctx.bus),
                suffix: None,
                rect: Rect::default(),
            });
        }
        for filter in Filter::ALL {
            buttons.push(NavButton {
                target: NavTarget::Filter(filter),
                label: LocalizedText::new(filter.label_key(), &ctx.locale, &mut ctx.bus),
                suffix: None,
                rect: Rect::default(),
            });
        }
        buttons.push(NavButton {
            target: NavTarget::ToggleTheme,
            label: LocalizedText::new("theme_toggle", &ctx.locale, &mut ctx.bus),
            suffix: theme_hint,
            rect: Rect::default(),
        });

        let active_filter = Rc::new(Cell::new(Filter::All));
        let cell = Rc::clone(&active_filter);
        let filter_sub = ctx.bus.subscribe(Topic::FilterChanged, move |event| {
            if let Event::FilterChanged { filter } = event {
                cell.set(*filter);
            }
        });

        let mut navbar = Self {
            locales,
            buttons,
            active_filter,
            filter_sub: Some(filter_sub),
            viewport,
            font_size: 18.0,
        };
        navbar.layout();
        navbar
    }

    pub fn locale_code(&self, index: usize) -> Option<&str> {
        self.locales.get(index).map(String::as_str)
    }

    pub fn active_filter(&self) -> Filter {
        self.active_filter.get()
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.layout();
    }

    /// Bottom edge of the lowest button row.
    pub fn bottom(&self) -> f32 {
        self.buttons
            .iter()
            .map(|b| b.rect.y + b.rect.height)
            .fold(0.0, f32::max)
    }

    fn layout(&mut self) {
        let m = margin(self.viewport.width);
        let h = self.font_size + 2.0 * PAD_V;
        let font = self.font_size;
        let width_of = |b: &NavButton| estimate_text_width(&b.caption(), font) + 2.0 * PAD_H;

        let mut x = m;
        for b in self.buttons.iter_mut() {
            if let NavTarget::Locale(_) = b.target {
                let w = width_of(&*b);
                b.rect = Rect::new(x, m, w, h);
                x += w + BUTTON_GAP;
            }
        }
        let left_end = x;

        let mut right_start = self.viewport.width - m;
        for b in self.buttons.iter_mut().rev() {
            if b.target == NavTarget::ToggleTheme {
                let w = width_of(&*b);
                right_start -= w;
                b.rect = Rect::new(right_start, m, w, h);
            }
        }

        let filter_widths: Vec<f32> = self
            .buttons
            .iter()
            .filter(|b| matches!(b.target, NavTarget::Filter(_)))
            .map(width_of)
            .collect();
        let total: f32 =
            filter_widths.iter().sum::<f32>() + BUTTON_GAP * filter_widths.len().saturating_sub(1) as f32;
        let centered = (self.viewport.width - total) / 2.0;
        let fits_row = centered >= left_end + BUTTON_GAP && centered + total <= right_start - BUTTON_GAP;
        let (mut fx, fy) = if self.viewport.width >= MOBILE_BREAKPOINT && fits_row {
            (centered, m)
        } else {
            (centered.max(m), m + h + BUTTON_GAP)
        };
        for (b, w) in self
            .buttons
            .iter_mut()
            .filter(|b| matches!(b.target, NavTarget::Filter(_)))
            .zip(filter_widths)
        {
            b.rect = Rect::new(fx, fy, w, h);
            fx += w + BUTTON_GAP;
        }
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<NavTarget> {
        self.buttons
            .iter()
            .find(|b| b.rect.contains(x, y))
            .map(|b| b.target)
    }

    pub fn draw(&self, list: &mut DrawList, theme: &Theme, active_locale: &str) {
        for b in &self.buttons {
            let (active, alpha) = match b.target {
                NavTarget::Locale(i) => {
                    let active = self.locale_code(i) == Some(active_locale);
                    (active, if active { 1.0 } else { theme.inactive_alpha })
                }
                NavTarget::Filter(f) => (f == self.active_filter.get(), 1.0),
                NavTarget::ToggleTheme => (false, 1.0),
            };
            let bg = if active && !matches!(b.target, NavTarget::Locale(_)) {
                theme.nav_button_active_bg
            } else {
                theme.nav_button_bg
            };
            list.panel(PanelCommand {
                rect: b.rect,
                bg_color: with_alpha(bg, alpha),
                border_color: with_alpha(theme.nav_button_border, alpha),
                border_width: 1.0,
                radius: 6.0,
            });
            list.text(
                TextCommand::new(
                    b.caption(),
                    b.rect.x + b.rect.width * 0.5,
                    b.rect.y + PAD_V,
                    with_alpha(theme.text, alpha),
                    self.font_size,
                )
                .centered(),
            );
        }
    }

    pub fn dispose(&mut self, bus: &mut EventBus) {
        for b in self.buttons.iter_mut() {
            b.label.dispose(bus);
        }
        if let Some(id) = self.filter_sub.take() {
            bus.unsubscribe(Topic::FilterChanged, id);
        }
    }
}

impl Updatable for Navbar {
    /// Labels may have changed length after a locale switch.
    fn update(&mut self, _frame: &Frame) {
        self.layout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::{LocaleTable, Localization};
    use crate::storage::Preferences;
    use crate::ui::theme::ThemeMode;

    fn ctx() -> AppContext {
        let table = LocaleTable::from_kdl_str(
            r#"
string "lang_it" { it "ITALIANO"; en "ITALIAN" }
string "lang_en" { it "INGLESE"; en "ENGLISH" }
string "filter_all" { it "Tutti"; en "All" }
string "filter_games" { it "Giochi"; en "Games" }
string "filter_coding" { it "Codice"; en "Coding" }
string "theme_toggle" { it "Tema"; en "Theme" }
"#,
        )
        .expect("valid table");
        let prefs = Preferences::in_memory();
        let l10n = Localization::restore(Rc::new(table), &prefs, "it");
        AppContext::new(l10n, prefs, ThemeMode::Dark)
    }

    #[test]
    fn margin_has_a_floor() {
        assert_eq!(margin(800.0), 20.0);
        assert_eq!(margin(2400.0), 30.0);
    }

    #[test]
    fn buttons_are_hit_testable() {
        let mut ctx = ctx();
        let nav = Navbar::new(&mut ctx, Some("T".into()), Size::new(1280.0, 800.0));
        let m = margin(1280.0);
        assert_eq!(nav.hit_test(m + 1.0, m + 1.0), Some(NavTarget::Locale(0)));
        assert_eq!(nav.locale_code(0), Some("it"));
        assert_eq!(
            nav.hit_test(1280.0 - m - 1.0, m + 1.0),
            Some(NavTarget::ToggleTheme)
        );
        assert_eq!(nav.hit_test(640.0, 400.0), None);
        let found_filter = (0..1280)
            .any(|x| matches!(nav.hit_test(x as f32, m + 5.0), Some(NavTarget::Filter(_))));
        assert!(found_filter);
    }

    #[test]
    fn narrow_screens_wrap_filters_to_second_row() {
        let mut ctx = ctx();
        let nav = Navbar::new(&mut ctx, None, Size::new(500.0, 800.0));
        let m = margin(500.0);
        assert!(nav.bottom() > m + 18.0 + 2.0 * PAD_V);
    }

    #[test]
    fn tracks_filter_changes_and_disposes() {
        let mut ctx = ctx();
        let subs_before = ctx.bus.subscriber_count(Topic::LocaleChanged);
        let mut nav = Navbar::new(&mut ctx, None, Size::new(1280.0, 800.0));
        assert_eq!(
            ctx.bus.subscriber_count(Topic::LocaleChanged),
            subs_before + 6
        );
        ctx.bus.publish(&Event::FilterChanged {
            filter: Filter::Coding,
        });
        assert_eq!(nav.active_filter(), Filter::Coding);

        nav.dispose(&mut ctx.bus);
        assert_eq!(ctx.bus.subscriber_count(Topic::LocaleChanged), subs_before);
        assert_eq!(ctx.bus.subscriber_count(Topic::FilterChanged), 0);
    }

    #[test]
    fn draw_dims_inactive_locale() {
        let mut ctx = ctx();
        let nav = Navbar::new(&mut ctx, None, Size::new(1280.0, 800.0));
        let mut list = DrawList::new();
        let theme = Theme::default();
        nav.draw(&mut list, &theme, "it");
        let it = list.texts.iter().find(|t| t.text == "ITALIANO").expect("it button");
        let en = list.texts.iter().find(|t| t.text == "INGLESE").expect("en button");
        assert!((it.color[3] - 1.0).abs() < 1e-6);
        assert!((en.color[3] - 0.7).abs() < 1e-6);
    }
}
