use super::navbar::margin;
use super::text::LocalizedText;
use crate::events::EventBus;
use crate::localization::Localization;
use crate::ui::Size;
use crate::ui::draw::{DrawList, TextCommand};
use crate::ui::theme::Theme;

/// Localized credit line centered on the bottom edge.
pub struct Footer {
    label: LocalizedText,
}

impl Footer {
    pub fn new(l10n: &Localization, bus: &mut EventBus) -> Self {
        Self {
            label: LocalizedText::new("footer", l10n, bus),
        }
    }

    pub fn text(&self) -> String {
        self.label.text().to_string()
    }

    pub fn draw(&self, list: &mut DrawList, theme: &Theme, viewport: Size) {
        let size = theme.footer_font_size;
        let y = viewport.height - margin(viewport.width) * 0.5 - size * 1.2;
        list.text(
            TextCommand::new(self.text(), viewport.width * 0.5, y, theme.text_muted, size)
                .centered(),
        );
    }

    pub fn dispose(&mut self, bus: &mut EventBus) {
        self.label.dispose(bus);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::localization::LocaleTable;
    use crate::storage::Preferences;
    use crate::ui::theme::ThemeMode;

    #[test]
    fn draws_one_centered_line_near_the_bottom() {
        let table = LocaleTable::from_kdl_str(r#"string "footer" { it "Fatto a mano"; en "Handmade" }"#)
            .expect("valid table");
        let mut prefs = Preferences::in_memory();
        let mut l10n = Localization::restore(Rc::new(table), &prefs, "it");
        let mut bus = EventBus::new();
        let mut footer = Footer::new(&l10n, &mut bus);
        assert_eq!(footer.text(), "Fatto a mano");

        let mut list = DrawList::new();
        footer.draw(&mut list, &Theme::for_mode(ThemeMode::Dark), Size::new(800.0, 600.0));
        let (texts, overlay) = list.text_layers();
        assert!(overlay.is_empty());
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].x, 400.0);
        assert!(texts[0].y > 500.0 && texts[0].y < 600.0);

        l10n.switch_locale("en", &mut bus, &mut prefs).expect("known locale");
        assert_eq!(footer.text(), "Handmade");
        footer.dispose(&mut bus);
        assert_eq!(bus.subscriber_count(crate::events::Topic::LocaleChanged), 0);
    }
}
