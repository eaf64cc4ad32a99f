use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::events::{Event, EventBus, SubscriptionId, Topic};
use crate::localization::Localization;

/// A label bound to a locale key. It re-reads its string on every
/// `LocaleChanged` until [`dispose`](Self::dispose) unsubscribes it.
pub struct LocalizedText {
    key: String,
    text: Rc<RefCell<String>>,
    subscription: Option<SubscriptionId>,
}

impl LocalizedText {
    pub fn new(key: &str, l10n: &Localization, bus: &mut EventBus) -> Self {
        let text = Rc::new(RefCell::new(l10n.text_or_key(key).to_string()));

        let table = Rc::clone(l10n.table());
        let handler_key = key.to_string();
        let handler_text = Rc::clone(&text);
        let subscription = bus.subscribe(Topic::LocaleChanged, move |event| {
            let Event::LocaleChanged { locale } = event else {
                return;
            };
            match table.lookup(&handler_key, locale) {
                Some(s) => *handler_text.borrow_mut() = s.to_string(),
                // Keep the previous text.
                None => log::warn!("no string for key {handler_key:?} in locale {locale:?}"),
            }
        });

        Self {
            key: key.to_string(),
            text,
            subscription: Some(subscription),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> Ref<'_, String> {
        self.text.borrow()
    }

    /// Still subscribed.
    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Unsubscribe. Safe to call more than once.
    pub fn dispose(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription.take() {
            bus.unsubscribe(Topic::LocaleChanged, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::LocaleTable;
    use crate::storage::Preferences;

    fn l10n() -> Localization {
        let table = LocaleTable::from_kdl_str(
            "string \"wip\" { it \"Lavori in corso\"; en \"Work in progress\" }\n\
             string \"only_it\" { it \"Solo italiano\" }",
        )
        .expect("valid table");
        Localization::new(Rc::new(table), "it").expect("known locale")
    }

    #[test]
    fn follows_locale_changes() {
        let mut l10n = l10n();
        let mut bus = EventBus::new();
        let mut prefs = Preferences::in_memory();
        let label = LocalizedText::new("wip", &l10n, &mut bus);
        assert_eq!(*label.text(), "Lavori in corso");

        l10n.switch_locale("en", &mut bus, &mut prefs).expect("switch");
        assert_eq!(*label.text(), "Work in progress");
    }

    #[test]
    fn missing_translation_keeps_previous_text() {
        let mut l10n = l10n();
        let mut bus = EventBus::new();
        let mut prefs = Preferences::in_memory();
        let label = LocalizedText::new("only_it", &l10n, &mut bus);
        l10n.switch_locale("en", &mut bus, &mut prefs).expect("switch");
        assert_eq!(*label.text(), "Solo italiano");
    }

    #[test]
    fn disposed_label_stops_updating() {
        let mut l10n = l10n();
        let mut bus = EventBus::new();
        let mut prefs = Preferences::in_memory();
        let mut label = LocalizedText::new("wip", &l10n, &mut bus);
        label.dispose(&mut bus);
        label.dispose(&mut bus);
        assert!(!label.is_live());
        assert_eq!(bus.subscriber_count(Topic::LocaleChanged), 0);

        l10n.switch_locale("en", &mut bus, &mut prefs).expect("switch");
        assert_eq!(*label.text(), "Lavori in corso");
    }
}
