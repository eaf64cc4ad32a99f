use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::events::{Event, EventBus};
use crate::storage::{LOCALE_KEY, Preferences};

#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("failed to read locale table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse locale table {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("locale table defines no locales")]
    Empty,
    #[error("no string for key {key:?} in locale {locale:?}")]
    MissingKey { key: String, locale: String },
    #[error("unknown locale {0:?}")]
    UnknownLocale(String),
}

/// Every translated string, keyed by `(key, locale)`. Read-only once loaded.
///
/// Source format is KDL, one node per key:
///
/// ```kdl
/// string "footer" {
///     it "Fatto con cura"
///     en "Made with care"
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocaleTable {
    strings: HashMap<String, HashMap<String, String>>,
    /// Locale codes in first-seen order.
    locales: Vec<String>,
}

impl LocaleTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LocaleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LocaleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&content, &path.display().to_string())?;
        log::info!(
            "loaded {} string(s) in {} locale(s) from {}",
            table.strings.len(),
            table.locales.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_kdl_str(content: &str) -> Result<Self, LocaleError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, LocaleError> {
        let doc = content
            .parse::<kdl::KdlDocument>()
            .map_err(|e| LocaleError::Parse {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;

        let mut table = LocaleTable::default();
        for node in doc.nodes() {
            if node.name().value() != "string" {
                log::warn!("{origin}: ignoring unexpected node {:?}", node.name().value());
                continue;
            }
            let Some(key) = node.get(0).and_then(|v| v.as_string()) else {
                log::warn!("{origin}: string node without a key");
                continue;
            };
            let Some(children) = node.children() else {
                continue;
            };
            for child in children.nodes() {
                let locale = child.name().value();
                let Some(text) = child.get(0).and_then(|v| v.as_string()) else {
                    log::warn!("{origin}: {key}/{locale} has no text");
                    continue;
                };
                table.insert(key, locale, text);
            }
        }

        if table.locales.is_empty() {
            return Err(LocaleError::Empty);
        }
        for (key, by_locale) in &table.strings {
            for locale in &table.locales {
                if !by_locale.contains_key(locale) {
                    log::warn!("{origin}: key {key:?} has no {locale:?} translation");
                }
            }
        }
        Ok(table)
    }

    fn insert(&mut self, key: &str, locale: &str, text: &str) {
        if !self.locales.iter().any(|l| l == locale) {
            self.locales.push(locale.to_string());
        }
        self.strings
            .entry(key.to_string())
            .or_default()
            .insert(locale.to_string(), text.to_string());
    }

    pub fn lookup(&self, key: &str, locale: &str) -> Option<&str> {
        self.strings.get(key)?.get(locale).map(String::as_str)
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn has_locale(&self, code: &str) -> bool {
        self.locales.iter().any(|l| l == code)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// The locale table plus the active locale.
#[derive(Debug, Clone)]
pub struct Localization {
    table: Rc<LocaleTable>,
    locale: String,
}

impl Localization {
    pub fn new(table: Rc<LocaleTable>, locale: &str) -> Result<Self, LocaleError> {
        if !table.has_locale(locale) {
            return Err(LocaleError::UnknownLocale(locale.to_string()));
        }
        Ok(Self {
            table,
            locale: locale.to_string(),
        })
    }

    /// Start from the persisted locale if it is still known, else `default`.
    /// An unknown `default` falls back to the table's first locale.
    pub fn restore(table: Rc<LocaleTable>, prefs: &Preferences, default: &str) -> Self {
        let stored = prefs.get(LOCALE_KEY).filter(|code| table.has_locale(code));
        let locale = match stored {
            Some(code) => code.to_string(),
            None if table.has_locale(default) => default.to_string(),
            None => {
                let first = table.locales().first().cloned().unwrap_or_default();
                log::warn!("default locale {default:?} not in table, using {first:?}");
                first
            }
        };
        log::info!("active locale: {locale}");
        Self { table, locale }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn table(&self) -> &Rc<LocaleTable> {
        &self.table
    }

    /// String for `key` in the active locale.
    pub fn get_string(&self, key: &str) -> Result<&str, LocaleError> {
        self.table
            .lookup(key, &self.locale)
            .ok_or_else(|| LocaleError::MissingKey {
                key: key.to_string(),
                locale: self.locale.clone(),
            })
    }

    /// Like [`get_string`](Self::get_string), but logs a miss and returns
    /// the key itself so the UI still shows something.
    pub fn text_or_key<'a>(&'a self, key: &'a str) -> &'a str {
        match self.get_string(key) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("{e}");
                key
            }
        }
    }

    /// The locale after the active one, wrapping around.
    pub fn next_locale(&self) -> &str {
        let locales = self.table.locales();
        match locales.iter().position(|l| *l == self.locale) {
            Some(pos) => &locales[(pos + 1) % locales.len()],
            None => &self.locale,
        }
    }

    /// Make `code` the active locale. Returns `Ok(false)` and publishes
    /// nothing when it already is. Otherwise persists the choice and
    /// publishes one `LocaleChanged`. A failed save is logged, not returned.
    pub fn switch_locale(
        &mut self,
        code: &str,
        bus: &mut EventBus,
        prefs: &mut Preferences,
    ) -> Result<bool, LocaleError> {
        if self.locale == code {
            return Ok(false);
        }
        if !self.table.has_locale(code) {
            return Err(LocaleError::UnknownLocale(code.to_string()));
        }
        self.locale = code.to_string();
        if let Err(e) = prefs.set(LOCALE_KEY, code) {
            log::warn!("could not persist locale {code}: {e}");
        }
        bus.publish(&Event::LocaleChanged {
            locale: code.to_string(),
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;

    const TABLE: &str = r#"
string "wip" {
    it "Lavori in corso"
    en "Work in progress"
}
string "footer" {
    it "Fatto a mano"
    en "Handmade"
}
"#;

    fn table() -> Rc<LocaleTable> {
        Rc::new(LocaleTable::from_kdl_str(TABLE).expect("valid table"))
    }

    #[test]
    fn parses_keys_and_locales_in_order() {
        let t = table();
        assert_eq!(t.len(), 2);
        assert_eq!(t.locales(), ["it".to_string(), "en".to_string()]);
        assert_eq!(t.lookup("wip", "en"), Some("Work in progress"));
        assert_eq!(t.lookup("wip", "de"), None);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            LocaleTable::from_kdl_str(""),
            Err(LocaleError::Empty)
        ));
    }

    #[test]
    fn malformed_kdl_is_a_parse_error() {
        assert!(matches!(
            LocaleTable::from_kdl_str("string \"x\" {"),
            Err(LocaleError::Parse { .. })
        ));
    }

    #[test]
    fn get_string_reports_missing_key() {
        let l10n = Localization::new(table(), "it").expect("known locale");
        assert_eq!(l10n.get_string("wip").ok(), Some("Lavori in corso"));
        match l10n.get_string("nope") {
            Err(LocaleError::MissingKey { key, locale }) => {
                assert_eq!(key, "nope");
                assert_eq!(locale, "it");
            }
            other => panic!("expected MissingKey, got {other:?}"),
        }
        assert_eq!(l10n.text_or_key("nope"), "nope");
    }

    #[test]
    fn switch_to_same_locale_is_silent() {
        let mut l10n = Localization::new(table(), "it").expect("known locale");
        let mut bus = EventBus::new();
        let mut prefs = Preferences::in_memory();
        assert!(!l10n.switch_locale("it", &mut bus, &mut prefs).expect("switch"));
        assert!(bus.history().is_empty());
        assert_eq!(prefs.get(LOCALE_KEY), None);
    }

    #[test]
    fn switch_publishes_once_and_persists() {
        let mut l10n = Localization::new(table(), "it").expect("known locale");
        let mut bus = EventBus::new();
        let mut prefs = Preferences::in_memory();
        assert!(l10n.switch_locale("en", &mut bus, &mut prefs).expect("switch"));
        assert_eq!(l10n.locale(), "en");
        assert_eq!(bus.history().count_topic(Topic::LocaleChanged), 1);
        assert_eq!(prefs.get(LOCALE_KEY), Some("en"));
        assert_eq!(l10n.get_string("footer").ok(), Some("Handmade"));
    }

    #[test]
    fn switch_to_unknown_locale_fails_without_side_effects() {
        let mut l10n = Localization::new(table(), "it").expect("known locale");
        let mut bus = EventBus::new();
        let mut prefs = Preferences::in_memory();
        assert!(matches!(
            l10n.switch_locale("fr", &mut bus, &mut prefs),
            Err(LocaleError::UnknownLocale(_))
        ));
        assert_eq!(l10n.locale(), "it");
        assert!(bus.history().is_empty());
    }

    #[test]
    fn restore_prefers_stored_then_default() {
        let mut prefs = Preferences::in_memory();
        assert_eq!(Localization::restore(table(), &prefs, "it").locale(), "it");
        prefs.set(LOCALE_KEY, "en").expect("save");
        assert_eq!(Localization::restore(table(), &prefs, "it").locale(), "en");
        prefs.set(LOCALE_KEY, "xx").expect("save");
        assert_eq!(Localization::restore(table(), &prefs, "it").locale(), "it");
        assert_eq!(Localization::restore(table(), &prefs, "zz").locale(), "it");
    }

    #[test]
    fn next_locale_wraps() {
        let l10n = Localization::new(table(), "en").expect("known locale");
        assert_eq!(l10n.next_locale(), "it");
    }
}
