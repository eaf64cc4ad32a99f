use crate::events::{Event, EventBus};
use crate::localization::{LocaleError, Localization};
use crate::storage::{Preferences, THEME_KEY};
use crate::ui::theme::ThemeMode;

/// Shared application services, built once at startup and passed by
/// reference to whatever needs them.
pub struct AppContext {
    pub bus: EventBus,
    pub locale: Localization,
    pub prefs: Preferences,
    pub theme_mode: ThemeMode,
}

impl AppContext {
    /// Theme comes from preferences, else `default_theme`.
    pub fn new(locale: Localization, prefs: Preferences, default_theme: ThemeMode) -> Self {
        let theme_mode = prefs
            .get(THEME_KEY)
            .and_then(ThemeMode::parse)
            .unwrap_or(default_theme);
        Self {
            bus: EventBus::new(),
            locale,
            prefs,
            theme_mode,
        }
    }

    pub fn switch_locale(&mut self, code: &str) -> Result<bool, LocaleError> {
        self.locale
            .switch_locale(code, &mut self.bus, &mut self.prefs)
    }

    /// Returns false when `mode` was already active.
    pub fn set_theme(&mut self, mode: ThemeMode) -> bool {
        if self.theme_mode == mode {
            return false;
        }
        self.theme_mode = mode;
        if let Err(e) = self.prefs.set(THEME_KEY, mode.as_str()) {
            log::warn!("could not persist theme {}: {e}", mode.as_str());
        }
        self.bus.publish(&Event::ThemeChanged { mode });
        true
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        let next = self.theme_mode.toggled();
        self.set_theme(next);
        next
    }
}
