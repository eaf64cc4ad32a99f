use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ui::theme::ThemeMode;

/// Startup settings, read from `data/settings.ron`. Every field has a
/// default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Directory of `*.md` project sources.
    pub projects_dir: PathBuf,
    /// KDL locale table.
    pub locale_table: PathBuf,
    /// Preferences file; `None` uses the per-user state directory.
    pub preferences_path: Option<PathBuf>,
    pub default_locale: String,
    pub default_theme: ThemeMode,
    pub star_count: usize,
    /// Fixed seed for float phases, entrance delays and stars.
    pub seed: Option<u64>,
    /// TTF/OTF used by the text renderer; `None` probes system fonts.
    pub font_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_title: "cartshelf".to_string(),
            window_width: 1280,
            window_height: 800,
            projects_dir: PathBuf::from("data/projects"),
            locale_table: PathBuf::from("data/locale.kdl"),
            preferences_path: None,
            default_locale: "it".to_string(),
            default_theme: ThemeMode::Dark,
            star_count: 120,
            seed: None,
            font_path: None,
        }
    }
}

impl Settings {
    pub fn from_ron_str(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }
}

/// Load settings from a RON file. Logs a warning and returns defaults on
/// failure.
pub fn load_settings(path: impl AsRef<Path>) -> Settings {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("failed to read {}: {}, using default settings", path.display(), e);
            return Settings::default();
        }
    };
    match Settings::from_ron_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("failed to parse RON {}: {}, using default settings", path.display(), e);
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let s = Settings::from_ron_str("(star_count: 10, default_locale: \"en\", seed: Some(7))")
            .expect("valid RON");
        assert_eq!(s.star_count, 10);
        assert_eq!(s.default_locale, "en");
        assert_eq!(s.seed, Some(7));
        assert_eq!(s.projects_dir, PathBuf::from("data/projects"));
        assert_eq!(s.default_theme, ThemeMode::Dark);
    }

    #[test]
    fn theme_mode_parses_from_ron() {
        let s = Settings::from_ron_str("(default_theme: Light)").expect("valid RON");
        assert_eq!(s.default_theme, ThemeMode::Light);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        assert_eq!(load_settings("no/such/settings.ron"), Settings::default());
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.ron");
        std::fs::write(&path, "(star_count: \"many\")").expect("write");
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn shipped_settings_parse() {
        let content = include_str!("../data/settings.ron");
        let s = Settings::from_ron_str(content).expect("data/settings.ron is valid");
        assert!(s.window_width > 0);
    }
}
