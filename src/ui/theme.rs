use serde::Deserialize;

use crate::project::Category;

/// Light or dark palette. Persisted under its own preference key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

/// Colors of one cartridge, chosen by category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartridgePalette {
    /// Shell.
    pub primary: [f32; 4],
    /// Top notch.
    pub secondary: [f32; 4],
    /// Accent line under the label.
    pub accent: [f32; 4],
}

impl CartridgePalette {
    pub fn for_category(category: Option<Category>) -> Self {
        match category {
            Some(Category::Coding) => Self {
                primary: hex(0x7B, 0x68, 0xEE),
                secondary: hex(0x00, 0xD4, 0xFF),
                accent: hex(0xFF, 0x6E, 0xC7),
            },
            // Untyped records use the game colors.
            Some(Category::Game) | None => Self {
                primary: hex(0xFF, 0x6E, 0xC7),
                secondary: hex(0x7B, 0x68, 0xEE),
                accent: hex(0x00, 0xD4, 0xFF),
            },
        }
    }

    pub fn hue_rotated(&self, degrees: f32) -> Self {
        Self {
            primary: hue_rotate(self.primary, degrees),
            secondary: hue_rotate(self.secondary, degrees),
            accent: hue_rotate(self.accent, degrees),
        }
    }
}

/// Centralized visual style constants.
///
/// Entities read colors from the `Theme` passed to their draw call, so a
/// theme switch takes effect on the next frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub mode: ThemeMode,

    // -- Scene --
    pub background: [f32; 4],
    pub star: [f32; 4],
    /// Shelf plank face.
    pub shelf: [f32; 4],
    /// 2px highlight along the plank top.
    pub shelf_highlight: [f32; 4],
    /// Shadow strip under the plank.
    pub shelf_shadow: [f32; 4],
    pub shelf_height: f32,

    // -- Text --
    pub text: [f32; 4],
    pub text_muted: [f32; 4],
    /// Text drawn on cartridge labels (always light).
    pub label_text: [f32; 4],
    /// Cartridge label window.
    pub label_bg: [f32; 4],

    // -- Navbar --
    pub nav_font_size: f32,
    pub nav_button_bg: [f32; 4],
    pub nav_button_active_bg: [f32; 4],
    pub nav_button_border: [f32; 4],
    /// Alpha of inactive language buttons.
    pub inactive_alpha: f32,

    // -- Footer --
    pub footer_font_size: f32,

    // -- Modal --
    pub overlay: [f32; 4],
    pub modal_bg: [f32; 4],
    pub modal_border: [f32; 4],
    pub modal_radius: f32,
    pub modal_padding: f32,
    pub badge_bg: [f32; 4],
    pub link: [f32; 4],

    // -- Toast --
    pub toast_bg: [f32; 4],
    pub toast_text: [f32; 4],
}

/// Convert a hex color (#RRGGBB) to sRGB [f32; 4] with alpha 1.0.
pub const fn hex(r: u8, g: u8, b: u8) -> [f32; 4] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Convert a hex color with custom alpha.
pub const fn hex_a(r: u8, g: u8, b: u8, a: f32) -> [f32; 4] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a]
}

/// Multiply a color's alpha.
pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// Rotate hue in RGB space, like the CSS `hue-rotate()` filter.
pub fn hue_rotate(color: [f32; 4], degrees: f32) -> [f32; 4] {
    let (s, c) = degrees.to_radians().sin_cos();
    let [r, g, b, a] = color;
    let m = [
        [
            0.213 + c * 0.787 - s * 0.213,
            0.715 - c * 0.715 - s * 0.715,
            0.072 - c * 0.072 + s * 0.928,
        ],
        [
            0.213 - c * 0.213 + s * 0.143,
            0.715 + c * 0.285 + s * 0.140,
            0.072 - c * 0.072 - s * 0.283,
        ],
        [
            0.213 - c * 0.213 - s * 0.787,
            0.715 - c * 0.715 + s * 0.715,
            0.072 + c * 0.928 + s * 0.072,
        ],
    ];
    let apply = |row: [f32; 3]| (row[0] * r + row[1] * g + row[2] * b).clamp(0.0, 1.0);
    [apply(m[0]), apply(m[1]), apply(m[2]), a]
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            background: hex(0x0A, 0x0A, 0x1F),
            star: hex_a(0xFF, 0xFF, 0xFF, 0.8),
            shelf: hex(0x1A, 0x1A, 0x3E),
            shelf_highlight: hex(0x2A, 0x2A, 0x4E),
            shelf_shadow: hex_a(0x05, 0x05, 0x10, 0.5),
            shelf_height: 8.0,

            text: hex(0xFF, 0xFF, 0xFF),
            text_muted: hex(0xA0, 0xA0, 0xC8),
            label_text: hex(0xFF, 0xFF, 0xFF),
            label_bg: hex_a(0x0A, 0x0A, 0x1F, 0.8),

            nav_font_size: 18.0,
            nav_button_bg: hex_a(0x1A, 0x1A, 0x3E, 0.6),
            nav_button_active_bg: hex_a(0x7B, 0x68, 0xEE, 0.9),
            nav_button_border: hex(0x2A, 0x2A, 0x4E),
            inactive_alpha: 0.7,

            footer_font_size: 16.0,

            overlay: hex_a(0x05, 0x05, 0x10, 0.8),
            modal_bg: hex(0x14, 0x14, 0x30),
            modal_border: hex(0x7B, 0x68, 0xEE),
            modal_radius: 12.0,
            modal_padding: 24.0,
            badge_bg: hex_a(0x7B, 0x68, 0xEE, 0.35),
            link: hex(0x00, 0xD4, 0xFF),

            toast_bg: hex_a(0xFF, 0x6E, 0xC7, 0.95),
            toast_text: hex(0xFF, 0xFF, 0xFF),
        }
    }

    fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            background: hex(0xF3, 0xF0, 0xFA),
            star: hex_a(0x7B, 0x68, 0xEE, 0.5),
            shelf: hex(0xC9, 0xC2, 0xE6),
            shelf_highlight: hex(0xDE, 0xD8, 0xF2),
            shelf_shadow: hex_a(0x3A, 0x30, 0x60, 0.25),
            shelf_height: 8.0,

            text: hex(0x1A, 0x1A, 0x3E),
            text_muted: hex(0x5A, 0x55, 0x80),
            label_text: hex(0xFF, 0xFF, 0xFF),
            label_bg: hex_a(0x0A, 0x0A, 0x1F, 0.8),

            nav_font_size: 18.0,
            nav_button_bg: hex_a(0xFF, 0xFF, 0xFF, 0.7),
            nav_button_active_bg: hex_a(0xFF, 0x6E, 0xC7, 0.9),
            nav_button_border: hex(0xC9, 0xC2, 0xE6),
            inactive_alpha: 0.7,

            footer_font_size: 16.0,

            overlay: hex_a(0x1A, 0x1A, 0x3E, 0.5),
            modal_bg: hex(0xFF, 0xFF, 0xFF),
            modal_border: hex(0xFF, 0x6E, 0xC7),
            modal_radius: 12.0,
            modal_padding: 24.0,
            badge_bg: hex_a(0xFF, 0x6E, 0xC7, 0.25),
            link: hex(0x7B, 0x68, 0xEE),

            toast_bg: hex_a(0x7B, 0x68, 0xEE, 0.95),
            toast_text: hex(0xFF, 0xFF, 0xFF),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_mode(ThemeMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_conversion() {
        let white = hex(0xFF, 0xFF, 0xFF);
        assert!((white[0] - 1.0).abs() < 0.001);
        assert!((white[3] - 1.0).abs() < 0.001);

        let black = hex(0x00, 0x00, 0x00);
        assert!(black[0].abs() < 0.001);

        let half_alpha = hex_a(0x80, 0x80, 0x80, 0.5);
        assert!((half_alpha[3] - 0.5).abs() < 0.001);
    }

    #[test]
    fn dark_background_is_night_blue() {
        // #0A0A1F
        let t = Theme::for_mode(ThemeMode::Dark);
        assert!((t.background[0] - 0.039).abs() < 0.01);
        assert!((t.background[2] - 0.122).abs() < 0.01);
    }

    #[test]
    fn mode_names_round_trip_and_toggle() {
        for mode in [ThemeMode::Light, ThemeMode::Dark] {
            assert_eq!(ThemeMode::parse(mode.as_str()), Some(mode));
            assert_eq!(mode.toggled().toggled(), mode);
            assert_eq!(Theme::for_mode(mode).mode, mode);
        }
        assert_eq!(ThemeMode::parse("sepia"), None);
    }

    #[test]
    fn palettes_swap_by_category() {
        let game = CartridgePalette::for_category(Some(Category::Game));
        let coding = CartridgePalette::for_category(Some(Category::Coding));
        assert_eq!(game.primary, coding.accent);
        assert_eq!(game.secondary, coding.primary);
        assert_eq!(CartridgePalette::for_category(None), game);
    }

    #[test]
    fn hue_rotate_identity_and_full_turn() {
        let pink = hex(0xFF, 0x6E, 0xC7);
        for deg in [0.0, 360.0] {
            let out = hue_rotate(pink, deg);
            for i in 0..4 {
                assert!((out[i] - pink[i]).abs() < 0.01, "{deg}: {out:?}");
            }
        }
        let shifted = hue_rotate(pink, 120.0);
        assert!((shifted[0] - pink[0]).abs() > 0.1);
    }

    #[test]
    fn with_alpha_multiplies() {
        let c = with_alpha(hex_a(0, 0, 0, 0.5), 0.5);
        assert!((c[3] - 0.25).abs() < 1e-6);
    }
}
