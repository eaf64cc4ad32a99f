use super::Rect;

/// Intermediate draw command for a rounded panel quad.
/// Consumed by the binary's panel renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelCommand {
    pub rect: Rect,
    pub bg_color: [f32; 4],     // sRGB RGBA
    pub border_color: [f32; 4], // sRGB RGBA
    pub border_width: f32,
    pub radius: f32,
}

impl PanelCommand {
    /// Borderless filled rectangle.
    pub fn fill(rect: Rect, color: [f32; 4], radius: f32) -> Self {
        Self {
            rect,
            bg_color: color,
            border_color: [0.0; 4],
            border_width: 0.0,
            radius,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    /// `x` is the left edge.
    #[default]
    Left,
    /// `x` is the horizontal center.
    Center,
}

/// Intermediate draw command for a text run.
/// Consumed by the binary's text renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    pub text: String,
    pub x: f32,
    /// Top of the first line.
    pub y: f32,
    pub color: [f32; 4], // sRGB RGBA
    pub font_size: f32,
    pub align: TextAlign,
    /// Wrap width; `None` keeps a single line.
    pub max_width: Option<f32>,
}

impl TextCommand {
    pub fn new(text: impl Into<String>, x: f32, y: f32, color: [f32; 4], font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            color,
            font_size,
            align: TextAlign::Left,
            max_width: None,
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = TextAlign::Center;
        self
    }

    pub fn wrapped(mut self, max_width: f32) -> Self {
        self.max_width = Some(max_width);
        self
    }
}

/// Collects draw commands from the scene, back to front.
/// Decouples scene logic from GPU renderers.
#[derive(Debug, Default)]
pub struct DrawList {
    pub panels: Vec<PanelCommand>,
    pub texts: Vec<TextCommand>,
    /// Panels at or past this index belong to the overlay layer and are
    /// drawn after `texts[..overlay_text_start]`.
    pub overlay_panel_start: Option<usize>,
    pub overlay_text_start: Option<usize>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.panels.clear();
        self.texts.clear();
        self.overlay_panel_start = None;
        self.overlay_text_start = None;
    }

    pub fn panel(&mut self, cmd: PanelCommand) {
        self.panels.push(cmd);
    }

    pub fn text(&mut self, cmd: TextCommand) {
        self.texts.push(cmd);
    }

    /// Everything pushed after this call draws above earlier text.
    pub fn begin_overlay(&mut self) {
        self.overlay_panel_start = Some(self.panels.len());
        self.overlay_text_start = Some(self.texts.len());
    }

    /// `(base, overlay)` panel slices.
    pub fn panel_layers(&self) -> (&[PanelCommand], &[PanelCommand]) {
        self.panels
            .split_at(self.overlay_panel_start.unwrap_or(self.panels.len()))
    }

    /// `(base, overlay)` text slices.
    pub fn text_layers(&self) -> (&[TextCommand], &[TextCommand]) {
        self.texts
            .split_at(self.overlay_text_start.unwrap_or(self.texts.len()))
    }
}

/// Rough advance width of `text` at `font_size`, for layout before shaping.
pub fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.6
}
