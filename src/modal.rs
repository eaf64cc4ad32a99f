//! Project detail overlay.
//!
//! `Closed` until [`Modal::open`]; `Open` while shown. A close request
//! keeps it `Open` with `closing` set until the exit animation finishes,
//! which [`Modal::update`] observes before becoming `Closed` and handing
//! page scrolling back.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::localization::Localization;
use crate::project::{Link, ProjectRecord};
use crate::ui::draw::{DrawList, PanelCommand, TextCommand, estimate_text_width};
use crate::ui::theme::{Theme, with_alpha};
use crate::ui::{Animator, Easing, Rect, Size};

// ---------------------------------------------------------------------------
// Page scroll
// ---------------------------------------------------------------------------

/// Vertical scroll of the page behind the modal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageScroll {
    offset: f32,
    max: f32,
    locked: bool,
    saved: Option<f32>,
}

impl PageScroll {
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Scroll by `delta` pixels unless locked. Returns true if it moved.
    pub fn scroll_by(&mut self, delta: f32) -> bool {
        if self.locked {
            return false;
        }
        let before = self.offset;
        self.offset = (self.offset + delta).clamp(0.0, self.max);
        self.offset != before
    }

    /// Set the scrollable range, e.g. after a resize.
    pub fn set_max(&mut self, max: f32) {
        self.max = max.max(0.0);
        if !self.locked {
            self.offset = self.offset.min(self.max);
        }
    }

    /// Freeze scrolling and remember the current offset.
    pub fn lock(&mut self) {
        if !self.locked {
            self.saved = Some(self.offset);
            self.locked = true;
        }
    }

    /// Unfreeze and restore the offset saved by [`lock`](Self::lock).
    pub fn unlock(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.offset = saved.min(self.max);
        }
        self.locked = false;
    }
}

// ---------------------------------------------------------------------------
// Detail content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
}

/// Split a body into headings and paragraphs on blank lines. Inline
/// emphasis markers are dropped and list items become bullets.
pub fn split_blocks(body: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lines: Vec<String> = Vec::new();

    let flush = |lines: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if !lines.is_empty() {
            blocks.push(Block::Paragraph(lines.join(" ")));
            lines.clear();
        }
    };

    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() {
            flush(&mut lines, &mut blocks);
            continue;
        }
        let hashes = line.chars().take_while(|&c| c == '#').count();
        if (1..=3).contains(&hashes) && line[hashes..].starts_with(' ') {
            flush(&mut lines, &mut blocks);
            blocks.push(Block::Heading {
                level: hashes as u8,
                text: strip_emphasis(line[hashes..].trim()),
            });
            continue;
        }
        let line = match line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            Some(item) => format!("\u{2022} {}", strip_emphasis(item)),
            None => strip_emphasis(line),
        };
        lines.push(line);
    }
    flush(&mut lines, &mut blocks);
    blocks
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace('*', "")
}

/// Everything the modal shows for one record, already localized.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub title: String,
    /// "Game Project • Racing • Web"
    pub meta_line: String,
    pub date_line: Option<String>,
    pub tags: Vec<String>,
    pub blocks: Vec<Block>,
    pub links: Vec<Link>,
    pub close_label: String,
}

impl DetailView {
    pub fn build(record: &ProjectRecord, l10n: &Localization) -> Self {
        let meta = &record.meta;
        let parts: Vec<&str> = meta
            .category
            .map(|c| l10n.text_or_key(c.meta_key()))
            .into_iter()
            .chain(meta.genre.as_deref())
            .chain(meta.platform.as_deref())
            .collect();
        Self {
            title: record.display_title().to_string(),
            meta_line: parts.join(" \u{2022} "),
            date_line: meta.date.map(|d| d.format_long(l10n.locale())),
            tags: meta.tags.to_vec(),
            blocks: split_blocks(&record.body),
            links: meta.links.iter().filter(|l| !l.url.is_empty()).cloned().collect(),
            close_label: l10n.text_or_key("modal_close").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Modal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Open { closing: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Channel {
    Scale,
    Opacity,
}

/// Result of a click while the modal is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalClick {
    /// Landed on the content panel, nothing to do.
    Consumed,
    /// Close button or overlay; the exit animation started.
    Closing,
    /// A link button.
    Link(String),
}

const ENTER_TIME: Duration = Duration::from_millis(300);
const EXIT_TIME: Duration = Duration::from_millis(200);
const START_SCALE: f32 = 0.8;
const MAX_WIDTH: f32 = 720.0;
const TITLE_SIZE: f32 = 30.0;
const BODY_SIZE: f32 = 16.0;
const META_SIZE: f32 = 14.0;
const LINE_HEIGHT: f32 = 1.35;

/// Theme color resolved at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tint {
    Text,
    Muted,
    Link,
    Badge,
}

enum Item {
    Panel(PanelCommand, Tint),
    Text(TextCommand, Tint),
}

/// Content laid out in screen space at scale 1.
struct ModalLayout {
    content: Rect,
    close: Rect,
    links: Vec<(Rect, String)>,
    items: Vec<Item>,
}

pub struct Modal {
    record: Option<Rc<ProjectRecord>>,
    view: Option<DetailView>,
    phase: ModalPhase,
    anim: Animator<Channel>,
    close_done_at: Option<Instant>,
    viewport: Size,
    now: Instant,
}

impl Modal {
    pub fn new(viewport: Size, now: Instant) -> Self {
        Self {
            record: None,
            view: None,
            phase: ModalPhase::Closed,
            anim: Animator::new(),
            close_done_at: None,
            viewport,
            now,
        }
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    /// Open, including while the exit animation plays.
    pub fn is_open(&self) -> bool {
        matches!(self.phase, ModalPhase::Open { .. })
    }

    pub fn is_closing(&self) -> bool {
        self.phase == ModalPhase::Open { closing: true }
    }

    pub fn record(&self) -> Option<&Rc<ProjectRecord>> {
        self.record.as_ref()
    }

    pub fn view(&self) -> Option<&DetailView> {
        self.view.as_ref()
    }

    /// Show `record`. Opening while already open replaces the content.
    pub fn open(
        &mut self,
        record: Rc<ProjectRecord>,
        l10n: &Localization,
        page: &mut PageScroll,
        now: Instant,
    ) {
        log::debug!("opening detail for {}", record.slug);
        self.view = Some(DetailView::build(&record, l10n));
        self.record = Some(record);
        page.lock();
        self.phase = ModalPhase::Open { closing: false };
        self.close_done_at = None;
        self.anim.start(
            Channel::Scale,
            START_SCALE,
            1.0,
            ENTER_TIME,
            Easing::BackOut { overshoot: 1.7 },
            now,
        );
        self.anim
            .start(Channel::Opacity, 0.0, 1.0, ENTER_TIME, Easing::EaseOut, now);
    }

    /// Start the exit animation. Returns false unless open and not already
    /// closing.
    pub fn close(&mut self, now: Instant) -> bool {
        if self.phase != (ModalPhase::Open { closing: false }) {
            return false;
        }
        self.phase = ModalPhase::Open { closing: true };
        let scale = self.anim.value(Channel::Scale, now, 1.0);
        let opacity = self.anim.value(Channel::Opacity, now, 1.0);
        self.anim
            .start(Channel::Scale, scale, START_SCALE, EXIT_TIME, Easing::EaseIn, now);
        self.anim
            .start(Channel::Opacity, opacity, 0.0, EXIT_TIME, Easing::EaseIn, now);
        self.close_done_at = Some(now + EXIT_TIME);
        true
    }

    /// Advance time. Finishes a pending close, restoring page scroll.
    /// Returns true on the frame the modal became `Closed`.
    pub fn update(&mut self, now: Instant, page: &mut PageScroll) -> bool {
        self.now = now;
        match self.close_done_at {
            Some(done) if now >= done => {
                self.phase = ModalPhase::Closed;
                self.close_done_at = None;
                self.record = None;
                self.view = None;
                self.anim.clear();
                page.unlock();
                log::debug!("detail closed");
                true
            }
            _ => false,
        }
    }

    /// Rebuild the localized text after a locale switch.
    pub fn relocalize(&mut self, l10n: &Localization) {
        if let Some(record) = &self.record {
            self.view = Some(DetailView::build(record, l10n));
        }
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Route a click while open. `None` when closed or already closing.
    pub fn click(&mut self, x: f32, y: f32, now: Instant) -> Option<ModalClick> {
        if self.phase != (ModalPhase::Open { closing: false }) {
            return None;
        }
        let layout = self.layout()?;
        if layout.close.contains(x, y) || !layout.content.contains(x, y) {
            self.close(now);
            return Some(ModalClick::Closing);
        }
        let link = layout
            .links
            .into_iter()
            .find(|(rect, _)| rect.contains(x, y))
            .map(|(_, url)| url);
        Some(match link {
            Some(url) => ModalClick::Link(url),
            None => ModalClick::Consumed,
        })
    }

    fn layout(&self) -> Option<ModalLayout> {
        let view = self.view.as_ref()?;
        let vw = self.viewport.width.max(1.0);
        let vh = self.viewport.height.max(1.0);
        let width = (vw * 0.9).min(MAX_WIDTH);
        let max_height = vh * 0.85;
        let pad = 24.0;
        let inner = (width - pad * 2.0).max(1.0);

        let mut items = Vec::new();
        let mut y = pad;
        let push_text = |items: &mut Vec<Item>, y: &mut f32, text: &str, size: f32, tint: Tint| {
            let lines = (estimate_text_width(text, size) / inner).ceil().max(1.0);
            items.push(Item::Text(
                TextCommand::new(text, pad, *y, [1.0; 4], size).wrapped(inner),
                tint,
            ));
            *y += lines * size * LINE_HEIGHT;
        };

        push_text(&mut items, &mut y, &view.title, TITLE_SIZE, Tint::Text);
        if !view.meta_line.is_empty() {
            push_text(&mut items, &mut y, &view.meta_line, META_SIZE, Tint::Muted);
        }
        if let Some(date) = &view.date_line {
            push_text(&mut items, &mut y, date, META_SIZE, Tint::Muted);
        }

        if !view.tags.is_empty() {
            y += 8.0;
            let mut x = pad;
            let h = META_SIZE + 8.0;
            for tag in &view.tags {
                let w = estimate_text_width(tag, META_SIZE) + 16.0;
                if x + w > pad + inner && x > pad {
                    x = pad;
                    y += h + 6.0;
                }
                items.push(Item::Panel(
                    PanelCommand::fill(Rect::new(x, y, w, h), [1.0; 4], h * 0.5),
                    Tint::Badge,
                ));
                items.push(Item::Text(
                    TextCommand::new(tag.as_str(), x + 8.0, y + 4.0, [1.0; 4], META_SIZE),
                    Tint::Text,
                ));
                x += w + 6.0;
            }
            y += h + 12.0;
        }

        let link_h = BODY_SIZE + 12.0;
        let reserved = if view.links.is_empty() { 0.0 } else { link_h + 16.0 };
        let body_limit = max_height - pad - reserved;
        y += 8.0;
        for block in &view.blocks {
            let (text, size) = match block {
                Block::Heading { level, text } => (text.as_str(), BODY_SIZE + (4 - *level) as f32 * 3.0),
                Block::Paragraph(text) => (text.as_str(), BODY_SIZE),
            };
            let lines = (estimate_text_width(text, size) / inner).ceil().max(1.0);
            if y + lines * size * LINE_HEIGHT > body_limit {
                push_text(&mut items, &mut y, "\u{2026}", BODY_SIZE, Tint::Muted);
                break;
            }
            push_text(&mut items, &mut y, text, size, Tint::Text);
            y += size * 0.5;
        }

        let mut links = Vec::new();
        if !view.links.is_empty() {
            y += 8.0;
            let mut x = pad;
            for link in &view.links {
                let label = link.label();
                let w = estimate_text_width(&label, BODY_SIZE) + 24.0;
                links.push((Rect::new(x, y, w, link_h), link.url.clone()));
                items.push(Item::Text(
                    TextCommand::new(label, x + 12.0, y + 6.0, [1.0; 4], BODY_SIZE),
                    Tint::Link,
                ));
                x += w + 8.0;
            }
            y += link_h;
        }

        let height = (y + pad).min(max_height);
        let content = Rect::new((vw - width) / 2.0, (vh - height) / 2.0, width, height);
        let close_size = 32.0;
        let close = Rect::new(
            content.x + content.width - close_size - 8.0,
            content.y + 8.0,
            close_size,
            close_size,
        );
        let (ox, oy) = (content.x, content.y);
        let links = links
            .into_iter()
            .map(|(r, url)| (r.translated(ox, oy), url))
            .collect();
        for item in items.iter_mut() {
            match item {
                Item::Panel(p, _) => p.rect = p.rect.translated(ox, oy),
                Item::Text(t, _) => {
                    t.x += ox;
                    t.y += oy;
                }
            }
        }
        Some(ModalLayout {
            content,
            close,
            links,
            items,
        })
    }

    pub fn draw(&self, list: &mut DrawList, theme: &Theme) {
        if !self.is_open() {
            return;
        }
        let Some(layout) = self.layout() else {
            return;
        };
        let opacity = self.anim.value(Channel::Opacity, self.now, 1.0).clamp(0.0, 1.0);
        let scale = self.anim.value(Channel::Scale, self.now, 1.0);
        let center = layout.content.center();
        let place = |r: Rect| {
            Rect::new(
                center.x + (r.x - center.x) * scale,
                center.y + (r.y - center.y) * scale,
                r.width * scale,
                r.height * scale,
            )
        };

        list.begin_overlay();
        list.panel(PanelCommand::fill(
            Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height),
            with_alpha(theme.overlay, opacity),
            0.0,
        ));
        list.panel(PanelCommand {
            rect: place(layout.content),
            bg_color: with_alpha(theme.modal_bg, opacity),
            border_color: with_alpha(theme.modal_border, opacity),
            border_width: 2.0,
            radius: theme.modal_radius * scale,
        });

        let color = |tint: Tint| match tint {
            Tint::Text => theme.text,
            Tint::Muted => theme.text_muted,
            Tint::Link => theme.link,
            Tint::Badge => theme.badge_bg,
        };
        for item in layout.items {
            match item {
                Item::Panel(mut p, tint) => {
                    p.rect = place(p.rect);
                    p.bg_color = with_alpha(color(tint), opacity);
                    p.radius *= scale;
                    list.panel(p);
                }
                Item::Text(mut t, tint) => {
                    let r = place(Rect::new(t.x, t.y, 0.0, 0.0));
                    t.x = r.x;
                    t.y = r.y;
                    t.font_size *= scale;
                    t.max_width = t.max_width.map(|w| w * scale);
                    t.color = with_alpha(color(tint), opacity);
                    list.text(t);
                }
            }
        }

        for (rect, _) in &layout.links {
            list.panel(PanelCommand {
                rect: place(*rect),
                bg_color: [0.0; 4],
                border_color: with_alpha(theme.link, opacity),
                border_width: 1.5,
                radius: 6.0 * scale,
            });
        }

        let close = place(layout.close);
        list.panel(PanelCommand {
            rect: close,
            bg_color: with_alpha(theme.nav_button_bg, opacity),
            border_color: with_alpha(theme.modal_border, opacity),
            border_width: 1.0,
            radius: close.width * 0.5,
        });
        list.text(
            TextCommand::new(
                "\u{00d7}",
                close.x + close.width * 0.5,
                close.y + close.height * 0.15,
                with_alpha(theme.text, opacity),
                20.0 * scale,
            )
            .centered(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::LocaleTable;
    use crate::project::parse_source;

    fn l10n() -> Localization {
        let table = LocaleTable::from_kdl_str(
            r#"
string "meta_game" { it "Progetto di gioco"; en "Game Project" }
string "meta_coding" { it "Progetto di codice"; en "Coding Project" }
string "modal_close" { it "Chiudi"; en "Close" }
"#,
        )
        .expect("valid table");
        Localization::new(Rc::new(table), "en").expect("known locale")
    }

    fn record() -> Rc<ProjectRecord> {
        let (r, _) = parse_source(
            "pixel",
            "---\ntitle: Pixel Drift\ntype: game\ngenre: Racing\nplatform: Web\n\
             date: 2024-03-01\ntechnologies: [Rust, wgpu]\nlinks:\n  source: https://example.com\n\
             ---\n# Intro\n\nFast **drifting** fun.\n- one\n- two\n",
        );
        Rc::new(r)
    }

    fn page_at(offset: f32) -> PageScroll {
        let mut page = PageScroll::default();
        page.set_max(500.0);
        page.scroll_by(offset);
        page
    }

    #[test]
    fn blocks_split_on_blank_lines() {
        let blocks = split_blocks("# Title\n\nOne *two*\nthree\n\n## Sub\n- a\n- **b**\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
                Block::Paragraph("One two three".into()),
                Block::Heading {
                    level: 2,
                    text: "Sub".into()
                },
                Block::Paragraph("\u{2022} a \u{2022} b".into()),
            ]
        );
        assert!(split_blocks("").is_empty());
        assert_eq!(
            split_blocks("#hashtag"),
            vec![Block::Paragraph("#hashtag".into())]
        );
    }

    #[test]
    fn detail_view_is_localized() {
        let view = DetailView::build(&record(), &l10n());
        assert_eq!(view.title, "Pixel Drift");
        assert_eq!(view.meta_line, "Game Project \u{2022} Racing \u{2022} Web");
        assert_eq!(view.date_line.as_deref(), Some("March 1, 2024"));
        assert_eq!(view.tags, vec!["Rust", "wgpu"]);
        assert_eq!(view.links.len(), 1);
        assert_eq!(view.close_label, "Close");
    }

    #[test]
    fn open_locks_and_close_restores_scroll() {
        let t0 = Instant::now();
        let mut page = page_at(120.0);
        let mut modal = Modal::new(Size::new(1024.0, 768.0), t0);
        assert_eq!(modal.phase(), ModalPhase::Closed);

        modal.open(record(), &l10n(), &mut page, t0);
        assert_eq!(modal.phase(), ModalPhase::Open { closing: false });
        assert!(page.is_locked());
        assert!(!page.scroll_by(50.0));

        assert!(modal.close(t0));
        assert!(!modal.close(t0));
        assert!(modal.is_closing());
        assert!(!modal.update(t0 + Duration::from_millis(100), &mut page));
        assert!(modal.is_open());

        assert!(modal.update(t0 + Duration::from_millis(250), &mut page));
        assert_eq!(modal.phase(), ModalPhase::Closed);
        assert!(!page.is_locked());
        assert_eq!(page.offset(), 120.0);
        assert!(modal.record().is_none());
    }

    #[test]
    fn close_when_closed_is_rejected() {
        let mut modal = Modal::new(Size::new(800.0, 600.0), Instant::now());
        assert!(!modal.close(Instant::now()));
    }

    #[test]
    fn reopen_replaces_content() {
        let t0 = Instant::now();
        let mut page = page_at(40.0);
        let mut modal = Modal::new(Size::new(1024.0, 768.0), t0);
        modal.open(record(), &l10n(), &mut page, t0);
        let (other, _) = parse_source("other", "---\ntitle: Other\n---\n");
        modal.open(Rc::new(other), &l10n(), &mut page, t0);
        assert_eq!(modal.record().map(|r| r.slug.as_str()), Some("other"));

        modal.close(t0);
        modal.update(t0 + Duration::from_secs(1), &mut page);
        assert_eq!(page.offset(), 40.0);
    }

    #[test]
    fn overlay_click_closes_and_content_click_does_not() {
        let t0 = Instant::now();
        let mut page = PageScroll::default();
        let mut modal = Modal::new(Size::new(1024.0, 768.0), t0);
        modal.open(record(), &l10n(), &mut page, t0);

        let content = modal.layout().expect("open").content;
        let inside = content.center();
        assert_eq!(
            modal.click(inside.x, inside.y, t0),
            Some(ModalClick::Consumed)
        );
        assert_eq!(modal.click(2.0, 2.0, t0), Some(ModalClick::Closing));
        assert!(modal.is_closing());
        assert_eq!(modal.click(inside.x, inside.y, t0), None);
    }

    #[test]
    fn close_button_and_links_are_clickable() {
        let t0 = Instant::now();
        let mut page = PageScroll::default();
        let mut modal = Modal::new(Size::new(1024.0, 768.0), t0);
        modal.open(record(), &l10n(), &mut page, t0);

        let layout = modal.layout().expect("open");
        let (link_rect, url) = layout.links[0].clone();
        let c = link_rect.center();
        assert_eq!(modal.click(c.x, c.y, t0), Some(ModalClick::Link(url)));

        let close = layout.close.center();
        assert_eq!(modal.click(close.x, close.y, t0), Some(ModalClick::Closing));
    }

    #[test]
    fn draw_goes_to_overlay_layer() {
        let t0 = Instant::now();
        let mut page = PageScroll::default();
        let mut modal = Modal::new(Size::new(1024.0, 768.0), t0);
        let mut list = DrawList::new();
        modal.draw(&mut list, &Theme::default());
        assert!(list.panels.is_empty());

        modal.open(record(), &l10n(), &mut page, t0);
        modal.update(t0 + Duration::from_secs(1), &mut page);
        modal.draw(&mut list, &Theme::default());
        let (base, overlay) = list.panel_layers();
        assert!(base.is_empty());
        assert!(overlay.len() >= 3);
        assert!(list.texts.iter().any(|t| t.text == "Pixel Drift"));
    }

    #[test]
    fn page_scroll_clamps_to_range() {
        let mut page = PageScroll::default();
        page.set_max(100.0);
        assert!(page.scroll_by(250.0));
        assert_eq!(page.offset(), 100.0);
        page.set_max(30.0);
        assert_eq!(page.offset(), 30.0);
        assert!(page.scroll_by(-1000.0));
        assert_eq!(page.offset(), 0.0);
        assert!(!page.scroll_by(-5.0));
    }
}
