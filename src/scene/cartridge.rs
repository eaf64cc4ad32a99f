use std::rc::Rc;
use std::time::{Duration, Instant};

use super::layout::ITEM_ASPECT;
use super::{Frame, Updatable};
use crate::localization::Localization;
use crate::project::ProjectRecord;
use crate::ui::draw::{DrawList, PanelCommand, TextCommand, estimate_text_width};
use crate::ui::theme::{CartridgePalette, Theme, with_alpha};
use crate::ui::{Animator, Easing, Rect};

/// Animated properties of a cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Alpha,
    /// Hover scale.
    Scale,
    /// Hover lift, in pixels (negative is up).
    Lift,
    /// Click bounce, multiplied into the scale.
    Press,
}

impl Channel {
    fn rest(self) -> f32 {
        match self {
            Channel::Alpha | Channel::Scale | Channel::Press => 1.0,
            Channel::Lift => 0.0,
        }
    }
}

const HOVER_SCALE: f32 = 1.1;
const HOVER_LIFT: f32 = -10.0;
const HOVER_TIME: Duration = Duration::from_millis(300);
const PRESS_SCALE: f32 = 0.95;
const PRESS_TIME: Duration = Duration::from_millis(100);
const FADE_TIME: Duration = Duration::from_millis(300);
const ENTRANCE_TIME: Duration = Duration::from_millis(500);
/// Float phase advance per 60 Hz frame.
const FLOAT_SPEED: f32 = 0.02;
/// Peak float displacement in pixels.
const FLOAT_AMPLITUDE: f32 = 10.0;

/// One project on the shelf.
pub struct Cartridge {
    record: Rc<ProjectRecord>,
    /// Resting rect from the layout.
    slot: Rect,
    palette: CartridgePalette,
    hovered: bool,
    visible: bool,
    float_start: f32,
    float_phase: f32,
    anim: Animator<Channel>,
    now: Instant,
}

impl Cartridge {
    /// Fades in after `entrance_delay`. Height is always `width * 1.4`.
    pub fn new(
        record: Rc<ProjectRecord>,
        x: f32,
        y: f32,
        width: f32,
        float_phase: f32,
        entrance_delay: Duration,
        now: Instant,
    ) -> Self {
        let palette = CartridgePalette::for_category(record.meta.category);
        let mut anim = Animator::new();
        anim.start(
            Channel::Alpha,
            0.0,
            1.0,
            ENTRANCE_TIME,
            Easing::EaseOut,
            now + entrance_delay,
        );
        Self {
            record,
            slot: Rect::new(x, y, width, width * ITEM_ASPECT),
            palette,
            hovered: false,
            visible: true,
            float_start: float_phase,
            float_phase,
            anim,
            now,
        }
    }

    pub fn record(&self) -> &Rc<ProjectRecord> {
        &self.record
    }

    pub fn slug(&self) -> &str {
        &self.record.slug
    }

    pub fn slot(&self) -> Rect {
        self.slot
    }

    /// Move to a new layout slot. Hover, float and tweens carry over.
    pub fn set_slot(&mut self, x: f32, y: f32, width: f32) {
        self.slot = Rect::new(x, y, width, width * ITEM_ASPECT);
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Target visibility; a fade may still be running.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn on_hover(&mut self, now: Instant) {
        if self.hovered {
            return;
        }
        self.hovered = true;
        let scale = self.value(Channel::Scale, now);
        let lift = self.value(Channel::Lift, now);
        self.anim.start(
            Channel::Scale,
            scale,
            HOVER_SCALE,
            HOVER_TIME,
            Easing::BackOut { overshoot: 2.0 },
            now,
        );
        self.anim
            .start(Channel::Lift, lift, HOVER_LIFT, HOVER_TIME, Easing::EaseOut, now);
    }

    pub fn on_hover_out(&mut self, now: Instant) {
        if !self.hovered {
            return;
        }
        self.hovered = false;
        let scale = self.value(Channel::Scale, now);
        let lift = self.value(Channel::Lift, now);
        self.anim
            .start(Channel::Scale, scale, 1.0, HOVER_TIME, Easing::EaseInOut, now);
        self.anim
            .start(Channel::Lift, lift, 0.0, HOVER_TIME, Easing::EaseIn, now);
    }

    /// Bounce after the click callback has run.
    pub fn on_click(&mut self, now: Instant) {
        self.anim.start_yoyo(
            Channel::Press,
            1.0,
            PRESS_SCALE,
            PRESS_TIME,
            Easing::EaseInOut,
            now,
        );
    }

    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        let alpha = self.value(Channel::Alpha, now);
        let target = if visible { 1.0 } else { 0.0 };
        self.anim
            .start(Channel::Alpha, alpha, target, FADE_TIME, Easing::EaseInOut, now);
    }

    /// Cancel every tween. The cartridge draws at rest afterwards.
    pub fn dispose(&mut self) {
        self.anim.clear();
        log::trace!("disposed cartridge {}", self.record.slug);
    }

    pub fn has_running_tweens(&self, now: Instant) -> bool {
        !self.anim.is_idle(now)
    }

    fn value(&self, channel: Channel, now: Instant) -> f32 {
        self.anim.value(channel, now, channel.rest())
    }

    pub fn alpha(&self, now: Instant) -> f32 {
        self.value(Channel::Alpha, now)
    }

    pub fn scale(&self, now: Instant) -> f32 {
        self.value(Channel::Scale, now) * self.value(Channel::Press, now)
    }

    /// Idle bob, in pixels.
    pub fn float_offset(&self) -> f32 {
        FLOAT_AMPLITUDE * (self.float_start.cos() - self.float_phase.cos())
    }

    /// On-screen rect at `now` in scene coordinates.
    pub fn bounds(&self, now: Instant) -> Rect {
        self.slot
            .scaled(self.scale(now))
            .translated(0.0, self.value(Channel::Lift, now) + self.float_offset())
    }

    /// Only cartridges meant to be visible take pointer input.
    pub fn hit(&self, x: f32, y: f32) -> bool {
        self.visible && self.bounds(self.now).contains(x, y)
    }

    pub fn draw(
        &self,
        list: &mut DrawList,
        theme: &Theme,
        l10n: &Localization,
        hue_shift: Option<f32>,
        scroll: f32,
    ) {
        let alpha = self.alpha(self.now);
        if alpha <= 0.001 {
            return;
        }
        let palette = match hue_shift {
            Some(deg) => self.palette.hue_rotated(deg),
            None => self.palette,
        };
        let s = self.scale(self.now);
        let r = self.bounds(self.now).translated(0.0, -scroll);
        let (w, h) = (r.width, r.height);

        list.panel(PanelCommand::fill(r, with_alpha(palette.primary, alpha), 8.0 * s));

        let notch_h = h * 0.15;
        list.panel(PanelCommand::fill(
            Rect::new(r.x + w * 0.2, r.y - notch_h * 0.5, w * 0.6, notch_h),
            with_alpha(palette.secondary, alpha),
            4.0 * s,
        ));

        let label = Rect::new(r.x + w * 0.1, r.y + h * 0.3, w * 0.8, h * 0.4);
        list.panel(PanelCommand::fill(label, with_alpha(theme.label_bg, alpha), 4.0 * s));
        list.panel(PanelCommand::fill(
            Rect::new(label.x, label.y + label.height + 5.0 * s, label.width, 3.0 * s),
            with_alpha(palette.accent, alpha),
            0.0,
        ));

        let title = self.record.display_title().to_uppercase();
        let size = w * 0.12;
        let wrap = w * 0.7;
        let lines = (estimate_text_width(&title, size) / wrap).ceil().max(1.0);
        let center = label.center();
        list.text(
            TextCommand::new(
                title,
                center.x,
                center.y - lines * size * 0.6,
                with_alpha(theme.label_text, alpha),
                size,
            )
            .centered()
            .wrapped(wrap),
        );

        if let Some(category) = self.record.meta.category {
            let badge_size = w * 0.08;
            list.text(
                TextCommand::new(
                    l10n.text_or_key(category.badge_key()),
                    r.x + w * 0.5,
                    r.y + h * 0.85 - badge_size * 0.6,
                    with_alpha(palette.accent, alpha),
                    badge_size,
                )
                .centered(),
            );
        }
    }
}

impl Updatable for Cartridge {
    fn update(&mut self, frame: &Frame) {
        self.now = frame.now;
        if !self.hovered {
            self.float_phase += frame.dt * FLOAT_SPEED;
        }
        self.anim.gc(frame.now, Channel::rest);
    }
}
