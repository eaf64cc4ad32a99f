use std::time::{Duration, Instant};

use super::{Frame, Updatable};
use crate::ui::draw::{DrawList, PanelCommand, TextCommand, estimate_text_width};
use crate::ui::theme::Theme;
use crate::ui::{Animator, Easing, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Phase {
    In,
    Out,
}

const POP_TIME: Duration = Duration::from_millis(300);
const HOLD_TIME: Duration = Duration::from_secs(2);
const FONT_SIZE: f32 = 20.0;

/// Transient message in the middle of the screen: pops in, holds, shrinks
/// away.
pub struct Toast {
    message: String,
    anim: Animator<Phase>,
    ends_at: Instant,
    now: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, now: Instant) -> Self {
        let mut anim = Animator::new();
        anim.start(
            Phase::In,
            0.0,
            1.0,
            POP_TIME,
            Easing::BackOut { overshoot: 2.0 },
            now,
        );
        let out_at = now + POP_TIME + HOLD_TIME;
        anim.start(Phase::Out, 1.0, 0.0, POP_TIME, Easing::EaseIn, out_at);
        Self {
            message: message.into(),
            anim,
            ends_at: out_at + POP_TIME,
            now,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn scale(&self, now: Instant) -> f32 {
        self.anim.value(Phase::In, now, 1.0) * self.anim.value(Phase::Out, now, 1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now >= self.ends_at
    }

    pub fn draw(&self, list: &mut DrawList, theme: &Theme, viewport: Size) {
        let s = self.scale(self.now);
        if s <= 0.001 {
            return;
        }
        let pad = 16.0;
        let w = estimate_text_width(&self.message, FONT_SIZE) + pad * 2.0;
        let h = FONT_SIZE + pad * 2.0;
        let rect = Rect::new((viewport.width - w) / 2.0, (viewport.height - h) / 2.0, w, h).scaled(s);
        list.panel(PanelCommand::fill(rect, theme.toast_bg, 10.0 * s));
        let center = rect.center();
        list.text(
            TextCommand::new(
                self.message.clone(),
                center.x,
                center.y - FONT_SIZE * s * 0.6,
                theme.toast_text,
                FONT_SIZE * s,
            )
            .centered(),
        );
    }
}

impl Updatable for Toast {
    fn update(&mut self, frame: &Frame) {
        self.now = frame.now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_holds_and_leaves() {
        let t0 = Instant::now();
        let toast = Toast::new("hello", t0);
        assert_eq!(toast.scale(t0), 0.0);
        assert!((toast.scale(t0 + Duration::from_secs(1)) - 1.0).abs() < 1e-6);
        assert!(!toast.is_finished(t0 + Duration::from_secs(2)));
        assert_eq!(toast.scale(t0 + Duration::from_millis(2600)), 0.0);
        assert!(toast.is_finished(t0 + Duration::from_millis(2600)));
        assert_eq!(toast.message(), "hello");
    }

    #[test]
    fn draws_nothing_before_pop() {
        let t0 = Instant::now();
        let toast = Toast::new("x", t0);
        let mut list = DrawList::new();
        toast.draw(&mut list, &Theme::default(), Size::new(800.0, 600.0));
        assert!(list.panels.is_empty());
    }
}
