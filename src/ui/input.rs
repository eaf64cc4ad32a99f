use smallvec::SmallVec;

/// Mouse button identifier (decoupled from winit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer transitions produced by [`PointerTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent<T> {
    /// Cursor entered the target.
    HoverEnter(T),
    /// Cursor left the target (or the target stopped being hit-testable).
    HoverLeave(T),
    /// Press and release both landed on the same target.
    Click(T, MouseButton),
}

pub type PointerEvents<T> = SmallVec<[PointerEvent<T>; 2]>;

/// Pixels scrolled per mouse wheel line.
pub const SCROLL_SPEED: f32 = 40.0;

/// Hover, press and click tracking over caller-resolved targets.
///
/// The tracker does no hit-testing itself: callers pass the target under
/// the cursor (`None` for empty space) and get back the transitions.
#[derive(Debug, Clone)]
pub struct PointerTracker<T> {
    hovered: Option<T>,
    pressed: Option<(T, MouseButton)>,
    cursor: (f32, f32),
}

impl<T: Copy + Eq> Default for PointerTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq> PointerTracker<T> {
    pub fn new() -> Self {
        Self {
            hovered: None,
            pressed: None,
            cursor: (0.0, 0.0),
        }
    }

    pub fn hovered(&self) -> Option<T> {
        self.hovered
    }

    pub fn cursor(&self) -> (f32, f32) {
        self.cursor
    }

    /// Cursor moved to `(x, y)` where `hit` is under it.
    pub fn moved(&mut self, x: f32, y: f32, hit: Option<T>) -> PointerEvents<T> {
        self.cursor = (x, y);
        self.set_hover(hit)
    }

    /// Re-resolve hover without the cursor moving, e.g. after relayout or a
    /// visibility change.
    pub fn refresh(&mut self, hit: Option<T>) -> PointerEvents<T> {
        self.set_hover(hit)
    }

    fn set_hover(&mut self, hit: Option<T>) -> PointerEvents<T> {
        let mut out = PointerEvents::new();
        if self.hovered == hit {
            return out;
        }
        if let Some(old) = self.hovered {
            out.push(PointerEvent::HoverLeave(old));
        }
        if let Some(new) = hit {
            out.push(PointerEvent::HoverEnter(new));
        }
        self.hovered = hit;
        out
    }

    /// Button went down over `hit`.
    pub fn pressed(&mut self, button: MouseButton, hit: Option<T>) {
        self.pressed = hit.map(|target| (target, button));
    }

    /// Button came up over `hit`. Emits a click when it matches the press.
    pub fn released(&mut self, button: MouseButton, hit: Option<T>) -> Option<PointerEvent<T>> {
        let (target, pressed_button) = self.pressed.take()?;
        (pressed_button == button && hit == Some(target))
            .then_some(PointerEvent::Click(target, button))
    }

    /// Drop hover and press state, returning a leave for the hovered target.
    pub fn reset(&mut self) -> PointerEvents<T> {
        self.pressed = None;
        self.set_hover(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_enter_and_leave() {
        let mut p = PointerTracker::new();
        assert_eq!(
            p.moved(1.0, 1.0, Some(7)).as_slice(),
            [PointerEvent::HoverEnter(7)]
        );
        assert!(p.moved(2.0, 1.0, Some(7)).is_empty());
        assert_eq!(
            p.moved(50.0, 1.0, Some(8)).as_slice(),
            [PointerEvent::HoverLeave(7), PointerEvent::HoverEnter(8)]
        );
        assert_eq!(
            p.moved(90.0, 1.0, None).as_slice(),
            [PointerEvent::HoverLeave(8)]
        );
        assert_eq!(p.cursor(), (90.0, 1.0));
    }

    #[test]
    fn click_needs_press_and_release_on_same_target() {
        let mut p = PointerTracker::new();
        p.pressed(MouseButton::Left, Some(1));
        assert_eq!(
            p.released(MouseButton::Left, Some(1)),
            Some(PointerEvent::Click(1, MouseButton::Left))
        );

        p.pressed(MouseButton::Left, Some(1));
        assert_eq!(p.released(MouseButton::Left, Some(2)), None);

        p.pressed(MouseButton::Left, None);
        assert_eq!(p.released(MouseButton::Left, Some(1)), None);
    }

    #[test]
    fn mismatched_button_is_not_a_click() {
        let mut p = PointerTracker::new();
        p.pressed(MouseButton::Right, Some(3));
        assert_eq!(p.released(MouseButton::Left, Some(3)), None);
    }

    #[test]
    fn reset_emits_leave() {
        let mut p = PointerTracker::new();
        p.moved(0.0, 0.0, Some(4));
        assert_eq!(p.reset().as_slice(), [PointerEvent::HoverLeave(4)]);
        assert_eq!(p.hovered(), None);
    }
}
