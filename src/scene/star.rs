use rand::RngExt;
use rand::rngs::StdRng;

use super::{Frame, Updatable};
use crate::ui::Size;
use crate::ui::draw::{DrawList, PanelCommand};
use crate::ui::theme::Theme;
use crate::ui::Rect;

/// Max speed per axis, pixels per 60 Hz frame.
const MAX_SPEED: f32 = 1.5;
/// Strength of the shared circular drift.
const DRIFT: f32 = 0.1;
/// Drift angle divisor and cycle length, in frames.
const DRIFT_PERIOD: f32 = 350.0;
const LIFETIME_WRAP: u32 = 545;

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

/// Background particles bouncing inside the viewport, all nudged by one
/// slowly rotating drift.
pub struct StarField {
    stars: Vec<Star>,
    viewport: Size,
    lifetime: u32,
}

impl StarField {
    pub fn new(count: usize, viewport: Size, rng: &mut StdRng) -> Self {
        let stars = (0..count)
            .map(|_| Star {
                x: rng.random_range(0.0..=1.0) * viewport.width,
                y: rng.random_range(0.0..=1.0) * viewport.height,
                vx: rng.random_range(-MAX_SPEED..=MAX_SPEED),
                vy: rng.random_range(-MAX_SPEED..=MAX_SPEED),
                radius: rng.random_range(0.3..=1.5),
            })
            .collect();
        Self {
            stars,
            viewport,
            lifetime: 0,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Rescale positions into the new viewport.
    pub fn resize(&mut self, viewport: Size) {
        let sx = ratio(viewport.width, self.viewport.width);
        let sy = ratio(viewport.height, self.viewport.height);
        for s in self.stars.iter_mut() {
            s.x = (s.x * sx).clamp(0.0, viewport.width.max(0.0));
            s.y = (s.y * sy).clamp(0.0, viewport.height.max(0.0));
        }
        self.viewport = viewport;
    }

    pub fn draw(&self, list: &mut DrawList, theme: &Theme) {
        for s in &self.stars {
            let d = s.radius * 2.0;
            list.panel(PanelCommand::fill(
                Rect::new(s.x - s.radius, s.y - s.radius, d, d),
                theme.star,
                s.radius,
            ));
        }
    }
}

fn ratio(new: f32, old: f32) -> f32 {
    if old > 0.0 { new / old } else { 1.0 }
}

/// Allowed centre range along one axis of length `extent`; never inverted.
fn bounds(radius: f32, extent: f32) -> (f32, f32) {
    let mid = extent.max(0.0) * 0.5;
    (radius.min(mid), (extent - radius).max(mid))
}

impl Updatable for StarField {
    fn update(&mut self, frame: &Frame) {
        let angle = self.lifetime as f32 / DRIFT_PERIOD;
        let drift_x = angle.sin() * DRIFT * frame.dt;
        let drift_y = angle.cos() * DRIFT * frame.dt;
        let (w, h) = (self.viewport.width, self.viewport.height);

        for s in self.stars.iter_mut() {
            s.x += s.vx * frame.dt + drift_x;
            s.y += s.vy * frame.dt + drift_y;
            // Reflect off the edges, keeping the whole disc inside. A
            // viewport narrower than the disc pins it to the middle.
            let (lo_x, hi_x) = bounds(s.radius, w);
            if s.x < lo_x || s.x > hi_x {
                s.vx = -s.vx;
                s.x = s.x.clamp(lo_x, hi_x);
            }
            let (lo_y, hi_y) = bounds(s.radius, h);
            if s.y < lo_y || s.y > hi_y {
                s.vy = -s.vy;
                s.y = s.y.clamp(lo_y, hi_y);
            }
        }
        self.lifetime = (self.lifetime + 1) % LIFETIME_WRAP;
    }
}
