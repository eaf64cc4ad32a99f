use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Easing function for tweens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// Constant speed interpolation.
    Linear,
    /// Quadratic ease-in: slow start (power2.in).
    EaseIn,
    /// Quadratic ease-out: fast start, slow end (power2.out).
    EaseOut,
    /// Quadratic ease-in-out (power2.inOut).
    EaseInOut,
    /// Overshoots the target then settles. `overshoot` is the back amount.
    BackOut { overshoot: f32 },
}

/// How a tween plays back over its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// `from` to `to`, then holds `to`.
    Once,
    /// `from` to `to` and back again; each leg takes the full duration.
    Yoyo,
}

/// A single active tween interpolating an f32 value over time.
#[derive(Debug, Clone)]
struct Tween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    easing: Easing,
    playback: Playback,
}

impl Tween {
    fn total(&self) -> Duration {
        match self.playback {
            Playback::Once => self.duration,
            Playback::Yoyo => self.duration * 2,
        }
    }

    fn rest_value(&self) -> f32 {
        match self.playback {
            Playback::Once => self.to,
            Playback::Yoyo => self.from,
        }
    }

    fn sample(&self, now: Instant) -> f32 {
        // Before a delayed start, hold the starting value.
        let elapsed = now.saturating_duration_since(self.start);
        if self.duration.is_zero() || elapsed >= self.total() {
            return self.rest_value();
        }
        let leg = self.duration.as_secs_f32();
        let mut t = elapsed.as_secs_f32() / leg;
        if t > 1.0 {
            // Second yoyo leg runs backwards.
            t = 2.0 - t;
        }
        self.from + (self.to - self.from) * ease(t, self.easing)
    }

    fn finished(&self, now: Instant) -> bool {
        self.duration.is_zero() || now.saturating_duration_since(self.start) >= self.total()
    }
}

/// Time-driven f32 tweens keyed by `K`.
///
/// Tweens run on wall-clock `Instant`s, not frame counts. Each entity owns
/// its own animator, so dropping or clearing it cancels every effect the
/// entity started; nothing outlives its owner.
#[derive(Debug, Clone)]
pub struct Animator<K> {
    tweens: HashMap<K, Tween>,
}

impl<K: Copy + Eq + Hash> Default for Animator<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> Animator<K> {
    pub fn new() -> Self {
        Self {
            tweens: HashMap::new(),
        }
    }

    /// Start (or restart) a tween beginning at `start`. A `start` in the
    /// future delays it. Overwrites any tween with the same key.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &mut self,
        key: K,
        from: f32,
        to: f32,
        duration: Duration,
        easing: Easing,
        start: Instant,
    ) {
        self.insert(key, from, to, duration, easing, Playback::Once, start);
    }

    /// Start a there-and-back tween that rests at `from` when done.
    pub fn start_yoyo(
        &mut self,
        key: K,
        from: f32,
        to: f32,
        leg: Duration,
        easing: Easing,
        start: Instant,
    ) {
        self.insert(key, from, to, leg, easing, Playback::Yoyo, start);
    }

    #[allow(clippy::too_many_arguments)]
    fn insert(
        &mut self,
        key: K,
        from: f32,
        to: f32,
        duration: Duration,
        easing: Easing,
        playback: Playback,
        start: Instant,
    ) {
        self.tweens.insert(
            key,
            Tween {
                from,
                to,
                start,
                duration,
                easing,
                playback,
            },
        );
    }

    /// Current interpolated value, or `None` if no tween exists for `key`.
    pub fn get(&self, key: K, now: Instant) -> Option<f32> {
        self.tweens.get(&key).map(|t| t.sample(now))
    }

    /// Current value, falling back to `rest` when no tween exists.
    pub fn value(&self, key: K, now: Instant, rest: f32) -> f32 {
        self.get(key, now).unwrap_or(rest)
    }

    /// True when no tween is still running.
    pub fn is_idle(&self, now: Instant) -> bool {
        self.tweens.values().all(|t| t.finished(now))
    }

    /// Cancel every tween.
    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    /// Drop finished tweens whose resting value matches `keep_if`'s
    /// expectation. Call once per frame to bound growth. A finished tween is
    /// only removed when the owner no longer needs its resting value, so
    /// owners pass the default value each channel rests at.
    pub fn gc(&mut self, now: Instant, default_for: impl Fn(K) -> f32) {
        self.tweens.retain(|&key, tween| {
            !tween.finished(now) || (tween.rest_value() - default_for(key)).abs() > f32::EPSILON
        });
    }
}

/// Apply an easing function to a linear progress value `t` in [0, 1].
pub fn ease(t: f32, easing: Easing) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match easing {
        Easing::Linear => t,
        Easing::EaseIn => t * t,
        Easing::EaseOut => {
            let f = 1.0 - t;
            1.0 - f * f
        }
        Easing::EaseInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                let f = -2.0 * t + 2.0;
                1.0 - f * f / 2.0
            }
        }
        Easing::BackOut { overshoot } => {
            let c3 = overshoot + 1.0;
            let f = t - 1.0;
            1.0 + c3 * f * f * f + overshoot * f * f
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        Fade,
        Move,
    }

    #[test]
    fn ease_linear() {
        assert!((ease(0.0, Easing::Linear)).abs() < 1e-6);
        assert!((ease(0.5, Easing::Linear) - 0.5).abs() < 1e-6);
        assert!((ease(1.0, Easing::Linear) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ease_in_out_endpoints_and_midpoint() {
        assert!((ease(0.0, Easing::EaseInOut)).abs() < 1e-6);
        assert!((ease(0.5, Easing::EaseInOut) - 0.5).abs() < 1e-6);
        assert!((ease(1.0, Easing::EaseInOut) - 1.0).abs() < 1e-6);
        assert!(ease(0.25, Easing::EaseInOut) < 0.25);
    }

    #[test]
    fn ease_in_slow_start_ease_out_fast_start() {
        assert!(ease(0.25, Easing::EaseIn) < 0.25);
        assert!(ease(0.25, Easing::EaseOut) > 0.25);
    }

    #[test]
    fn back_out_overshoots_then_lands() {
        let back = Easing::BackOut { overshoot: 2.0 };
        assert!(ease(0.0, back).abs() < 1e-6);
        assert!((ease(1.0, back) - 1.0).abs() < 1e-6);
        let peak = (1..100)
            .map(|i| ease(i as f32 / 100.0, back))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0, "back-out must overshoot, peak was {peak}");
    }

    #[test]
    fn animator_start_and_get() {
        let mut anim = Animator::new();
        let t0 = Instant::now();
        anim.start(
            Key::Fade,
            0.0,
            1.0,
            Duration::from_millis(100),
            Easing::Linear,
            t0,
        );

        let v = anim.get(Key::Fade, t0).expect("tween");
        assert!(v.abs() < 1e-6);

        let v = anim
            .get(Key::Fade, t0 + Duration::from_millis(50))
            .expect("tween");
        assert!((v - 0.5).abs() < 0.01);

        let v = anim
            .get(Key::Fade, t0 + Duration::from_millis(200))
            .expect("tween");
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn delayed_start_holds_from_value() {
        let mut anim = Animator::new();
        let t0 = Instant::now();
        anim.start(
            Key::Fade,
            0.0,
            1.0,
            Duration::from_millis(100),
            Easing::Linear,
            t0 + Duration::from_millis(300),
        );
        assert_eq!(anim.get(Key::Fade, t0), Some(0.0));
        assert_eq!(anim.get(Key::Fade, t0 + Duration::from_millis(299)), Some(0.0));
        assert!(!anim.is_idle(t0));
        let v = anim
            .get(Key::Fade, t0 + Duration::from_millis(350))
            .expect("tween");
        assert!((v - 0.5).abs() < 0.01);
    }

    #[test]
    fn yoyo_returns_to_from() {
        let mut anim = Animator::new();
        let t0 = Instant::now();
        anim.start_yoyo(
            Key::Move,
            1.0,
            0.9,
            Duration::from_millis(100),
            Easing::Linear,
            t0,
        );
        let mid = anim
            .get(Key::Move, t0 + Duration::from_millis(100))
            .expect("tween");
        assert!((mid - 0.9).abs() < 0.01);
        let back = anim
            .get(Key::Move, t0 + Duration::from_millis(150))
            .expect("tween");
        assert!((back - 0.95).abs() < 0.01);
        assert!(!anim.is_idle(t0 + Duration::from_millis(199)));
        assert_eq!(anim.get(Key::Move, t0 + Duration::from_millis(250)), Some(1.0));
        assert!(anim.is_idle(t0 + Duration::from_millis(200)));
    }

    #[test]
    fn value_falls_back_to_rest() {
        let anim: Animator<Key> = Animator::new();
        assert_eq!(anim.value(Key::Fade, Instant::now(), 0.7), 0.7);
    }

    #[test]
    fn overwrite_replaces_tween() {
        let mut anim = Animator::new();
        let t0 = Instant::now();
        anim.start(Key::Move, 0.0, 100.0, Duration::from_millis(200), Easing::Linear, t0);
        anim.start(Key::Move, 50.0, 60.0, Duration::from_millis(100), Easing::Linear, t0);
        assert_eq!(anim.get(Key::Move, t0), Some(50.0));
        assert_eq!(anim.get(Key::Move, t0 + Duration::from_millis(100)), Some(60.0));
    }

    #[test]
    fn clear_cancels_everything() {
        let mut anim = Animator::new();
        let t0 = Instant::now();
        anim.start(Key::Fade, 0.0, 1.0, Duration::from_millis(100), Easing::Linear, t0);
        anim.start(Key::Move, 0.0, 1.0, Duration::from_millis(100), Easing::Linear, t0);
        assert!(!anim.is_idle(t0));
        anim.clear();
        assert_eq!(anim.get(Key::Fade, t0), None);
        assert_eq!(anim.get(Key::Move, t0), None);
        assert!(anim.is_idle(t0));
    }

    #[test]
    fn gc_keeps_finished_tweens_resting_off_default() {
        let mut anim = Animator::new();
        let t0 = Instant::now();
        // Fade rests at 0.0 (hidden), which is not its default of 1.0.
        anim.start(Key::Fade, 1.0, 0.0, Duration::from_millis(50), Easing::Linear, t0);
        // Move rests at its default 0.0 and can go.
        anim.start(Key::Move, 10.0, 0.0, Duration::from_millis(50), Easing::Linear, t0);

        let later = t0 + Duration::from_millis(100);
        anim.gc(later, |key| match key {
            Key::Fade => 1.0,
            Key::Move => 0.0,
        });
        assert_eq!(anim.get(Key::Fade, later), Some(0.0));
        assert_eq!(anim.get(Key::Move, later), None);
    }

    #[test]
    fn zero_duration_snaps() {
        let mut anim = Animator::new();
        let t0 = Instant::now();
        anim.start(Key::Fade, 0.0, 1.0, Duration::ZERO, Easing::Linear, t0);
        assert_eq!(anim.get(Key::Fade, t0), Some(1.0));
        assert!(anim.is_idle(t0));
    }
}
