//! Time-driven interpolation.
//!
//! The host passes `now_ms` into every call; nothing here reads a clock.
//! A `Tween` goes from one value to another over a fixed span, and can be
//! retargeted mid-flight: the new tween starts from whatever value is on
//! screen at that instant.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Easing function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    /// Cubic in-out.
    #[default]
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Easing::EaseInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let u = t2 - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
        }
    }
}

/// Animation timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration_ms: f64,
    /// Used instead of `duration_ms` while Alt is held.
    pub slow_ms: f64,
    pub easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 200.0,
            slow_ms: 2500.0,
            easing: Easing::EaseInOut,
        }
    }
}

impl TransitionConfig {
    pub fn duration(&self, slow: bool) -> f64 {
        if slow { self.slow_ms } else { self.duration_ms }
    }
}

/// Linear interpolation between two values.
pub trait Lerp: Copy {
    fn lerp_to(self, other: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp_to(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Point {
    fn lerp_to(self, other: Self, t: f64) -> Self {
        self.lerp(other, t)
    }
}

impl Lerp for Size {
    fn lerp_to(self, other: Self, t: f64) -> Self {
        Size::new(
            self.width.lerp_to(other.width, t),
            self.height.lerp_to(other.height, t),
        )
    }
}

/// A value moving from `from` to `to` between `start_ms` and `start_ms + duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    from: T,
    to: T,
    start_ms: f64,
    duration_ms: f64,
    easing: Easing,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, start_ms: f64, duration_ms: f64, easing: Easing) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms,
            easing,
        }
    }

    /// A tween that has already arrived.
    pub fn settled(value: T) -> Self {
        Self::new(value, value, 0.0, 0.0, Easing::Linear)
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn sample(&self, now_ms: f64) -> T {
        let t = self.progress(now_ms);
        if t >= 1.0 {
            return self.to;
        }
        self.from.lerp_to(self.to, self.easing.apply(t))
    }

    pub fn is_done(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn origin(&self) -> T {
        self.from
    }

    /// Restart towards `to` from the value displayed at `now_ms`.
    pub fn retarget(&mut self, to: T, now_ms: f64, duration_ms: f64, easing: Easing) {
        let from = self.sample(now_ms);
        *self = Self::new(from, to, now_ms, duration_ms, easing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: TransitionConfig =
            serde_json::from_str(r#"{ "duration_ms": 400, "easing": "Linear" }"#).unwrap();
        assert_eq!(config.duration(false), 400.0);
        assert_eq!(config.duration(true), 2500.0);
        assert_eq!(config.easing, Easing::Linear);
    }

    #[test]
    fn cubic_in_out_shape() {
        let e = Easing::EaseInOut;
        assert_eq!(e.apply(0.0), 0.0);
        assert_eq!(e.apply(0.5), 0.5);
        assert_eq!(e.apply(1.0), 1.0);
        assert!(e.apply(0.25) < 0.25);
        assert!(e.apply(0.75) > 0.75);
    }

    #[test]
    fn tween_samples_endpoints() {
        let tween = Tween::new(0.0, 10.0, 100.0, 200.0, Easing::Linear);
        assert_eq!(tween.sample(50.0), 0.0);
        assert_eq!(tween.sample(200.0), 5.0);
        assert_eq!(tween.sample(300.0), 10.0);
        assert!(!tween.is_done(299.0));
        assert!(tween.is_done(300.0));
    }

    #[test]
    fn retarget_starts_from_displayed_value() {
        let mut tween = Tween::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            0.0,
            100.0,
            Easing::Linear,
        );
        tween.retarget(Point::new(0.0, 50.0), 50.0, 100.0, Easing::Linear);
        assert_eq!(tween.origin(), Point::new(50.0, 0.0));
        assert_eq!(tween.sample(50.0), Point::new(50.0, 0.0));
        assert_eq!(tween.sample(150.0), Point::new(0.0, 50.0));
    }

    #[test]
    fn zero_duration_is_settled() {
        let tween = Tween::settled(Size::new(3.0, 4.0));
        assert!(tween.is_done(0.0));
        assert_eq!(tween.sample(-10.0), Size::new(3.0, 4.0));
    }

    #[test]
    fn slow_duration_with_alt() {
        let config = TransitionConfig::default();
        assert_eq!(config.duration(false), 200.0);
        assert_eq!(config.duration(true), 2500.0);
    }
}
