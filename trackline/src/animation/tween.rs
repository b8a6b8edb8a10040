//! Time-based easing of progress and heading.
//!
//! A [`TweenState`] is plain data plus a pure [`TweenState::sample`] step,
//! so the maths can be checked at arbitrary instants without a runtime.

use std::time::Duration;

use tokio::time::Instant;

use crate::geometry::normalize_degrees;

/// Cubic ease-out: fast start, gentle arrival. `t` is clamped to [0, 1].
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Signed angle from `from` to `to` along the shorter arc, in (-180, 180].
pub fn shortest_heading_delta(from: f64, to: f64) -> f64 {
    let delta = normalize_degrees(to - from);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Heading `t` of the way from `from` to `to` along the shorter arc.
pub fn interpolate_heading(from: f64, to: f64, t: f64) -> f64 {
    normalize_degrees(from + shortest_heading_delta(from, to) * t)
}

/// One value of a tween at an instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSample {
    pub progress: f64,
    pub heading: f64,
    /// The tween has reached its target.
    pub finished: bool,
}

/// An in-flight interpolation from one (progress, heading) to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenState {
    pub from_progress: f64,
    pub to_progress: f64,
    pub from_heading: f64,
    pub to_heading: f64,
    pub started_at: Instant,
    pub duration: Duration,
}

impl TweenState {
    /// Starts a tween at `now`.
    pub fn start(
        from: (f64, f64),
        to: (f64, f64),
        now: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            from_progress: from.0,
            from_heading: from.1,
            to_progress: to.0,
            to_heading: to.1,
            started_at: now,
            duration,
        }
    }

    /// Eased value at `now`.
    pub fn sample(&self, now: Instant) -> TweenSample {
        let elapsed = now.saturating_duration_since(self.started_at);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };

        if t >= 1.0 {
            return TweenSample {
                progress: self.to_progress,
                heading: normalize_degrees(self.to_heading),
                finished: true,
            };
        }

        let eased = ease_out_cubic(t);
        TweenSample {
            progress: self.from_progress + (self.to_progress - self.from_progress) * eased,
            heading: interpolate_heading(self.from_heading, self.to_heading, eased),
            finished: false,
        }
    }

    /// A new tween toward `target`, starting from this tween's value at `now`.
    pub fn retarget(&self, target: (f64, f64), now: Instant) -> Self {
        let current = self.sample(now);
        Self::start(
            (current.progress, current.heading),
            target,
            now,
            self.duration,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: Duration = Duration::from_millis(600);

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
        assert_eq!(ease_out_cubic(-1.0), 0.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn test_shortest_heading_delta() {
        assert_eq!(shortest_heading_delta(350.0, 10.0), 20.0);
        assert_eq!(shortest_heading_delta(10.0, 350.0), -20.0);
        assert_eq!(shortest_heading_delta(0.0, 180.0), 180.0);
        assert_eq!(shortest_heading_delta(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_heading_wraps_through_north() {
        let mid = interpolate_heading(350.0, 10.0, 0.5);
        assert!(mid.abs() < 1e-9 || (mid - 360.0).abs() < 1e-9, "got {}", mid);

        let quarter = interpolate_heading(350.0, 10.0, 0.25);
        assert!((quarter - 355.0).abs() < 1e-9);
        let three_quarters = interpolate_heading(350.0, 10.0, 0.75);
        assert!((three_quarters - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_progression() {
        let t0 = Instant::now();
        let tween = TweenState::start((0.2, 0.0), (0.6, 90.0), t0, DURATION);

        let start = tween.sample(t0);
        assert_eq!(start.progress, 0.2);
        assert!(!start.finished);

        let mid = tween.sample(t0 + Duration::from_millis(300));
        assert!((mid.progress - (0.2 + 0.4 * 0.875)).abs() < 1e-9);
        assert!((mid.heading - 90.0 * 0.875).abs() < 1e-9);

        let end = tween.sample(t0 + Duration::from_millis(700));
        assert_eq!(end.progress, 0.6);
        assert_eq!(end.heading, 90.0);
        assert!(end.finished);
    }

    #[test]
    fn test_retarget_starts_from_current_value() {
        let t0 = Instant::now();
        let tween = TweenState::start((0.0, 0.0), (0.5, 0.0), t0, DURATION);
        let now = t0 + Duration::from_millis(300);
        let before = tween.sample(now);

        let retargeted = tween.retarget((1.0, 0.0), now);
        let after = retargeted.sample(now);
        assert_eq!(before.progress, after.progress);
        assert_eq!(retargeted.to_progress, 1.0);
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let t0 = Instant::now();
        let tween = TweenState::start((0.0, 0.0), (0.5, 45.0), t0, Duration::ZERO);
        let sample = tween.sample(t0);
        assert!(sample.finished);
        assert_eq!(sample.progress, 0.5);
    }
}
