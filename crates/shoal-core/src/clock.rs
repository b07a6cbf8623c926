//! Frame throttling for the host's per-frame callback.

/// Decides which host frames get processed and how large a step they take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    min_interval_ms: f64,
    max_dt: f32,
    last_ms: f64,
}

impl FrameClock {
    /// Creates a clock primed at `now_ms` (typically the mount time).
    #[must_use]
    pub fn new(min_interval_ms: f64, max_dt: f32, now_ms: f64) -> Self {
        Self {
            min_interval_ms,
            max_dt,
            last_ms: now_ms,
        }
    }

    /// Returns the step in seconds for a frame at `now_ms`, or `None` when the
    /// frame arrives too soon after the last processed one.
    pub fn advance(&mut self, now_ms: f64) -> Option<f32> {
        let elapsed = now_ms - self.last_ms;
        if elapsed < self.min_interval_ms {
            return None;
        }
        self.last_ms = now_ms;
        Some(((elapsed / 1000.0) as f32).min(self.max_dt))
    }

    /// Re-primes the clock, e.g. after the loop was paused.
    pub fn reset(&mut self, now_ms: f64) {
        self.last_ms = now_ms;
    }

    #[must_use]
    pub const fn last_processed_ms(&self) -> f64 {
        self.last_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_frames_inside_the_interval() {
        let mut clock = FrameClock::new(25.0, 0.05, 0.0);
        assert_eq!(clock.advance(16.6), None);
        let dt = clock.advance(25.0).expect("processed");
        assert!((dt - 0.025).abs() < 1e-6);
        assert_eq!(clock.advance(41.0), None);
        assert_eq!(clock.last_processed_ms(), 25.0);
    }

    #[test]
    fn bounds_step_after_a_stall() {
        let mut clock = FrameClock::new(25.0, 0.05, 1_000.0);
        let dt = clock.advance(6_000.0).expect("processed");
        assert_eq!(dt, 0.05);
    }

    #[test]
    fn reset_moves_the_reference_point() {
        let mut clock = FrameClock::new(25.0, 0.05, 0.0);
        clock.reset(500.0);
        assert_eq!(clock.advance(510.0), None);
        assert!(clock.advance(530.0).is_some());
    }
}
