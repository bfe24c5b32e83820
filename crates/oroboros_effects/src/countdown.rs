//! # Countdown
//!
//! A replayable one-shot timer.

/// Timer that fires once when its duration has elapsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Countdown {
    duration: f32,
    remaining: f32,
    fired: bool,
}

impl Countdown {
    /// Creates a running countdown of `duration` seconds.
    ///
    /// Negative durations are treated as zero.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        let duration = duration.max(0.0);
        Self {
            duration,
            remaining: duration,
            fired: false,
        }
    }

    /// Restarts the countdown from its full duration.
    pub fn replay(&mut self) {
        self.remaining = self.duration;
        self.fired = false;
    }

    /// Advances the countdown by `delta_time` seconds.
    ///
    /// Returns true exactly once, on the tick that reaches zero.
    pub fn tick(&mut self, delta_time: f32) -> bool {
        if self.fired {
            return false;
        }
        self.remaining -= delta_time;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.fired = true;
            return true;
        }
        false
    }

    /// Fraction of the duration still left, from 1.0 (just started) to 0.0.
    #[inline]
    #[must_use]
    pub fn remaining_scale(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        self.remaining / self.duration
    }

    /// Seconds left.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Full duration in seconds.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Checks if the countdown has fired.
    #[inline]
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once() {
        let mut countdown = Countdown::new(1.0);
        assert!(!countdown.tick(0.5));
        assert!((countdown.remaining_scale() - 0.5).abs() < f32::EPSILON);
        assert!(countdown.tick(0.6));
        assert!(countdown.is_finished());
        assert!(!countdown.tick(1.0));
        assert!(countdown.remaining().abs() < f32::EPSILON);
    }

    #[test]
    fn test_replay_restarts() {
        let mut countdown = Countdown::new(2.0);
        countdown.tick(5.0);
        countdown.replay();
        assert!(!countdown.is_finished());
        assert!((countdown.remaining() - countdown.duration()).abs() < f32::EPSILON);
        assert!((countdown.remaining_scale() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_duration_fires_on_first_tick() {
        let mut countdown = Countdown::new(-3.0);
        assert!(countdown.remaining_scale().abs() < f32::EPSILON);
        assert!(countdown.tick(0.0));
    }
}
