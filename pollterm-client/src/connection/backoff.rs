//! Adaptive idle polling delay

use std::time::Duration;

/// Delays that drive the polling schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimings {
    /// Delay before the first request of a session
    pub startup_delay: Duration,
    /// Delay used when input is waiting
    pub input_delay: Duration,
    /// Level after a reply that carried screen content
    pub active_delay: Duration,
    /// Level before the first reply
    pub initial_delay: Duration,
    /// Upper bound of the level
    pub max_delay: Duration,
    /// Time before an unanswered request is reported
    pub watchdog: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(100),
            input_delay: Duration::from_millis(1),
            active_delay: Duration::from_millis(100),
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2000),
            watchdog: Duration::from_millis(5000),
        }
    }
}

/// Current inter-poll delay
///
/// Doubles on every reply without new content and snaps back to the active
/// level when content arrives, so an idle session settles at `max_delay`
/// while a busy one polls quickly.
#[derive(Debug, Clone)]
pub struct Backoff {
    level: Duration,
    active: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(timings: &PollTimings) -> Self {
        Self {
            level: timings.initial_delay.min(timings.max_delay),
            active: timings.active_delay.min(timings.max_delay),
            max: timings.max_delay,
        }
    }

    pub fn current(&self) -> Duration {
        self.level
    }

    /// The host sent a fresh screen
    pub fn on_content(&mut self) {
        self.level = self.active;
    }

    /// The host had nothing new, or the exchange failed
    pub fn on_empty(&mut self) {
        let doubled = self.level.saturating_mul(2).max(Duration::from_millis(1));
        self.level = doubled.min(self.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_default_timings() {
        let timings = PollTimings::default();
        assert_eq!(timings.startup_delay, ms(100));
        assert_eq!(timings.input_delay, ms(1));
        assert_eq!(timings.active_delay, ms(100));
        assert_eq!(timings.initial_delay, ms(1));
        assert_eq!(timings.max_delay, ms(2000));
        assert_eq!(timings.watchdog, ms(5000));
    }

    #[test]
    fn test_starts_at_initial_level() {
        let backoff = Backoff::new(&PollTimings::default());
        assert_eq!(backoff.current(), ms(1));
    }

    #[test]
    fn test_doubles_up_to_cap() {
        let mut backoff = Backoff::new(&PollTimings::default());
        for n in 1..=16u32 {
            backoff.on_empty();
            let expected = ms(1u64 << n).min(ms(2000));
            assert_eq!(backoff.current(), expected, "after {n} empty replies");
        }
        assert_eq!(backoff.current(), ms(2000));
    }

    #[test]
    fn test_content_resets_to_active() {
        let mut backoff = Backoff::new(&PollTimings::default());
        for _ in 0..20 {
            backoff.on_empty();
        }
        backoff.on_content();
        assert_eq!(backoff.current(), ms(100));
        backoff.on_empty();
        assert_eq!(backoff.current(), ms(200));
    }

    #[test]
    fn test_zero_initial_level_still_grows() {
        let timings = PollTimings {
            initial_delay: Duration::ZERO,
            ..PollTimings::default()
        };
        let mut backoff = Backoff::new(&timings);
        backoff.on_empty();
        assert_eq!(backoff.current(), ms(1));
    }

    #[test]
    fn test_cap_below_active_level() {
        let timings = PollTimings {
            max_delay: ms(50),
            ..PollTimings::default()
        };
        let mut backoff = Backoff::new(&timings);
        backoff.on_content();
        assert_eq!(backoff.current(), ms(50));
    }
}
