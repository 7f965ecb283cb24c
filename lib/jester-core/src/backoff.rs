//! Exponential backoff schedule.

use std::time::Duration;

/// Exponential backoff without jitter.
///
/// Each call to [`Backoff::next_delay`] returns the current delay and then
/// multiplies it by `factor`, never exceeding `max`. A `Backoff` is plain
/// state: keep one per logical operation.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use jester_core::Backoff;
///
/// let mut backoff = Backoff::default();
/// assert_eq!(backoff.next_delay(), Duration::from_secs(1));
/// assert_eq!(backoff.next_delay(), Duration::from_secs(2));
/// backoff.reset();
/// assert_eq!(backoff.next_delay(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    factor: u32,
    attempt: u32,
}

impl Default for Backoff {
    /// 1s, doubling, capped at 10s.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(10), 2)
    }
}

impl Backoff {
    /// Backoff starting at `min`, multiplied by `factor` per step, capped at
    /// `max`. A `max` below `min` is raised to `min`; a zero factor acts as 1.
    #[must_use]
    pub fn new(min: Duration, max: Duration, factor: u32) -> Self {
        Self {
            min,
            max: max.max(min),
            factor: factor.max(1),
            attempt: 0,
        }
    }

    /// Upper bound of every delay.
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Number of delays handed out since the last reset.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay that the next call to [`Backoff::next_delay`] returns.
    #[must_use]
    pub fn current(&self) -> Duration {
        self.factor
            .checked_pow(self.attempt)
            .and_then(|multiplier| self.min.checked_mul(multiplier))
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Return the current delay and advance the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current();
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Go back to the first delay.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_until_cap() {
        let mut backoff = Backoff::default();
        let delays: Vec<_> = (0..6).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000, 10_000]);
    }

    #[test]
    fn schedule_is_non_decreasing() {
        let mut backoff = Backoff::new(Duration::from_millis(3), Duration::from_millis(500), 3);
        let mut previous = Duration::ZERO;
        for _ in 0..50 {
            let delay = backoff.next_delay();
            assert!(delay >= previous);
            assert!(delay <= Duration::from_millis(500));
            previous = delay;
        }
    }

    #[test]
    fn reset_restarts_schedule() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.attempt(), 2);

        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.current(), Duration::from_secs(1));
    }

    #[test]
    fn huge_attempt_counts_saturate_at_max() {
        let mut backoff = Backoff::default();
        for _ in 0..100 {
            backoff.next_delay();
        }
        assert_eq!(backoff.current(), Duration::from_secs(10));
    }

    #[test]
    fn degenerate_parameters() {
        let backoff = Backoff::new(Duration::from_secs(5), Duration::from_secs(1), 0);
        assert_eq!(backoff.max(), Duration::from_secs(5));
        assert_eq!(backoff.current(), Duration::from_secs(5));
    }
}
