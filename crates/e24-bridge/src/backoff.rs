//! Bounded exponential backoff for retry episodes.

use std::time::Duration;

pub const DEFAULT_INITIAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Exponential backoff that gives up after a fixed number of attempts.
///
/// Each failed attempt is reported with [`Backoff::next_delay`], which returns
/// how long to wait before the next attempt, or `None` once the episode has
/// used all its attempts. [`Backoff::reset`] starts a new episode.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    max_attempts: u32,
    current: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max,
            max_attempts: max_attempts.max(1),
            current: initial,
            failures: 0,
        }
    }

    /// Record a failed attempt and return the wait before the next one.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.failures += 1;
        if self.failures >= self.max_attempts {
            return None;
        }
        let delay = self.current;
        self.current = std::cmp::min(self.current * 2, self.max);
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
        self.failures = 0;
    }

    /// Failed attempts in the current episode.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL, DEFAULT_MAX, DEFAULT_MAX_ATTEMPTS)
    }
}
