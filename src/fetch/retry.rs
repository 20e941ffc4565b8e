//! Retry policy: exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Delay before the first retry, doubled for every later one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
/// Cap on the exponential part of the delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);
/// Upper bound (exclusive) of the random offset added to each delay.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1_000);

pub trait BackoffPolicy {
    /// Delay to wait after failed attempt `attempt` (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Retries without waiting. Mostly useful in tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// `min(base * 2^attempt, max)`, without jitter.
    pub fn capped_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let bound = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..bound))
    }
}

impl BackoffPolicy for RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.capped_delay(attempt) + self.jitter()
    }
}
