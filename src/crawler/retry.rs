//! Backoff policy for retried fetches

use crate::config::ScraperConfig;
use rand::Rng;
use std::time::Duration;

/// Largest exponent applied to the base delay before capping
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Attempt bound and delay schedule for one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    pub base_delay: Duration,

    pub max_delay: Duration,

    /// Adds a random `[0, delay/2]` on top of the exponential delay
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base),
            max_delay: Duration::from_millis(config.backoff_max),
            jitter: true,
        }
    }

    /// Exponential delay before retrying after `attempt` (1-based), without jitter
    ///
    /// `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base_delay
            .saturating_mul(2u32.pow(exponent))
            .min(self.max_delay)
    }

    /// Delay to sleep after failed attempt `attempt`
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt that just failed (1-based)
    /// * `retry_after` - Server-provided `Retry-After`, if any
    /// * `previous` - Delay used after the previous attempt of the same call
    ///
    /// # Returns
    ///
    /// A delay that is never shorter than `previous`
    pub fn delay_for(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        previous: Duration,
    ) -> Duration {
        let base = self.backoff_delay(attempt);
        let mut delay = (base + self.jitter_for(base)).min(self.max_delay);

        if let Some(requested) = retry_after {
            delay = delay.max(requested.min(self.max_delay));
        }

        delay.max(previous)
    }

    fn jitter_for(&self, delay: Duration) -> Duration {
        let spread = delay.as_millis() as u64 / 2;
        if !self.jitter || spread == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScraperConfig::default())
    }
}
