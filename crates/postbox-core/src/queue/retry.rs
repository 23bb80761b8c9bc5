//! Retry policy: backoff delays and the starvation boost.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::Priority;

/// Cap applied when a policy does not name one.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(300);

/// Retry policy for failed deliveries.
///
/// Delay after the n-th failure (1-indexed):
/// `min(base_delay * multiplier^(n - 1), max_delay)`, then reduced by a random
/// fraction of up to `jitter`.
///
/// Example with base_delay=2s, multiplier=2.0, jitter=0:
/// - failure 1: 2s
/// - failure 2: 4s
/// - failure 3: 8s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    #[serde(rename = "base_delay_ms", with = "crate::config::millis")]
    pub base_delay: Duration,

    pub multiplier: f64,

    #[serde(rename = "max_delay_ms", with = "crate::config::millis")]
    pub max_delay: Duration,

    /// 0.0 = deterministic, 1.0 = anywhere in `[0, delay]`.
    pub jitter: f64,

    /// Boost a retried task one priority tier every `n` failures.
    /// `None`: retries always go to the back of their own tier.
    pub promote_after: Option<u32>,
}

impl RetryPolicy {
    /// No delay between attempts.
    ///
    /// `max_delay` is still `DEFAULT_MAX_DELAY`, so setting only `base_delay`
    /// on top of this (or on top of a partial JSON object) gives real backoff.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: 0.0,
            promote_after: None,
        }
    }

    /// Doubling backoff starting at `base_delay`, capped at 5 minutes.
    pub fn exponential(base_delay: Duration) -> Self {
        Self {
            base_delay,
            multiplier: 2.0,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: 0.0,
            promote_after: None,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_promote_after(mut self, failures: u32) -> Self {
        self.promote_after = Some(failures);
        self
    }

    /// Upper bound of the delay after `failures` failed attempts (no jitter).
    pub fn base_delay_for(&self, failures: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        if !capped.is_finite() || capped <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(capped)
    }

    /// Delay before the next attempt, jitter applied.
    pub fn next_delay(&self, failures: u32) -> Duration {
        let delay = self.base_delay_for(failures);
        if delay.is_zero() || self.jitter <= 0.0 {
            return delay;
        }
        let jitter = self.jitter.min(1.0);
        let factor = 1.0 - rand::thread_rng().gen_range(0.0..=jitter);
        delay.mul_f64(factor)
    }

    /// Tier a task re-enters the backlog at after `failures` failures.
    pub fn retry_priority(&self, current: Priority, failures: u32) -> Priority {
        match self.promote_after {
            Some(n) if n > 0 && failures > 0 && failures % n == 0 => current.promoted(),
            _ => current,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate()
    }
}
