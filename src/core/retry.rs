//! Backoff for optimistic conflict retries

use rand::Rng;
use std::time::Duration;

/// Bounded, jittered linear backoff
///
/// `delay(n) = min(step * n, cap) + uniform[0, jitter)`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total executions allowed, including the first
    pub max_attempts: u32,
    pub step: Duration,
    pub cap: Duration,
    /// Exclusive upper bound of the random extra delay
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            step: Duration::from_millis(100),
            cap: Duration::from_millis(1200),
            jitter: Duration::from_millis(60),
        }
    }
}

impl RetryPolicy {
    /// Policy with the default timings and a custom attempt limit
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Deterministic part of the delay before retrying after `attempt` conflicts
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt).min(self.cap)
    }

    /// Delay to sleep after the `attempt`-th conflicting attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter.is_zero() {
            return base;
        }
        base + rand::thread_rng().gen_range(Duration::ZERO..self.jitter)
    }
}
