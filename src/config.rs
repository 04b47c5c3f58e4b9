//! Engine configuration
//!
//! Groups the tunables of the core and the in-memory store. Values are
//! checked once at construction; nonsensical ones fall back to the default
//! with a warning instead of failing the run.

use crate::core::{JitterConfig, RetryPolicy};
use crate::store::StoreConfig;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
    pub jitter: JitterConfig,
    pub store: StoreConfig,
    /// Upper bound on in-flight operations for the concurrent strategy
    pub max_concurrent: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            jitter: JitterConfig::default(),
            store: StoreConfig::default(),
            max_concurrent: num_cpus::get() * 4,
        }
    }
}

impl EngineConfig {
    /// Create a validated configuration
    ///
    /// - `max_attempts == 0` and `max_concurrent == 0` fall back to defaults
    /// - a jitter range with `min_delay > max_delay` falls back to the default range
    /// - a zero lock timeout is treated as no timeout
    pub fn new(
        retry: RetryPolicy,
        jitter: JitterConfig,
        store: StoreConfig,
        max_concurrent: usize,
    ) -> Self {
        let default = Self::default();

        let retry = if retry.max_attempts == 0 {
            warn!(
                max_attempts = retry.max_attempts,
                default = default.retry.max_attempts,
                "invalid max_attempts, using default"
            );
            RetryPolicy {
                max_attempts: default.retry.max_attempts,
                ..retry
            }
        } else {
            retry
        };

        let jitter = if jitter.min_delay > jitter.max_delay {
            warn!(
                min_delay = ?jitter.min_delay,
                max_delay = ?jitter.max_delay,
                "invalid jitter range, using default range"
            );
            JitterConfig {
                enabled: jitter.enabled,
                ..default.jitter
            }
        } else {
            jitter
        };

        let store = match store.lock_timeout {
            Some(timeout) if timeout == Duration::ZERO => {
                warn!("zero lock timeout, waiting indefinitely instead");
                StoreConfig { lock_timeout: None }
            }
            _ => store,
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                max_concurrent,
                default = default.max_concurrent,
                "invalid max_concurrent, using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            retry,
            jitter,
            store,
            max_concurrent,
        }
    }
}
