//! Scheduling jitter around the optimistic critical section
//!
//! Widens the window in which concurrent writers interleave, so version
//! conflicts show up under test load. It only delays; outcomes are unchanged.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Fault-injection delay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct JitterConfig {
    pub enabled: bool,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        }
    }
}

impl JitterConfig {
    /// Enabled jitter with the default delay range
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    fn sample(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rand::thread_rng().gen_range(self.min_delay..self.max_delay)
    }
}

/// Run `fut` with a random pause before it and, half of the time, after it
///
/// With `config.enabled == false` this is a plain `fut.await`.
pub async fn with_jitter<F, T>(config: &JitterConfig, fut: F) -> T
where
    F: Future<Output = T>,
{
    if !config.enabled {
        return fut.await;
    }

    tokio::time::sleep(config.sample()).await;
    let output = fut.await;

    let pause_after = rand::thread_rng().gen_bool(0.5);
    if pause_after {
        tokio::time::sleep(config.sample()).await;
    }

    output
}
