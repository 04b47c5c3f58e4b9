use crate::config::EngineConfig;
use crate::core::{JitterConfig, RetryPolicy};
use crate::store::StoreConfig;
use crate::types::LockingMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Run an account operation script against the ledger engine
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(about = "Run account operation scripts against the ledger engine", long_about = None)]
pub struct CliArgs {
    /// Input CSV script
    #[arg(value_name = "INPUT", help = "Path to the input CSV script")]
    pub input_file: PathBuf,

    /// How script rows are scheduled
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sequential",
        help = "Execution strategy: 'sequential' in file order or 'concurrent' to race operations"
    )]
    pub strategy: StrategyType,

    /// Locking mode for rows that leave the column empty
    #[arg(
        long = "locking",
        value_name = "MODE",
        default_value = "optimistic",
        help = "Default locking mode: 'optimistic' or 'pessimistic'"
    )]
    pub locking: LockingType,

    #[arg(
        long = "max-attempts",
        value_name = "COUNT",
        help = "Optimistic attempts per operation before giving up (default: 5)"
    )]
    pub max_attempts: Option<u32>,

    #[arg(long = "jitter", help = "Inject random delays around optimistic attempts")]
    pub jitter: bool,

    #[arg(long = "jitter-min-ms", value_name = "MS", help = "Shortest injected delay (default: 10)")]
    pub jitter_min_ms: Option<u64>,

    #[arg(long = "jitter-max-ms", value_name = "MS", help = "Longest injected delay (default: 50)")]
    pub jitter_max_ms: Option<u64>,

    #[arg(
        long = "lock-timeout-ms",
        value_name = "MS",
        help = "Give up waiting for a row lock after this long (default: wait indefinitely)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Maximum number of in-flight operations (concurrent mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of operations in flight (default: 4 x CPU cores)"
    )]
    pub max_concurrent: Option<usize>,
}

/// Available execution strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sequential,
    Concurrent,
}

/// Locking mode as accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LockingType {
    Optimistic,
    Pessimistic,
}

impl From<LockingType> for LockingMode {
    fn from(locking: LockingType) -> Self {
        match locking {
            LockingType::Optimistic => LockingMode::Optimistic,
            LockingType::Pessimistic => LockingMode::Pessimistic,
        }
    }
}

impl CliArgs {
    /// Build a validated `EngineConfig` from the arguments
    ///
    /// Unset options keep their defaults; nonsensical values fall back to the
    /// defaults with a warning (see [`EngineConfig::new`]).
    pub fn to_engine_config(&self) -> EngineConfig {
        let default = EngineConfig::default();

        let retry = RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(default.retry.max_attempts),
            ..default.retry
        };

        let jitter = JitterConfig {
            enabled: self.jitter,
            min_delay: self
                .jitter_min_ms
                .map_or(default.jitter.min_delay, Duration::from_millis),
            max_delay: self
                .jitter_max_ms
                .map_or(default.jitter.max_delay, Duration::from_millis),
        };

        let store = StoreConfig {
            lock_timeout: self.lock_timeout_ms.map(Duration::from_millis),
        };

        EngineConfig::new(
            retry,
            jitter,
            store,
            self.max_concurrent.unwrap_or(default.max_concurrent),
        )
    }

    pub fn default_locking(&self) -> LockingMode {
        self.locking.into()
    }
}
