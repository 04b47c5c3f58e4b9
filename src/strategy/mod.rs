//! Processing strategy module for operation scripts
//!
//! This module defines the Strategy pattern for complete script processing
//! pipelines, covering CSV parsing, execution through the coordinator and the
//! final account report. The implementation (sequential or concurrent) is
//! selected at runtime.

use crate::cli::StrategyType;
use crate::config::EngineConfig;
use crate::types::{LedgerError, LockingMode};
use std::io::Write;
use std::path::Path;

pub mod concurrent;
pub mod runner;
pub mod sequential;
pub mod summary;

pub use concurrent::ConcurrentStrategy;
pub use runner::ScriptRunner;
pub use sequential::SequentialStrategy;
pub use summary::RunSummary;

/// Processing strategy trait for complete script runs
pub trait ProcessingStrategy: Send + Sync {
    /// Run the script at `input_path` and write the account report to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` once every row was attempted, even if some failed
    /// * `Err(LedgerError)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened (file not found, permission denied)
    /// - The CSV header cannot be read
    /// - The runtime cannot be started
    /// - Output cannot be written
    ///
    /// Individual row failures are logged and counted in the summary; they
    /// never abort the run.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<RunSummary, LedgerError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - Sequential or concurrent execution
/// * `config` - Engine configuration shared by both strategies
/// * `default_locking` - Locking mode for rows that do not name one
pub fn create_strategy(
    strategy_type: StrategyType,
    config: EngineConfig,
    default_locking: LockingMode,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sequential => Box::new(SequentialStrategy::new(config, default_locking)),
        StrategyType::Concurrent => Box::new(ConcurrentStrategy::new(config, default_locking)),
    }
}
