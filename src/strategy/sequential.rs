//! Sequential processing strategy
//!
//! Runs every script row strictly in file order on a single-threaded tokio
//! runtime, so optimistic operations never actually conflict.
//!
//! # Design
//!
//! The SequentialStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Command execution to `ScriptRunner`
//! - CSV output to `csv_format::write_accounts_csv`

use super::runner::ScriptRunner;
use super::summary::RunSummary;
use crate::config::EngineConfig;
use crate::io::{write_accounts_csv, SyncReader};
use crate::strategy::ProcessingStrategy;
use crate::types::{LedgerError, LockingMode};
use std::io::Write;
use std::path::Path;

/// Strictly ordered, single-threaded script execution
#[derive(Debug, Clone)]
pub struct SequentialStrategy {
    config: EngineConfig,
    default_locking: LockingMode,
}

impl SequentialStrategy {
    pub fn new(config: EngineConfig, default_locking: LockingMode) -> Self {
        Self {
            config,
            default_locking,
        }
    }
}

impl ProcessingStrategy for SequentialStrategy {
    /// Run the script and write the account report
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Per-row failures are logged, counted and processing continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<RunSummary, LedgerError> {
        let reader = SyncReader::new(input_path)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let runner = ScriptRunner::new(&self.config, self.default_locking);
            let mut summary = RunSummary::default();

            for parsed in reader {
                let outcome = match parsed {
                    Ok(record) => runner.run(record).await,
                    Err(error) => {
                        tracing::warn!(error = %error, "skipping malformed row");
                        Err(error)
                    }
                };
                summary.record(&outcome);
            }

            let reports = runner.report().await?;
            write_accounts_csv(&reports, output)?;

            summary.log();
            Ok(summary)
        })
    }
}
