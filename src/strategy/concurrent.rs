//! Concurrent processing strategy
//!
//! Opens every account first, in file order, then submits all deposits and
//! withdrawals at once as tokio tasks on a multi-threaded runtime. Operations
//! on the same account genuinely race, which is what exercises the optimistic
//! retry loop and the row locks.
//!
//! # Configuration
//!
//! `EngineConfig::max_concurrent` bounds how many operations are in flight;
//! a semaphore permit is taken before each task is spawned.

use super::runner::ScriptRunner;
use super::summary::RunSummary;
use crate::config::EngineConfig;
use crate::io::{write_accounts_csv, AsyncReader, ScriptRecord};
use crate::strategy::ProcessingStrategy;
use crate::types::{LedgerError, LockingMode};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, warn};

/// Rows read from the script per batch
const READ_BATCH_SIZE: usize = 1000;

/// Contended, multi-threaded script execution
#[derive(Debug, Clone)]
pub struct ConcurrentStrategy {
    config: EngineConfig,
    default_locking: LockingMode,
}

impl ConcurrentStrategy {
    pub fn new(config: EngineConfig, default_locking: LockingMode) -> Self {
        Self {
            config,
            default_locking,
        }
    }

    async fn run(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunSummary, LedgerError> {
        let file = tokio::fs::File::open(input_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => LedgerError::FileNotFound {
                path: input_path.display().to_string(),
            },
            _ => LedgerError::IoError {
                message: format!("Failed to open file '{}': {}", input_path.display(), e),
            },
        })?;

        // Wrap tokio file in a compatibility layer for csv-async
        let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
        let mut reader = AsyncReader::new(compat_file);
        let parsed = reader.read_all(READ_BATCH_SIZE).await;

        let mut summary = RunSummary::default();
        let mut opens = Vec::new();
        let mut mutations = Vec::new();
        for result in parsed {
            match result {
                Ok(record) if record.command.is_open() => opens.push(record),
                Ok(record) => mutations.push(record),
                Err(error) => {
                    warn!(error = %error, "skipping malformed row");
                    summary.record(&Err(error));
                }
            }
        }

        let runner = Arc::new(ScriptRunner::new(&self.config, self.default_locking));

        for record in opens {
            summary.record(&runner.run(record).await);
        }

        for outcome in self.submit_all(&runner, mutations).await? {
            summary.record(&outcome);
        }

        let reports = runner.report().await?;
        write_accounts_csv(&reports, output)?;

        summary.log();
        Ok(summary)
    }

    /// Spawn one task per record and wait for all of them
    async fn submit_all(
        &self,
        runner: &Arc<ScriptRunner>,
        records: Vec<ScriptRecord>,
    ) -> Result<Vec<Result<(), LedgerError>>, LedgerError> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut tasks = Vec::with_capacity(records.len());

        for record in records {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| LedgerError::storage(format!("Semaphore closed: {}", e)))?;
            let runner = Arc::clone(runner);
            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                runner.run(record).await
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(error = %e, "script task panicked");
                    outcomes.push(Err(LedgerError::storage(format!("Task failed: {}", e))));
                }
            }
        }
        Ok(outcomes)
    }
}

impl ProcessingStrategy for ConcurrentStrategy {
    /// Run the script and write the account report
    ///
    /// Fatal errors (file not found, I/O errors, runtime errors) are returned
    /// immediately. Per-row failures are logged, counted and processing continues.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<RunSummary, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(num_cpus::get())
            .enable_all()
            .build()?;

        runtime.block_on(self.run(input_path, output))
    }
}
