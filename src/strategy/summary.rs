//! Per-run outcome counters

use crate::types::LedgerError;
use tracing::info;

/// How every script row ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub not_found: usize,
    pub insufficient_funds: usize,
    pub conflicts_exhausted: usize,
    pub lock_timeouts: usize,
    /// Validation failures (amount, currency, owner, reason)
    pub rejected: usize,
    /// Rows that could not be parsed
    pub malformed: usize,
    /// Storage or arithmetic failures
    pub failed: usize,
}

impl RunSummary {
    /// Count one row outcome
    pub fn record(&mut self, outcome: &Result<(), LedgerError>) {
        let counter = match outcome {
            Ok(()) => &mut self.succeeded,
            Err(LedgerError::NotFound { .. }) => &mut self.not_found,
            Err(LedgerError::InsufficientFunds { .. }) => &mut self.insufficient_funds,
            Err(LedgerError::ConflictExhausted { .. }) => &mut self.conflicts_exhausted,
            Err(LedgerError::LockTimeout { .. }) => &mut self.lock_timeouts,
            Err(LedgerError::ParseError { .. }) => &mut self.malformed,
            Err(error) if error.is_rejection() => &mut self.rejected,
            Err(_) => &mut self.failed,
        };
        *counter += 1;
    }

    pub fn total(&self) -> usize {
        self.succeeded
            + self.not_found
            + self.insufficient_funds
            + self.conflicts_exhausted
            + self.lock_timeouts
            + self.rejected
            + self.malformed
            + self.failed
    }

    pub fn log(&self) {
        info!(
            total = self.total(),
            succeeded = self.succeeded,
            not_found = self.not_found,
            insufficient_funds = self.insufficient_funds,
            conflicts_exhausted = self.conflicts_exhausted,
            lock_timeouts = self.lock_timeouts,
            rejected = self.rejected,
            malformed = self.malformed,
            failed = self.failed,
            "script run finished"
        );
    }
}
