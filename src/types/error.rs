//! Error types for the Ledger Engine
//!
//! This module defines every error the engine can surface to callers, plus the
//! version-conflict signal that stays inside the transaction coordinator.
//!
//! # Error Categories
//!
//! - **Business rejections**: account not found, insufficient funds (terminal, never retried)
//! - **Concurrency**: retries exhausted, lock wait timed out (terminal)
//! - **Validation**: invalid amount, currency, owner name or reason
//! - **Storage / I/O**: store failures, CSV script parsing, file access

use super::transaction::AccountId;
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

/// A conditional account write lost the race against another committed writer
///
/// This is the only retryable failure. It never escapes the coordinator on its
/// own; once retries are exhausted it is wrapped in
/// [`LedgerError::ConflictExhausted`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Version conflict on account {account_id}: expected version {expected}, found {actual}")]
pub struct VersionConflict {
    /// Account whose row changed between read and commit
    pub account_id: AccountId,
    /// Version the writer read
    pub expected: u64,
    /// Version committed by the competing writer
    pub actual: u64,
}

/// Main error type for the ledger engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Account identifier is unknown
    ///
    /// Terminal, never retried.
    #[error("Account not found with id: {account_id}")]
    NotFound {
        /// The identifier that was looked up
        account_id: AccountId,
    },

    /// A debit would drive the balance negative
    ///
    /// Terminal, never retried. The account and ledger are unchanged.
    #[error("Insufficient funds in account {account_id}. Requested: {requested}, Available: {available}")]
    InsufficientFunds {
        account_id: AccountId,
        /// Amount the caller tried to withdraw
        requested: Decimal,
        /// Balance at the time of the attempt
        available: Decimal,
    },

    /// Optimistic retries ran out
    ///
    /// Distinct from a plain version conflict: the caller knows every allowed
    /// attempt was made and lost.
    #[error("Gave up on account {account_id} after {attempts} conflicting attempts")]
    ConflictExhausted {
        account_id: AccountId,
        /// Number of attempts made, including the first
        attempts: u32,
        /// The conflict reported by the final attempt
        #[source]
        last: VersionConflict,
    },

    /// Waiting for the exclusive row lock took longer than the configured timeout
    ///
    /// Terminal, never retried. Nothing was written.
    #[error("Timed out after {waited:?} waiting for the lock on account {account_id}")]
    LockTimeout {
        account_id: AccountId,
        waited: Duration,
    },

    /// Amount rejected by validation
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: Decimal, reason: String },

    /// Currency code is not three uppercase letters
    #[error("Invalid currency code '{code}': expected a 3-letter code such as USD")]
    InvalidCurrency { code: String },

    /// Owner name has the wrong length or contains characters other than
    /// letters, spaces, hyphens and apostrophes
    #[error("Invalid owner name '{owner}'")]
    InvalidOwner { owner: String },

    /// Reason is outside the accepted length
    #[error("Invalid reason '{reason}': must be 3-50 characters")]
    InvalidReason { reason: String },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for account {account_id}")]
    ArithmeticOverflow {
        operation: String,
        account_id: AccountId,
    },

    /// Backing store failed for a reason other than a version conflict
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Script file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },
}

// Conversion from io::Error to LedgerError
impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to LedgerError
impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a NotFound error
    pub fn not_found(account_id: AccountId) -> Self {
        LedgerError::NotFound { account_id }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account_id: AccountId, requested: Decimal, available: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account_id,
            requested,
            available,
        }
    }

    /// Create a ConflictExhausted error wrapping the last conflict
    pub fn conflict_exhausted(attempts: u32, last: VersionConflict) -> Self {
        LedgerError::ConflictExhausted {
            account_id: last.account_id,
            attempts,
            last,
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(account_id: AccountId, waited: Duration) -> Self {
        LedgerError::LockTimeout { account_id, waited }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, reason: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidCurrency error
    pub fn invalid_currency(code: &str) -> Self {
        LedgerError::InvalidCurrency {
            code: code.to_string(),
        }
    }

    /// Create an InvalidOwner error
    pub fn invalid_owner(owner: &str) -> Self {
        LedgerError::InvalidOwner {
            owner: owner.to_string(),
        }
    }

    /// Create an InvalidReason error
    pub fn invalid_reason(reason: &str) -> Self {
        LedgerError::InvalidReason {
            reason: reason.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account_id: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account_id,
        }
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage {
            message: message.into(),
        }
    }

    /// Whether this error is a business rejection rather than an infrastructure failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::NotFound { .. }
                | LedgerError::InsufficientFunds { .. }
                | LedgerError::InvalidAmount { .. }
                | LedgerError::InvalidCurrency { .. }
                | LedgerError::InvalidOwner { .. }
                | LedgerError::InvalidReason { .. }
        )
    }
}
