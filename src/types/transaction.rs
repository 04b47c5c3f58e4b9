//! Transaction-related types for the Ledger Engine
//!
//! This module defines the operation types, ledger directions, locking modes
//! and the request shape accepted by the transaction coordinator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account identifier
///
/// Opaque, time-ordered UUID (v7) assigned when the account is opened.
pub type AccountId = Uuid;

/// Ledger entry identifier
///
/// Doubles as the transaction ID reported back to callers.
pub type EntryId = Uuid;

/// Balance-affecting operations supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Credit funds to an account
    Deposit,

    /// Debit funds from an account
    ///
    /// Requires the resulting balance to stay non-negative.
    Withdrawal,
}

impl TransactionType {
    /// Ledger direction recorded for this operation
    ///
    /// Deposits are always recorded as credits and withdrawals as debits.
    pub fn direction(self) -> Direction {
        match self {
            TransactionType::Deposit => Direction::Credit,
            TransactionType::Withdrawal => Direction::Debit,
        }
    }

    /// Lowercase operation name used in logs and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

/// Sign of a ledger entry
///
/// Ledger amounts are always non-negative magnitudes; the direction
/// carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Increases the balance
    Credit,
    /// Decreases the balance
    Debit,
}

impl From<TransactionType> for Direction {
    fn from(tx_type: TransactionType) -> Self {
        tx_type.direction()
    }
}

/// Concurrency-control discipline used for a single mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockingMode {
    /// Read without locking, detect lost updates through the version token
    /// and retry with backoff.
    #[default]
    Optimistic,

    /// Hold an exclusive row lock from read through commit. Never retried.
    Pessimistic,
}

/// Request accepted by [`crate::core::TransactionCoordinator::execute_transaction`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Deposit or withdrawal
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Positive amount with at most two decimal places
    pub amount: Decimal,

    /// Concurrency-control discipline for this request
    pub locking_mode: LockingMode,

    /// Free-text reason recorded on the ledger entry
    pub reason: Option<String>,
}

impl TransactionRequest {
    /// Build a deposit request
    pub fn deposit(amount: Decimal, locking_mode: LockingMode) -> Self {
        Self {
            tx_type: TransactionType::Deposit,
            amount,
            locking_mode,
            reason: None,
        }
    }

    /// Build a withdrawal request
    pub fn withdrawal(amount: Decimal, locking_mode: LockingMode) -> Self {
        Self {
            tx_type: TransactionType::Withdrawal,
            amount,
            locking_mode,
            reason: None,
        }
    }

    /// Attach a reason to the request
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
