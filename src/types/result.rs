//! Result returned by successful account operations

use super::account::{Account, AccountSnapshot};
use super::ledger::{LedgerEntry, LedgerEntrySnapshot};
use super::transaction::EntryId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome status. Failures are reported through `LedgerError`, so only
/// success is represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
}

/// Result of opening an account or executing a transaction
///
/// `ledger_entry` and `transaction_id` are absent only when an account is
/// opened without a seed deposit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    pub account: AccountSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_entry: Option<LedgerEntrySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<EntryId>,
}

impl TransactionResult {
    /// Assemble a success result from the committed account and its entry
    pub fn success(account: &Account, entry: Option<&LedgerEntry>) -> Self {
        TransactionResult {
            status: TransactionStatus::Success,
            timestamp: Utc::now(),
            account: account.snapshot(),
            ledger_entry: entry.map(LedgerEntry::snapshot),
            transaction_id: entry.map(|e| e.id),
        }
    }
}
