//! Ledger entry types
//!
//! Ledger entries are append-only: they are created once per committed
//! mutation and never updated or deleted.

use super::error::LedgerError;
use super::money::to_money;
use super::transaction::{AccountId, Direction, EntryId, TransactionType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Reason recorded on the credit written when an account is opened with a seed
pub const OPEN_ACCOUNT_SEED_REASON: &str = "OPEN_ACCOUNT_SEED";

/// Accepted reason length, in characters, for caller-supplied reasons
pub const REASON_LEN: std::ops::RangeInclusive<usize> = 3..=50;

/// Immutable record of one balance-affecting event
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub account_id: AccountId,
    pub direction: Direction,
    /// Non-negative magnitude; [`Direction`] carries the sign
    pub amount: Decimal,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build the entry recording `amount` moving through `account_id`
    pub fn record(
        account_id: AccountId,
        tx_type: TransactionType,
        amount: Decimal,
        reason: Option<String>,
    ) -> Self {
        LedgerEntry {
            id: Uuid::now_v7(),
            account_id,
            direction: tx_type.direction(),
            amount: to_money(amount.abs()),
            reason,
            created_at: Utc::now(),
        }
    }

    /// Signed contribution of this entry to the account balance
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }

    pub fn snapshot(&self) -> LedgerEntrySnapshot {
        LedgerEntrySnapshot {
            id: self.id,
            account_id: self.account_id,
            direction: self.direction,
            amount: self.amount,
            reason: self.reason.clone(),
            created_at: self.created_at,
        }
    }
}

/// Validate an optional caller-supplied reason
///
/// Blank reasons are treated as absent.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidReason`] if a non-blank reason is shorter
/// than 3 or longer than 50 characters.
pub fn validate_reason(reason: Option<&str>) -> Result<Option<String>, LedgerError> {
    match reason.map(str::trim) {
        None | Some("") => Ok(None),
        Some(reason) if REASON_LEN.contains(&reason.chars().count()) => {
            Ok(Some(reason.to_string()))
        }
        Some(reason) => Err(LedgerError::invalid_reason(reason)),
    }
}

/// Read-only ledger entry view returned by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntrySnapshot {
    pub id: EntryId,
    pub account_id: AccountId,
    pub direction: Direction,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
