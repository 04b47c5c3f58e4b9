//! Account-related types for the Ledger Engine
//!
//! This module defines the Account record and the snapshot handed back to
//! callers.

use super::error::LedgerError;
use super::money::{to_money, CurrencyCode};
use super::transaction::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Accepted owner name length in characters, after trimming
pub const OWNER_LEN: std::ops::RangeInclusive<usize> = 2..=100;

/// Monetary account
///
/// The balance is only changed through [`crate::core::BalanceMutator`] and the
/// version is only changed by the store when a write commits, so neither has a
/// public setter.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Opaque unique identifier
    pub id: AccountId,

    /// Account holder's name
    pub owner_name: String,

    /// Currency the balance is held in
    pub currency: CurrencyCode,

    /// Current balance with two decimal places, never negative once committed
    balance: Decimal,

    /// Version token used for optimistic conflict detection
    ///
    /// Starts at 0 when the account is inserted and increases by exactly one
    /// on every committed update.
    version: u64,

    /// When the account row was last written
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new, not yet persisted account with a zero balance
    ///
    /// # Arguments
    ///
    /// * `owner_name` - Account holder; trimmed, 2-100 ASCII letters, spaces, hyphens or apostrophes
    /// * `currency` - Currency of the account
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidOwner`] if the owner name has the wrong
    /// length or contains any other character.
    pub fn open(owner_name: &str, currency: CurrencyCode) -> Result<Self, LedgerError> {
        let owner_name = owner_name.trim();
        if !is_valid_owner(owner_name) {
            return Err(LedgerError::invalid_owner(owner_name));
        }

        Ok(Account {
            id: Uuid::now_v7(),
            owner_name: owner_name.to_string(),
            currency,
            balance: to_money(Decimal::ZERO),
            version: 0,
            updated_at: Utc::now(),
        })
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the in-memory balance. Only the balance mutator calls this.
    pub(crate) fn set_balance(&mut self, balance: Decimal) {
        self.balance = to_money(balance);
    }

    /// Mark the row as committed: bump the version and stamp the write time.
    /// Only the store calls this.
    pub(crate) fn mark_committed(&mut self, version: u64, at: DateTime<Utc>) {
        self.version = version;
        self.updated_at = at;
    }

    /// Snapshot of the account for callers
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.id,
            owner_name: self.owner_name.clone(),
            currency: self.currency.to_string(),
            balance: self.balance,
            version: self.version,
            updated_at: self.updated_at,
        }
    }
}

/// Read-only account view returned by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub owner_name: String,
    pub currency: String,
    pub balance: Decimal,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

fn is_valid_owner(owner_name: &str) -> bool {
    OWNER_LEN.contains(&owner_name.chars().count())
        && owner_name
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
}
