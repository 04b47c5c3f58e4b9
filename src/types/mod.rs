//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account record and snapshot
//! - `ledger`: Ledger entries and reason validation
//! - `money`: Amount validation and currency codes
//! - `transaction`: Operation types, locking modes, identifiers and requests
//! - `result`: Success result returned to callers
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod error;
pub mod ledger;
pub mod money;
pub mod result;
pub mod transaction;

pub use account::{Account, AccountSnapshot};
pub use error::{LedgerError, VersionConflict};
pub use ledger::{LedgerEntry, LedgerEntrySnapshot, OPEN_ACCOUNT_SEED_REASON};
pub use money::{CurrencyCode, MAX_AMOUNT};
pub use result::{TransactionResult, TransactionStatus};
pub use transaction::{
    AccountId, Direction, EntryId, LockingMode, TransactionRequest, TransactionType,
};
