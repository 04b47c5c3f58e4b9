//! Storage collaborators
//!
//! The transaction core never touches storage directly. It talks to a [`Store`]
//! that hands out [`UnitOfWork`]s: atomic units that stage account and ledger
//! writes and make them visible together on commit, or not at all.
//!
//! - `AccountStore` - plain lookup, lookup-with-exclusive-lock, insert and
//!   version-checked save
//! - `LedgerStore` - append-only ledger writes
//! - `memory` - in-process implementation with row locks and a version
//!   compare-and-swap at commit

pub mod memory;

use crate::types::{Account, AccountId, LedgerEntry, LedgerError, VersionConflict};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use memory::{InMemoryStore, InMemoryUnit, StoreConfig};

/// Errors reported by a store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A version-checked write found a different committed version
    #[error(transparent)]
    VersionConflict(#[from] VersionConflict),

    /// The exclusive row lock could not be acquired in time
    #[error("Timed out after {waited:?} waiting for the row lock on account {account_id}")]
    LockTimeout {
        account_id: AccountId,
        waited: Duration,
    },

    /// Insert of an identifier that already exists
    #[error("Account {account_id} already exists")]
    DuplicateKey { account_id: AccountId },

    /// Write or ledger append referencing an account that does not exist
    #[error("Account {account_id} does not exist")]
    MissingAccount { account_id: AccountId },

    /// Internal state lock was poisoned by a panicking writer
    #[error("Store state is poisoned")]
    Poisoned,
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::LockTimeout { account_id, waited } => {
                LedgerError::lock_timeout(account_id, waited)
            }
            StoreError::MissingAccount { account_id } => LedgerError::not_found(account_id),
            other => LedgerError::storage(other.to_string()),
        }
    }
}

/// Rows made visible by a successful commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Committed {
    /// Account rows as stored, with their new versions
    pub accounts: Vec<Account>,
    /// Ledger entries appended by the unit
    pub entries: Vec<LedgerEntry>,
}

impl Committed {
    /// Committed row for `account_id`, if the unit wrote it
    pub fn account(&self, account_id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == account_id)
    }
}

/// Account persistence inside a unit of work
#[async_trait]
pub trait AccountStore: Send {
    /// Plain lookup without taking any lock
    async fn find_by_id(&mut self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Lookup that first takes the exclusive row lock for the rest of the unit
    async fn find_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError>;

    /// Stage a new account row
    async fn insert(&mut self, account: Account) -> Result<(), StoreError>;

    /// Stage a version-checked write
    ///
    /// The write only commits if the stored version still equals
    /// `account.version()`, i.e. the version that was read. Otherwise the
    /// commit fails with [`StoreError::VersionConflict`].
    async fn save(&mut self, account: Account) -> Result<(), StoreError>;
}

/// Ledger persistence inside a unit of work. Entries are never updated or deleted.
#[async_trait]
pub trait LedgerStore: Send {
    /// Stage a ledger entry; it becomes visible with the rest of the unit
    async fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError>;
}

/// Atomic unit of work over accounts and the ledger
///
/// Dropping a unit without committing behaves like [`UnitOfWork::rollback`].
#[async_trait]
pub trait UnitOfWork: AccountStore + LedgerStore + Send {
    /// Apply every staged write atomically and release held locks
    async fn commit(self) -> Result<Committed, StoreError>;

    /// Discard every staged write and release held locks
    async fn rollback(self);
}

/// Transactional storage backend
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Unit: UnitOfWork + 'static;

    /// Start a new unit of work
    fn begin(&self) -> Self::Unit;

    /// Committed ledger entries of an account, in commit order
    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, StoreError>;
}
