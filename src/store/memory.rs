//! In-process transactional store
//!
//! `InMemoryStore` gives the transaction core the two primitives it relies on
//! from a real database: an exclusive per-row lock held for the lifetime of a
//! unit of work, and a version compare-and-swap applied at commit.
//!
//! # Design
//!
//! - Committed rows live in one `RwLock<Tables>`. A commit validates every
//!   staged conditional write and applies all of them, plus the ledger
//!   appends, under a single write guard, so readers never observe a balance
//!   without its ledger entry.
//! - Row locks are `tokio::sync::Mutex<()>` handles kept in a `DashMap`, one
//!   per account. `find_for_update` takes the lock and the unit keeps the
//!   owned guard until it commits, rolls back or is dropped.
//! - A commit also takes the row lock of every account it writes, so an
//!   optimistic writer waits for a pessimistic holder and then observes its
//!   version bump as a conflict.

use super::{AccountStore, Committed, LedgerStore, Store, StoreError, UnitOfWork};
use crate::types::{Account, AccountId, LedgerEntry, VersionConflict};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Store configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreConfig {
    /// Longest time a unit waits for a row lock; `None` waits indefinitely
    pub lock_timeout: Option<Duration>,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    ledger: HashMap<AccountId, Vec<LedgerEntry>>,
}

#[derive(Debug, Default)]
struct Shared {
    tables: RwLock<Tables>,
    row_locks: DashMap<AccountId, Arc<Mutex<()>>>,
    config: StoreConfig,
}

impl Shared {
    fn row_lock(&self, account_id: AccountId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.row_locks
                .entry(account_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn committed(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.accounts.get(&account_id).cloned())
    }
}

/// Thread-safe in-memory store
///
/// Cloning is cheap and clones share the same tables and locks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl InMemoryStore {
    /// Create an empty store with no lock timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                ..Shared::default()
            }),
        }
    }

    /// Committed account row, outside any unit of work
    pub fn account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        self.shared.committed(account_id)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Unit = InMemoryUnit;

    fn begin(&self) -> InMemoryUnit {
        InMemoryUnit {
            shared: Arc::clone(&self.shared),
            held: HashMap::new(),
            inserts: Vec::new(),
            writes: Vec::new(),
            entries: Vec::new(),
        }
    }

    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, StoreError> {
        let tables = self.shared.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.ledger.get(&account_id).cloned().unwrap_or_default())
    }
}

/// Unit of work over an [`InMemoryStore`]
///
/// Staged rows stay private to the unit until [`UnitOfWork::commit`].
#[derive(Debug)]
pub struct InMemoryUnit {
    shared: Arc<Shared>,
    /// Row locks held until the unit ends
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
    inserts: Vec<Account>,
    /// Conditional writes; each carries the version it was read at
    writes: Vec<Account>,
    entries: Vec<LedgerEntry>,
}

impl InMemoryUnit {
    /// Whether this unit currently holds the row lock of `account_id`
    pub fn holds_lock(&self, account_id: AccountId) -> bool {
        self.held.contains_key(&account_id)
    }

    async fn acquire(&mut self, account_id: AccountId) -> Result<(), StoreError> {
        if self.held.contains_key(&account_id) {
            return Ok(());
        }

        let lock = self.shared.row_lock(account_id);
        let guard = match self.shared.config.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, lock.lock_owned())
                .await
                .map_err(|_| StoreError::LockTimeout {
                    account_id,
                    waited: limit,
                })?,
            None => lock.lock_owned().await,
        };

        self.held.insert(account_id, guard);
        Ok(())
    }

    fn staged(&self, account_id: AccountId) -> Option<&Account> {
        self.writes
            .iter()
            .chain(self.inserts.iter())
            .find(|account| account.id == account_id)
    }

    /// Validate every staged row against the committed tables, then apply
    /// all of them, or none.
    fn apply(&mut self) -> Result<Committed, StoreError> {
        let mut tables = self.shared.tables.write().map_err(|_| StoreError::Poisoned)?;

        for account in &self.inserts {
            if tables.accounts.contains_key(&account.id) {
                return Err(StoreError::DuplicateKey {
                    account_id: account.id,
                });
            }
        }

        for account in &self.writes {
            let current = tables
                .accounts
                .get(&account.id)
                .ok_or(StoreError::MissingAccount {
                    account_id: account.id,
                })?;
            if current.version() != account.version() {
                return Err(VersionConflict {
                    account_id: account.id,
                    expected: account.version(),
                    actual: current.version(),
                }
                .into());
            }
        }

        for entry in &self.entries {
            let known = tables.accounts.contains_key(&entry.account_id)
                || self.inserts.iter().any(|a| a.id == entry.account_id);
            if !known {
                return Err(StoreError::MissingAccount {
                    account_id: entry.account_id,
                });
            }
        }

        let now = Utc::now();
        let mut accounts = Vec::with_capacity(self.inserts.len() + self.writes.len());

        for mut account in self.inserts.drain(..) {
            account.mark_committed(0, now);
            tables.accounts.insert(account.id, account.clone());
            accounts.push(account);
        }

        for mut account in self.writes.drain(..) {
            let next = account.version() + 1;
            account.mark_committed(next, now);
            tables.accounts.insert(account.id, account.clone());
            accounts.push(account);
        }

        let entries: Vec<LedgerEntry> = self.entries.drain(..).collect();
        for entry in &entries {
            tables
                .ledger
                .entry(entry.account_id)
                .or_default()
                .push(entry.clone());
        }

        Ok(Committed { accounts, entries })
    }
}

#[async_trait]
impl AccountStore for InMemoryUnit {
    async fn find_by_id(&mut self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        if let Some(account) = self.staged(account_id) {
            return Ok(Some(account.clone()));
        }
        self.shared.committed(account_id)
    }

    async fn find_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        // Rows are never deleted, so an absent row needs no lock.
        if self.staged(account_id).is_none() && self.shared.committed(account_id)?.is_none() {
            return Ok(None);
        }

        self.acquire(account_id).await?;
        debug!(account_id = %account_id, "row lock acquired");
        self.find_by_id(account_id).await
    }

    async fn insert(&mut self, account: Account) -> Result<(), StoreError> {
        if self.staged(account.id).is_some() {
            return Err(StoreError::DuplicateKey {
                account_id: account.id,
            });
        }
        self.inserts.push(account);
        Ok(())
    }

    async fn save(&mut self, account: Account) -> Result<(), StoreError> {
        // A row inserted by this unit has no committed version to check yet.
        if let Some(pending) = self.inserts.iter_mut().find(|a| a.id == account.id) {
            *pending = account;
            return Ok(());
        }

        match self.writes.iter_mut().find(|a| a.id == account.id) {
            Some(pending) => *pending = account,
            None => self.writes.push(account),
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryUnit {
    async fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        self.entries.push(entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnit {
    async fn commit(mut self) -> Result<Committed, StoreError> {
        let mut targets: Vec<AccountId> = self
            .inserts
            .iter()
            .chain(self.writes.iter())
            .map(|account| account.id)
            .collect();
        targets.sort_unstable();
        targets.dedup();

        for account_id in targets {
            self.acquire(account_id).await?;
        }

        self.apply()
    }

    async fn rollback(self) {
        debug!(
            staged_writes = self.writes.len() + self.inserts.len(),
            staged_entries = self.entries.len(),
            "unit of work rolled back"
        );
    }
}
