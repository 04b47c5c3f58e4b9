//! Store wrappers that make contention deterministic
//!
//! - `GatedStore` holds the first N plain reads at a barrier, so concurrent
//!   optimistic writers are guaranteed to read the same version.
//! - `ConflictingStore` reports a version conflict on every commit that
//!   writes an account.

#![allow(dead_code)]

use async_trait::async_trait;
use ledger_engine::store::{
    AccountStore, Committed, InMemoryStore, InMemoryUnit, LedgerStore, Store, StoreError,
    UnitOfWork,
};
use ledger_engine::types::{Account, AccountId, CurrencyCode, LedgerEntry, VersionConflict};
use ledger_engine::TransactionCoordinator;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn usd() -> CurrencyCode {
    CurrencyCode::parse("USD").unwrap()
}

/// Open an account and return its identifier
pub async fn open_account<S: Store>(
    coordinator: &TransactionCoordinator<S>,
    owner: &str,
    seed: Option<&str>,
) -> AccountId {
    coordinator
        .open(owner, usd(), seed.map(dec))
        .await
        .unwrap()
        .account
        .id
}

/// Shared call counters
#[derive(Debug, Default)]
pub struct Counters {
    pub reads: AtomicUsize,
    pub commits: AtomicUsize,
}

impl Counters {
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------

pub struct GatedStore {
    inner: InMemoryStore,
    barrier: Arc<Barrier>,
    gated_reads: usize,
    pub counters: Arc<Counters>,
}

impl GatedStore {
    /// Gate the first `parties` plain reads at one barrier
    ///
    /// Opening an account does no plain read, so gating covers the first
    /// reads made by transactions.
    pub fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryStore::new(),
            barrier: Arc::new(Barrier::new(parties)),
            gated_reads: parties,
            counters: Arc::new(Counters::default()),
        }
    }
}

pub struct GatedUnit {
    inner: InMemoryUnit,
    barrier: Arc<Barrier>,
    gated_reads: usize,
    counters: Arc<Counters>,
}

#[async_trait]
impl Store for GatedStore {
    type Unit = GatedUnit;

    fn begin(&self) -> GatedUnit {
        GatedUnit {
            inner: self.inner.begin(),
            barrier: Arc::clone(&self.barrier),
            gated_reads: self.gated_reads,
            counters: Arc::clone(&self.counters),
        }
    }

    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, StoreError> {
        self.inner.entries_for(account_id).await
    }
}

#[async_trait]
impl AccountStore for GatedUnit {
    async fn find_by_id(&mut self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let account = self.inner.find_by_id(account_id).await?;
        let read = self.counters.reads.fetch_add(1, Ordering::SeqCst);
        if read < self.gated_reads {
            self.barrier.wait().await;
        }
        Ok(account)
    }

    async fn find_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        self.inner.find_for_update(account_id).await
    }

    async fn insert(&mut self, account: Account) -> Result<(), StoreError> {
        self.inner.insert(account).await
    }

    async fn save(&mut self, account: Account) -> Result<(), StoreError> {
        self.inner.save(account).await
    }
}

#[async_trait]
impl LedgerStore for GatedUnit {
    async fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        self.inner.append(entry).await
    }
}

#[async_trait]
impl UnitOfWork for GatedUnit {
    async fn commit(self) -> Result<Committed, StoreError> {
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }

    async fn rollback(self) {
        self.inner.rollback().await
    }
}

// ---------------------------------------------------------------------------

/// Commits that only insert (account opening) pass through unchanged
#[derive(Default)]
pub struct ConflictingStore {
    inner: InMemoryStore,
    pub counters: Arc<Counters>,
}

impl ConflictingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct ConflictingUnit {
    inner: InMemoryUnit,
    counters: Arc<Counters>,
    last_read: Option<Account>,
    writes: bool,
}

#[async_trait]
impl Store for ConflictingStore {
    type Unit = ConflictingUnit;

    fn begin(&self) -> ConflictingUnit {
        ConflictingUnit {
            inner: self.inner.begin(),
            counters: Arc::clone(&self.counters),
            last_read: None,
            writes: false,
        }
    }

    async fn entries_for(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, StoreError> {
        self.inner.entries_for(account_id).await
    }
}

#[async_trait]
impl AccountStore for ConflictingUnit {
    async fn find_by_id(&mut self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let account = self.inner.find_by_id(account_id).await?;
        self.last_read = account.clone();
        Ok(account)
    }

    async fn find_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        let account = self.inner.find_for_update(account_id).await?;
        self.last_read = account.clone();
        Ok(account)
    }

    async fn insert(&mut self, account: Account) -> Result<(), StoreError> {
        self.inner.insert(account).await
    }

    async fn save(&mut self, account: Account) -> Result<(), StoreError> {
        self.writes = self.last_read.is_some();
        self.inner.save(account).await
    }
}

#[async_trait]
impl LedgerStore for ConflictingUnit {
    async fn append(&mut self, entry: LedgerEntry) -> Result<LedgerEntry, StoreError> {
        self.inner.append(entry).await
    }
}

#[async_trait]
impl UnitOfWork for ConflictingUnit {
    async fn commit(self) -> Result<Committed, StoreError> {
        match (self.writes, self.last_read) {
            (true, Some(read)) => {
                self.counters.commits.fetch_add(1, Ordering::SeqCst);
                self.inner.rollback().await;
                Err(VersionConflict {
                    account_id: read.id,
                    expected: read.version(),
                    actual: read.version() + 1,
                }
                .into())
            }
            _ => self.inner.commit().await,
        }
    }

    async fn rollback(self) {
        self.inner.rollback().await
    }
}
