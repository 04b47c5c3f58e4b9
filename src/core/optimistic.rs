//! Optimistic executor
//!
//! Reads the account without a lock and lets the store's version check at
//! commit decide whether the write wins.

use super::executor::{AttemptError, Mutation, TransactionExecutor};
use super::mutator::BalanceMutator;
use crate::store::{AccountStore, LedgerStore, Store, UnitOfWork};
use crate::types::{LedgerEntry, LedgerError, TransactionResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Lock-free single-attempt executor
pub struct OptimisticExecutor<S> {
    store: Arc<S>,
    mutator: BalanceMutator,
}

impl<S: Store> OptimisticExecutor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            mutator: BalanceMutator,
        }
    }
}

#[async_trait]
impl<S: Store> TransactionExecutor for OptimisticExecutor<S> {
    /// # Errors
    ///
    /// - `Fatal(NotFound)` / `Fatal(InsufficientFunds)` for business rejections
    /// - `Conflict` if another writer committed the account after it was read
    async fn attempt(&self, mutation: &Mutation) -> Result<TransactionResult, AttemptError> {
        debug!(
            account_id = %mutation.account_id,
            tx_type = mutation.tx_type.as_str(),
            amount = %mutation.amount,
            "optimistic attempt"
        );

        // Dropping the unit on an early return discards everything staged.
        let mut unit = self.store.begin();

        let account = unit
            .find_by_id(mutation.account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(mutation.account_id))?;

        let updated = self
            .mutator
            .apply(&account, mutation.tx_type.direction(), mutation.amount)?;

        unit.save(updated).await?;
        let entry = unit
            .append(LedgerEntry::record(
                mutation.account_id,
                mutation.tx_type,
                mutation.amount,
                mutation.reason.clone(),
            ))
            .await?;

        let committed = unit.commit().await?;
        let account = committed.account(mutation.account_id).ok_or_else(|| {
            LedgerError::storage("commit did not return the written account")
        })?;

        Ok(TransactionResult::success(account, Some(&entry)))
    }
}
