//! Pessimistic executor
//!
//! Takes the exclusive row lock before reading, so the read-modify-write
//! cannot be interleaved with any other writer of the same account.

use super::executor::{AttemptError, Mutation, TransactionExecutor};
use super::mutator::BalanceMutator;
use crate::store::{AccountStore, LedgerStore, Store, UnitOfWork};
use crate::types::{LedgerEntry, LedgerError, TransactionResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Lock-holding single-attempt executor
pub struct PessimisticExecutor<S> {
    store: Arc<S>,
    mutator: BalanceMutator,
}

impl<S: Store> PessimisticExecutor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            mutator: BalanceMutator,
        }
    }

    /// Lock, mutate and stage; returns the staged ledger entry
    async fn stage(&self, unit: &mut S::Unit, mutation: &Mutation) -> Result<LedgerEntry, LedgerError> {
        let account = unit
            .find_for_update(mutation.account_id)
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
        Ok(entry)
    }
}

#[async_trait]
impl<S: Store> TransactionExecutor for PessimisticExecutor<S> {
    /// Never returns [`AttemptError::Conflict`]: the row lock rules out a
    /// concurrent committed write between read and commit.
    async fn attempt(&self, mutation: &Mutation) -> Result<TransactionResult, AttemptError> {
        debug!(
            account_id = %mutation.account_id,
            tx_type = mutation.tx_type.as_str(),
            amount = %mutation.amount,
            "pessimistic attempt"
        );

        let mut unit = self.store.begin();

        let entry = match self.stage(&mut unit, mutation).await {
            Ok(entry) => entry,
            Err(error) => {
                unit.rollback().await;
                return Err(AttemptError::Fatal(error));
            }
        };

        let committed = unit.commit().await.map_err(LedgerError::from)?;
        let account = committed.account(mutation.account_id).ok_or_else(|| {
            LedgerError::storage("commit did not return the written account")
        })?;

        Ok(TransactionResult::success(account, Some(&entry)))
    }
}
