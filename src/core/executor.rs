//! Strategy seam between the coordinator and the two concurrency disciplines

use crate::store::StoreError;
use crate::types::{
    AccountId, LedgerError, TransactionResult, TransactionType, VersionConflict,
};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// One validated balance change
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub account_id: AccountId,
    pub tx_type: TransactionType,
    /// Positive amount, scale 2
    pub amount: Decimal,
    pub reason: Option<String>,
}

/// Why a single attempt failed
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError {
    /// Another writer committed first; the attempt may be retried
    Conflict(VersionConflict),
    /// Anything else; propagated to the caller unchanged
    Fatal(LedgerError),
}

impl From<LedgerError> for AttemptError {
    fn from(error: LedgerError) -> Self {
        AttemptError::Fatal(error)
    }
}

impl From<StoreError> for AttemptError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::VersionConflict(conflict) => AttemptError::Conflict(conflict),
            other => AttemptError::Fatal(other.into()),
        }
    }
}

/// Executes exactly one attempt of a mutation inside its own unit of work
///
/// Implementations never loop; retrying is the coordinator's decision.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn attempt(&self, mutation: &Mutation) -> Result<TransactionResult, AttemptError>;
}
