//! Transaction coordinator
//!
//! Public entry point of the engine. It validates requests, picks the
//! executor for the requested locking mode, drives the optimistic retry loop
//! and opens accounts.
//!
//! # State machine
//!
//! ```text
//! OPTIMISTIC:  START -> NOT_FOUND | INSUFFICIENT_FUNDS
//!              START -> ATTEMPTING -(conflict)-> ATTEMPTING ... -> SUCCESS | CONFLICT_EXHAUSTED
//! PESSIMISTIC: START -> NOT_FOUND | INSUFFICIENT_FUNDS | SUCCESS
//! ```
//!
//! Every suspension point (backoff sleep, row-lock wait) is cancel-safe:
//! dropping the returned future drops the open unit of work, which discards
//! its staged writes and releases its locks.

use super::executor::{AttemptError, Mutation, TransactionExecutor};
use super::jitter::{with_jitter, JitterConfig};
use super::mutator::BalanceMutator;
use super::optimistic::OptimisticExecutor;
use super::pessimistic::PessimisticExecutor;
use super::retry::RetryPolicy;
use crate::config::EngineConfig;
use crate::store::{AccountStore, LedgerStore, Store, UnitOfWork};
use crate::types::ledger::validate_reason;
use crate::types::money::{validate_amount, validate_seed};
use crate::types::{
    Account, AccountId, AccountSnapshot, CurrencyCode, Direction, LedgerEntry, LedgerError,
    LockingMode, TransactionRequest, TransactionResult, TransactionType,
    OPEN_ACCOUNT_SEED_REASON,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinates account operations over a [`Store`]
pub struct TransactionCoordinator<S: Store> {
    store: Arc<S>,
    optimistic: OptimisticExecutor<S>,
    pessimistic: PessimisticExecutor<S>,
    mutator: BalanceMutator,
    retry: RetryPolicy,
    jitter: JitterConfig,
}

impl<S: Store> TransactionCoordinator<S> {
    /// Coordinator with the default retry policy and jitter disabled
    pub fn new(store: S) -> Self {
        Self::with_policies(store, RetryPolicy::default(), JitterConfig::default())
    }

    /// Coordinator using the retry and jitter settings of `config`
    pub fn from_config(store: S, config: &EngineConfig) -> Self {
        Self::with_policies(store, config.retry.clone(), config.jitter.clone())
    }

    pub fn with_policies(store: S, retry: RetryPolicy, jitter: JitterConfig) -> Self {
        let store = Arc::new(store);
        Self {
            optimistic: OptimisticExecutor::new(Arc::clone(&store)),
            pessimistic: PessimisticExecutor::new(Arc::clone(&store)),
            store,
            mutator: BalanceMutator,
            retry,
            jitter,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open an account, optionally seeded with an initial credit
    ///
    /// The account row and the seed entry are written in one unit of work. A
    /// zero or absent seed writes no ledger entry.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidOwner`] for an owner name of the wrong length or alphabet
    /// - [`LedgerError::InvalidAmount`] for a negative or malformed seed
    pub async fn open(
        &self,
        owner_name: &str,
        currency: CurrencyCode,
        seed: Option<Decimal>,
    ) -> Result<TransactionResult, LedgerError> {
        let seed = seed.map(validate_seed).transpose()?.filter(|s| *s > Decimal::ZERO);
        let account = Account::open(owner_name, currency)?;
        let account_id = account.id;

        let mut unit = self.store.begin();
        unit.insert(account.clone()).await?;

        let entry = match seed {
            Some(seed) => {
                let seeded = self.mutator.apply(&account, Direction::Credit, seed)?;
                unit.save(seeded).await?;
                let entry = unit
                    .append(LedgerEntry::record(
                        account_id,
                        TransactionType::Deposit,
                        seed,
                        Some(OPEN_ACCOUNT_SEED_REASON.to_string()),
                    ))
                    .await?;
                Some(entry)
            }
            None => None,
        };

        let committed = unit.commit().await?;
        let account = committed
            .account(account_id)
            .ok_or_else(|| LedgerError::storage("commit did not return the opened account"))?;

        info!(
            account_id = %account_id,
            owner = %account.owner_name,
            currency = %account.currency,
            balance = %account.balance(),
            "account opened"
        );

        Ok(TransactionResult::success(account, entry.as_ref()))
    }

    /// Current committed state of an account
    pub async fn find(&self, account_id: AccountId) -> Result<AccountSnapshot, LedgerError> {
        debug!(account_id = %account_id, "find account");
        let mut unit = self.store.begin();
        unit.find_by_id(account_id)
            .await?
            .map(|account| account.snapshot())
            .ok_or_else(|| LedgerError::not_found(account_id))
    }

    /// Committed ledger entries of an account, oldest first
    pub async fn ledger(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.find(account_id).await?;
        Ok(self.store.entries_for(account_id).await?)
    }

    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        locking_mode: LockingMode,
        reason: Option<&str>,
    ) -> Result<TransactionResult, LedgerError> {
        self.execute(account_id, TransactionType::Deposit, amount, locking_mode, reason)
            .await
    }

    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount: Decimal,
        locking_mode: LockingMode,
        reason: Option<&str>,
    ) -> Result<TransactionResult, LedgerError> {
        self.execute(account_id, TransactionType::Withdrawal, amount, locking_mode, reason)
            .await
    }

    /// Execute a request as received from a caller
    pub async fn execute_transaction(
        &self,
        account_id: AccountId,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, LedgerError> {
        self.execute(
            account_id,
            request.tx_type,
            request.amount,
            request.locking_mode,
            request.reason.as_deref(),
        )
        .await
    }

    /// Apply one deposit or withdrawal under the given locking mode
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] / [`LedgerError::InvalidReason`] before any attempt
    /// - [`LedgerError::NotFound`] and [`LedgerError::InsufficientFunds`], never retried
    /// - [`LedgerError::ConflictExhausted`] once every optimistic attempt lost a race
    /// - [`LedgerError::LockTimeout`] if the row lock could not be acquired in time
    pub async fn execute(
        &self,
        account_id: AccountId,
        tx_type: TransactionType,
        amount: Decimal,
        locking_mode: LockingMode,
        reason: Option<&str>,
    ) -> Result<TransactionResult, LedgerError> {
        let mutation = Mutation {
            account_id,
            tx_type,
            amount: validate_amount(amount)?,
            reason: validate_reason(reason)?,
        };

        match locking_mode {
            LockingMode::Pessimistic => match self.pessimistic.attempt(&mutation).await {
                Ok(result) => Ok(result),
                Err(AttemptError::Fatal(error)) => Err(error),
                // A held row lock rules out a legitimate conflict.
                Err(AttemptError::Conflict(conflict)) => {
                    Err(LedgerError::storage(conflict.to_string()))
                }
            },
            LockingMode::Optimistic => self.execute_optimistic(&mutation).await,
        }
    }

    async fn execute_optimistic(&self, mutation: &Mutation) -> Result<TransactionResult, LedgerError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = with_jitter(&self.jitter, self.optimistic.attempt(mutation)).await;
            let conflict = match outcome {
                Ok(result) => return Ok(result),
                Err(AttemptError::Fatal(error)) => return Err(error),
                Err(AttemptError::Conflict(conflict)) => conflict,
            };

            warn!(
                account_id = %mutation.account_id,
                tx_type = mutation.tx_type.as_str(),
                amount = %mutation.amount,
                attempt,
                expected_version = conflict.expected,
                actual_version = conflict.actual,
                "optimistic lock conflict"
            );

            if attempt >= max_attempts {
                warn!(
                    account_id = %mutation.account_id,
                    attempts = attempt,
                    "giving up after repeated conflicts"
                );
                return Err(LedgerError::conflict_exhausted(attempt, conflict));
            }

            tokio::time::sleep(self.retry.delay(attempt)).await;
        }
    }
}
