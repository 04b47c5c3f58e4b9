//! Script execution against the coordinator
//!
//! Shared by both processing strategies. Maps the owner labels used in a
//! script to the account identifiers assigned at opening time and turns each
//! script command into a coordinator call.

use crate::config::EngineConfig;
use crate::core::TransactionCoordinator;
use crate::io::{AccountReport, ScriptCommand, ScriptRecord};
use crate::store::InMemoryStore;
use crate::types::{
    AccountId, CurrencyCode, LedgerError, LockingMode, TransactionRequest,
};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

/// Runs script commands and remembers which label owns which account
pub struct ScriptRunner {
    coordinator: TransactionCoordinator<InMemoryStore>,
    /// Owner label to account identifier
    labels: DashMap<String, AccountId>,
    /// Locking mode for rows that do not name one
    default_locking: LockingMode,
}

impl ScriptRunner {
    /// Runner over a fresh in-memory store built from `config`
    pub fn new(config: &EngineConfig, default_locking: LockingMode) -> Self {
        let store = InMemoryStore::with_config(config.store.clone());
        Self {
            coordinator: TransactionCoordinator::from_config(store, config),
            labels: DashMap::new(),
            default_locking,
        }
    }

    pub fn coordinator(&self) -> &TransactionCoordinator<InMemoryStore> {
        &self.coordinator
    }

    /// Account identifier for `owner`
    ///
    /// Labels that were never opened get a fresh identifier, so the
    /// coordinator reports them as not found.
    pub fn resolve(&self, owner: &str) -> AccountId {
        self.labels
            .get(owner)
            .map(|entry| *entry.value())
            .unwrap_or_else(Uuid::now_v7)
    }

    /// Execute one script record; failures are logged and returned
    pub async fn run(&self, record: ScriptRecord) -> Result<(), LedgerError> {
        let line = record.line;
        let outcome = match record.command {
            ScriptCommand::Open {
                owner,
                currency,
                seed,
            } => self.open(line, owner, &currency, seed).await,
            ScriptCommand::Transact {
                owner,
                tx_type,
                amount,
                locking_mode,
                reason,
            } => {
                let request = TransactionRequest {
                    tx_type,
                    amount,
                    locking_mode: locking_mode.unwrap_or(self.default_locking),
                    reason,
                };
                self.coordinator
                    .execute_transaction(self.resolve(&owner), &request)
                    .await
                    .map(|_| ())
            }
        };

        if let Err(error) = &outcome {
            warn!(line, error = %error, "script row failed");
        }
        outcome
    }

    async fn open(
        &self,
        line: u64,
        owner: String,
        currency: &str,
        seed: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        if self.labels.contains_key(&owner) {
            return Err(LedgerError::ParseError {
                line: Some(line),
                message: format!("Account '{}' is opened more than once", owner),
            });
        }

        let currency = CurrencyCode::parse(currency)?;
        let opened = self.coordinator.open(&owner, currency, seed).await?;
        self.labels.insert(owner, opened.account.id);
        Ok(())
    }

    /// Final state of every opened account
    pub async fn report(&self) -> Result<Vec<AccountReport>, LedgerError> {
        let labels: Vec<(String, AccountId)> = self
            .labels
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        let mut reports = Vec::with_capacity(labels.len());
        for (owner, account_id) in labels {
            let account = self.coordinator.find(account_id).await?;
            let entries = self.coordinator.ledger(account_id).await?.len();
            reports.push(AccountReport {
                owner,
                currency: account.currency,
                balance: account.balance,
                version: account.version,
                entries,
            });
        }
        Ok(reports)
    }
}
