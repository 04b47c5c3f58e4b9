//! Ledger Engine Library
//! # Overview
//!
//! Monetary accounts with an append-only ledger. Concurrent deposits and
//! withdrawals never corrupt a balance, never drive it negative, and always
//! leave exactly one matching ledger entry.
//!
//! # Architecture
//!
//! - [`types`] - Accounts, ledger entries, requests, results and errors
//! - [`store`] - Unit-of-work storage traits and the in-memory backend
//! - [`core`] - Transaction execution:
//!   - [`core::coordinator`] - Entry point; strategy dispatch and retry loop
//!   - [`core::optimistic`] / [`core::pessimistic`] - One attempt under each discipline
//!   - [`core::mutator`] - Balance arithmetic
//!   - [`core::retry`] / [`core::jitter`] - Backoff and fault-injection delays
//! - [`config`] - Engine configuration
//! - [`io`] - Operation scripts and the account report
//! - [`strategy`] - Sequential and concurrent script execution
//! - [`cli`] - CLI arguments parsing
//! - [`telemetry`] - Tracing setup
//!
//! # Locking Modes
//!
//! - **Optimistic**: read without a lock, commit only if the version is
//!   unchanged, retry with backoff on conflict (5 attempts by default)
//! - **Pessimistic**: hold the account's row lock from read to commit; one attempt
//!
//! # Example
//!
//! ```no_run
//! use ledger_engine::store::InMemoryStore;
//! use ledger_engine::types::{CurrencyCode, LockingMode};
//! use ledger_engine::TransactionCoordinator;
//! use rust_decimal::Decimal;
//!
//! # async fn demo() -> Result<(), ledger_engine::LedgerError> {
//! let coordinator = TransactionCoordinator::new(InMemoryStore::new());
//! let opened = coordinator
//!     .open("Alice", CurrencyCode::parse("USD")?, Some(Decimal::new(100000, 2)))
//!     .await?;
//! let result = coordinator
//!     .deposit(opened.account.id, Decimal::new(20000, 2), LockingMode::Optimistic, None)
//!     .await?;
//! assert_eq!(result.account.balance, Decimal::new(120000, 2));
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod store;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use config::EngineConfig;
pub use crate::core::{JitterConfig, RetryPolicy, TransactionCoordinator};
pub use io::write_accounts_csv;
pub use store::{InMemoryStore, StoreConfig};
pub use types::{
    Account, AccountId, LedgerEntry, LedgerError, LockingMode, TransactionRequest,
    TransactionResult, TransactionType,
};
