//! Transaction execution core
//!
//! - `coordinator` - Public entry point; dispatches on locking mode and drives retries
//! - `executor` - Single-attempt executor trait shared by both disciplines
//! - `optimistic` - Lock-free attempt relying on the store's version check
//! - `pessimistic` - Attempt holding the exclusive row lock
//! - `mutator` - Pure balance arithmetic
//! - `retry` - Backoff between optimistic attempts
//! - `jitter` - Optional scheduling delay around optimistic attempts

pub mod coordinator;
pub mod executor;
pub mod jitter;
pub mod mutator;
pub mod optimistic;
pub mod pessimistic;
pub mod retry;

pub use coordinator::TransactionCoordinator;
pub use executor::{AttemptError, Mutation, TransactionExecutor};
pub use jitter::{with_jitter, JitterConfig};
pub use mutator::BalanceMutator;
pub use optimistic::OptimisticExecutor;
pub use pessimistic::PessimisticExecutor;
pub use retry::RetryPolicy;
