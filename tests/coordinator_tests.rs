//! Coordinator integration tests
//!
//! Exercise the public coordinator API end to end over the in-memory store:
//! the account scenarios, the balance/ledger invariants, retry bounds,
//! atomicity, lock timeouts and cancellation.

mod support;

use ledger_engine::core::{JitterConfig, RetryPolicy};
use ledger_engine::store::{AccountStore, InMemoryStore, Store, StoreConfig};
use ledger_engine::types::OPEN_ACCOUNT_SEED_REASON;
use ledger_engine::types::{Direction, LedgerError, LockingMode, TransactionType};
use ledger_engine::TransactionCoordinator;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use support::{dec, open_account, usd, ConflictingStore, GatedStore};

/// Check balance == sum of signed entries and version == mutations after opening
async fn assert_consistent<S: Store>(coordinator: &TransactionCoordinator<S>, account_id: uuid::Uuid) {
    let account = coordinator.find(account_id).await.unwrap();
    let entries = coordinator.ledger(account_id).await.unwrap();

    let sum: Decimal = entries.iter().map(|entry| entry.signed_amount()).sum();
    assert_eq!(account.balance, sum, "balance must equal the ledger sum");
    assert!(account.balance >= Decimal::ZERO, "balance must never be negative");

    let seeded = entries
        .first()
        .and_then(|entry| entry.reason.as_deref())
        .is_some_and(|reason| reason == OPEN_ACCOUNT_SEED_REASON);
    let mutations = entries.len() - usize::from(seeded);
    assert_eq!(account.version, mutations as u64, "one version bump per committed mutation");
}

#[tokio::test]
async fn test_open_with_seed() {
    let coordinator = TransactionCoordinator::new(InMemoryStore::new());

    let opened = coordinator
        .open("Alice", usd(), Some(dec("1000.00")))
        .await
        .unwrap();

    assert_eq!(opened.account.balance, dec("1000.00"));
    let entries = coordinator.ledger(opened.account.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].direction, Direction::Credit);
    assert_eq!(entries[0].amount, dec("1000.00"));
    assert_consistent(&coordinator, opened.account.id).await;
}

#[tokio::test]
async fn test_open_without_seed() {
    let coordinator = TransactionCoordinator::new(InMemoryStore::new());

    let opened = coordinator
        .open("Bob", ledger_engine::types::CurrencyCode::parse("EUR").unwrap(), None)
        .await
        .unwrap();

    assert_eq!(opened.account.balance.to_string(), "0.00");
    assert_eq!(opened.account.currency, "EUR");
    assert!(coordinator.ledger(opened.account.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_optimistic_deposit() {
    let coordinator = TransactionCoordinator::new(InMemoryStore::new());
    let id = open_account(&coordinator, "Alice", Some("1000.00")).await;
    let before = coordinator.find(id).await.unwrap();

    let result = coordinator
        .deposit(id, dec("200.00"), LockingMode::Optimistic, Some("salary"))
        .await
        .unwrap();

    assert_eq!(result.account.balance, dec("1200.00"));
    assert_eq!(result.account.version, before.version + 1);
    let entry = result.ledger_entry.unwrap();
    assert_eq!(entry.direction, Direction::Credit);
    assert_eq!(entry.amount, dec("200.00"));
    assert_eq!(result.transaction_id, Some(entry.id));
    assert_eq!(coordinator.ledger(id).await.unwrap().len(), 2);
    assert_consistent(&coordinator, id).await;
}

#[tokio::test]
async fn test_pessimistic_overdraft_is_rejected() {
    let coordinator = TransactionCoordinator::new(InMemoryStore::new());
    let id = open_account(&coordinator, "Alice", Some("1000.00")).await;

    let error = coordinator
        .withdraw(id, dec("1500.00"), LockingMode::Pessimistic, None)
        .await
        .unwrap_err();

    assert_eq!(
        error,
        LedgerError::insufficient_funds(id, dec("1500.00"), dec("1000.00"))
    );
    let account = coordinator.find(id).await.unwrap();
    assert_eq!(account.balance, dec("1000.00"));
    assert_eq!(account.version, 0);
    assert_eq!(coordinator.ledger(id).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_racing_optimistic_deposits_both_succeed() {
    let store = GatedStore::new(2);
    let counters = Arc::clone(&store.counters);
    let coordinator = TransactionCoordinator::new(store);
    let id = open_account(&coordinator, "Alice", Some("1000.00")).await;
    let opening_commits = counters.commits();

    let (first, second) = tokio::join!(
        coordinator.deposit(id, dec("100.00"), LockingMode::Optimistic, None),
        coordinator.deposit(id, dec("100.00"), LockingMode::Optimistic, None),
    );

    let first = first.unwrap();
    let second = second.unwrap();
    let mut versions = vec![first.account.version, second.account.version];
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2]);

    // Both read version 0; the loser retried exactly once.
    assert_eq!(counters.commits() - opening_commits, 3);

    let account = coordinator.find(id).await.unwrap();
    assert_eq!(account.balance, dec("1200.00"));
    assert_eq!(account.version, 2);
    assert_eq!(coordinator.ledger(id).await.unwrap().len(), 3);
    assert_consistent(&coordinator, id).await;
}

#[tokio::test(start_paused = true)]
async fn test_retry_bound_is_exactly_five_attempts() {
    let store = ConflictingStore::new();
    let counters = Arc::clone(&store.counters);
    let coordinator = TransactionCoordinator::new(store);
    let id = open_account(&coordinator, "Alice", Some("1000.00")).await;

    let start = tokio::time::Instant::now();
    let error = coordinator
        .deposit(id, dec("10.00"), LockingMode::Optimistic, None)
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    match error {
        LedgerError::ConflictExhausted {
            account_id,
            attempts,
            last,
        } => {
            assert_eq!(account_id, id);
            assert_eq!(attempts, 5);
            assert_eq!(last.account_id, id);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(counters.commits(), 5);

    // Four backoff sleeps: 100 + 200 + 300 + 400 ms plus under 60 ms jitter each,
    // with millisecond rounding of each deadline.
    assert!(elapsed >= Duration::from_millis(1000), "elapsed {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(1250), "elapsed {elapsed:?}");

    let account = coordinator.find(id).await.unwrap();
    assert_eq!(account.balance, dec("1000.00"));
    assert_eq!(account.version, 0);
    assert_eq!(coordinator.ledger(id).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_bound_follows_policy() {
    let store = ConflictingStore::new();
    let counters = Arc::clone(&store.counters);
    let coordinator = TransactionCoordinator::with_policies(
        store,
        RetryPolicy::with_max_attempts(2),
        JitterConfig::default(),
    );
    let id = open_account(&coordinator, "Alice", None).await;

    let error = coordinator
        .deposit(id, dec("10.00"), LockingMode::Optimistic, None)
        .await
        .unwrap_err();

    assert!(matches!(error, LedgerError::ConflictExhausted { attempts: 2, .. }));
    assert_eq!(counters.commits(), 2);
}

#[tokio::test]
async fn test_pessimistic_mode_is_never_retried() {
    let store = ConflictingStore::new();
    let counters = Arc::clone(&store.counters);
    let coordinator = TransactionCoordinator::new(store);
    let id = open_account(&coordinator, "Alice", Some("10.00")).await;

    let error = coordinator
        .deposit(id, dec("1.00"), LockingMode::Pessimistic, None)
        .await
        .unwrap_err();

    // A locked row cannot legitimately conflict, so the store's answer is a storage fault.
    assert!(matches!(error, LedgerError::Storage { .. }), "unexpected error: {error:?}");
    assert_eq!(counters.commits(), 1);
}

#[tokio::test]
async fn test_not_found_is_never_retried() {
    let store = ConflictingStore::new();
    let counters = Arc::clone(&store.counters);
    let coordinator = TransactionCoordinator::new(store);
    let unknown = uuid::Uuid::now_v7();

    for mode in [LockingMode::Optimistic, LockingMode::Pessimistic] {
        let error = coordinator
            .deposit(unknown, dec("1.00"), mode, None)
            .await
            .unwrap_err();
        assert_eq!(error, LedgerError::not_found(unknown));
    }
    assert_eq!(counters.commits(), 0);
}

#[tokio::test]
async fn test_optimistic_overdraft_is_not_retried() {
    let coordinator = TransactionCoordinator::new(InMemoryStore::new());
    let id = open_account(&coordinator, "Alice", Some("5.00")).await;

    let error = coordinator
        .withdraw(id, dec("5.01"), LockingMode::Optimistic, None)
        .await
        .unwrap_err();

    assert_eq!(error, LedgerError::insufficient_funds(id, dec("5.01"), dec("5.00")));
    assert_consistent(&coordinator, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pessimistic_withdrawals_never_overdraw() {
    let coordinator = Arc::new(TransactionCoordinator::new(InMemoryStore::new()));
    let id = open_account(&coordinator, "Alice", Some("1000.00")).await;

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let coordinator = Arc::clone(&coordinator);
        tasks.push(tokio::spawn(async move {
            coordinator
                .withdraw(id, dec("100.00"), LockingMode::Pessimistic, None)
                .await
        }));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(rejected, 10);
    let account = coordinator.find(id).await.unwrap();
    assert_eq!(account.balance, Decimal::ZERO);
    assert_eq!(account.version, 10);
    assert_consistent(&coordinator, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_contention_keeps_ledger_consistent() {
    let coordinator = Arc::new(TransactionCoordinator::with_policies(
        InMemoryStore::new(),
        RetryPolicy::with_max_attempts(50),
        JitterConfig {
            enabled: true,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(3),
        },
    ));
    let id = open_account(&coordinator, "Alice", Some("500.00")).await;

    let mut tasks = Vec::new();
    for i in 0..40 {
        let coordinator = Arc::clone(&coordinator);
        let mode = if i % 2 == 0 {
            LockingMode::Optimistic
        } else {
            LockingMode::Pessimistic
        };
        let tx_type = if i % 3 == 0 {
            TransactionType::Withdrawal
        } else {
            TransactionType::Deposit
        };
        tasks.push(tokio::spawn(async move {
            coordinator
                .execute(id, tx_type, dec("25.00"), mode, None)
                .await
        }));
    }

    for task in tasks {
        match task.await.unwrap() {
            Ok(_)
            | Err(LedgerError::InsufficientFunds { .. })
            | Err(LedgerError::ConflictExhausted { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_consistent(&coordinator, id).await;
}

#[tokio::test]
async fn test_lock_timeout_is_distinct_and_not_retried() {
    let store = InMemoryStore::with_config(StoreConfig {
        lock_timeout: Some(Duration::from_millis(20)),
    });
    let coordinator = TransactionCoordinator::new(store);
    let id = open_account(&coordinator, "Alice", Some("100.00")).await;

    let mut holder = coordinator.store().begin();
    holder.find_for_update(id).await.unwrap();

    for mode in [LockingMode::Pessimistic, LockingMode::Optimistic] {
        let error = coordinator
            .withdraw(id, dec("10.00"), mode, None)
            .await
            .unwrap_err();
        assert!(
            matches!(error, LedgerError::LockTimeout { account_id, .. } if account_id == id),
            "unexpected error: {error:?}"
        );
    }

    drop(holder);
    let account = coordinator.find(id).await.unwrap();
    assert_eq!(account.balance, dec("100.00"));
    assert_eq!(account.version, 0);
}

#[tokio::test]
async fn test_cancelled_lock_wait_leaves_no_trace() {
    let coordinator = TransactionCoordinator::new(InMemoryStore::new());
    let id = open_account(&coordinator, "Alice", Some("100.00")).await;

    let mut holder = coordinator.store().begin();
    holder.find_for_update(id).await.unwrap();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        coordinator.withdraw(id, dec("10.00"), LockingMode::Pessimistic, None),
    )
    .await;
    assert!(cancelled.is_err(), "the withdrawal should still be waiting");

    drop(holder);

    // The cancelled waiter must not have left a lock or a staged write behind.
    let result = coordinator
        .withdraw(id, dec("30.00"), LockingMode::Pessimistic, None)
        .await
        .unwrap();
    assert_eq!(result.account.balance, dec("70.00"));
    assert_eq!(result.account.version, 1);
    assert_consistent(&coordinator, id).await;
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_backoff_leaves_no_trace() {
    let coordinator = TransactionCoordinator::new(ConflictingStore::new());
    let id = open_account(&coordinator, "Alice", Some("100.00")).await;

    // Cancelled during the first backoff sleep (at least 100 ms).
    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        coordinator.deposit(id, dec("10.00"), LockingMode::Optimistic, None),
    )
    .await;
    assert!(cancelled.is_err());

    let account = coordinator.find(id).await.unwrap();
    assert_eq!(account.balance, dec("100.00"));
    assert_eq!(account.version, 0);
    assert_eq!(coordinator.ledger(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_execute_transaction_passes_reason_through() {
    let coordinator = TransactionCoordinator::new(InMemoryStore::new());
    let id = open_account(&coordinator, "Alice", Some("100.00")).await;

    let request = ledger_engine::TransactionRequest::withdrawal(dec("40"), LockingMode::Pessimistic)
        .with_reason("rent payment");
    let result = coordinator.execute_transaction(id, &request).await.unwrap();

    let entry = result.ledger_entry.unwrap();
    assert_eq!(entry.direction, Direction::Debit);
    assert_eq!(entry.amount.to_string(), "40.00");
    assert_eq!(entry.reason.as_deref(), Some("rent payment"));
    assert_eq!(result.account.balance, dec("60.00"));
}
