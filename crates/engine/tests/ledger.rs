mod common;

use engine::{EngineError, LedgerDelta, Money, WalletTransactionKind};
use uuid::Uuid;

use common::{admin, engine_with_db, funded_user, ledger_sum};

#[tokio::test]
async fn entries_record_balance_before_and_after() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;

    let entry = engine
        .apply_delta(LedgerDelta::new(
            alice.id,
            WalletTransactionKind::Debit,
            Money::from_major(30),
            "manual debit",
            "DEBIT-1",
        ))
        .await
        .unwrap();

    assert_eq!(entry.balance_before, Money::from_major(100));
    assert_eq!(entry.balance_after, Money::from_major(70));
    assert_eq!(entry.signed_amount(), Money::from_major(-30));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(70));
}

#[tokio::test]
async fn debit_beyond_balance_leaves_no_trace() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 10).await;

    let err = engine
        .apply_delta(LedgerDelta::new(
            alice.id,
            WalletTransactionKind::Debit,
            Money::from_major(11),
            "too much",
            "DEBIT-2",
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientBalance(_)));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(10));
    let (entries, _) = engine
        .wallet_transactions_page(alice.id, alice.id, None, None)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn reference_can_only_be_used_once() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 0).await;
    let delta = LedgerDelta::new(
        alice.id,
        WalletTransactionKind::Credit,
        Money::from_major(5),
        "bonus",
        "BONUS-1",
    );

    engine.apply_delta(delta.clone()).await.unwrap();
    let err = engine.apply_delta(delta).await.unwrap_err();

    assert_eq!(err, EngineError::DuplicateReference("BONUS-1".to_string()));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(5));
}

#[tokio::test]
async fn zero_amount_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 0).await;

    let err = engine
        .apply_delta(LedgerDelta::new(
            alice.id,
            WalletTransactionKind::Credit,
            Money::ZERO,
            "nothing",
            "ZERO-1",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .apply_delta(LedgerDelta::new(
            Uuid::new_v4(),
            WalletTransactionKind::Credit,
            Money::from_major(1),
            "ghost",
            "GHOST-1",
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));
}

#[tokio::test]
async fn balance_equals_sum_of_ledger_entries() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 500).await;

    for (i, (kind, major)) in [
        (WalletTransactionKind::Debit, 120),
        (WalletTransactionKind::Credit, 40),
        (WalletTransactionKind::Fee, 3),
        (WalletTransactionKind::MobileMoneyIn, 17),
    ]
    .into_iter()
    .enumerate()
    {
        engine
            .apply_delta(LedgerDelta::new(
                alice.id,
                kind,
                Money::from_major(major),
                "mixed",
                format!("MIX-{i}"),
            ))
            .await
            .unwrap();
    }

    let balance = engine.wallet_balance(alice.id).await.unwrap();
    assert_eq!(balance, Money::from_major(434));
    assert_eq!(ledger_sum(&engine, &alice).await, balance);
}

#[tokio::test]
async fn history_pages_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 0).await;
    for i in 0..5 {
        engine
            .apply_delta(LedgerDelta::new(
                alice.id,
                WalletTransactionKind::Credit,
                Money::from_major(i + 1),
                "top-up",
                format!("PAGE-{i}"),
            ))
            .await
            .unwrap();
    }

    let (first, next) = engine
        .wallet_transactions_page(alice.id, alice.id, Some(2), None)
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].reference, "PAGE-4");
    let next = next.expect("more pages");

    let (second, next) = engine
        .wallet_transactions_page(alice.id, alice.id, Some(2), Some(&next))
        .await
        .unwrap();
    assert_eq!(second[0].reference, "PAGE-2");
    let (third, next) = engine
        .wallet_transactions_page(alice.id, alice.id, Some(2), next.as_deref())
        .await
        .unwrap();
    assert_eq!(third.len(), 1);
    assert!(next.is_none());
}

#[tokio::test]
async fn history_rejects_bad_cursor_and_strangers() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 10).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;

    let err = engine
        .wallet_transactions_page(alice.id, alice.id, None, Some("not-a-cursor"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCursor(_)));

    let err = engine
        .wallet_transactions_page(bob.id, alice.id, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let (entries, _) = engine
        .wallet_transactions_page(admin.id, alice.id, None, None)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn admin_credit_requires_admin() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 0).await;

    let err = engine
        .admin_credit(alice.id, alice.id, Money::from_major(1_000), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let entry = engine
        .admin_credit(admin.id, alice.id, Money::from_major(50), Some("welcome"))
        .await
        .unwrap();
    assert_eq!(entry.kind, WalletTransactionKind::AdminCredit);
    assert!(entry.reference.starts_with("ADMIN-"));
    assert_eq!(entry.description, "welcome");
}

#[tokio::test]
async fn credit_that_would_overflow_the_balance_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 1).await;

    let err = engine
        .admin_credit(admin.id, alice.id, Money::new(i64::MAX), None)
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::InvalidAmount("balance would overflow".to_string()));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(1));
}
