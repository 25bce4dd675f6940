mod common;

use std::sync::Arc;

use engine::{
    CreateRequestCmd, Engine, EngineError, FulfillCmd, MobileMoneyRequest, Money, Provider,
    RequestStatus, User, WalletTransactionKind,
};
use sea_orm::{ConnectionTrait, Statement};

use common::{admin, engine_with_db, funded_user, ledger_sum, standard_fees};

async fn fulfilled_request(engine: &Engine, requester: &User, fulfiller: &User) -> MobileMoneyRequest {
    let request = engine
        .create_request(CreateRequestCmd::new(
            requester.id,
            Provider::Rocket,
            "01912345678",
            Money::from_major(1000),
        ))
        .await
        .unwrap();
    engine.accept_request(request.id, fulfiller.id).await.unwrap();
    engine
        .fulfill_request(FulfillCmd::new(request.id, fulfiller.id, "8N7A6D5X", "01811111111"))
        .await
        .unwrap()
}

#[tokio::test]
async fn verify_credits_amount_once() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    standard_fees(&engine, &admin).await;
    let alice = funded_user(&engine, &admin, "alice", 2000).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;
    let request = fulfilled_request(&engine, &alice, &bob).await;

    let verified = engine.verify_request(request.id, admin.id).await.unwrap();

    assert_eq!(verified.status, RequestStatus::Verified);
    assert!(verified.admin_verified);
    assert_eq!(verified.verified_by_id, Some(admin.id));
    assert!(verified.verified_at.is_some());
    // 2000 - 1015 hold + 1000 settlement: only the fee is kept.
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(1985));
    assert_eq!(ledger_sum(&engine, &alice).await, Money::from_major(1985));

    let (entries, _) = engine
        .wallet_transactions_page(alice.id, alice.id, Some(1), None)
        .await
        .unwrap();
    assert_eq!(entries[0].kind, WalletTransactionKind::Credit);
    assert_eq!(entries[0].reference, request.settlement_reference());

    let err = engine.verify_request(request.id, admin.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(1985));
}

#[tokio::test]
async fn verify_writes_transaction_record() {
    let (engine, db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 1000).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;
    let request = fulfilled_request(&engine, &alice, &bob).await;

    engine.verify_request(request.id, admin.id).await.unwrap();

    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT kind, amount, counterparty_id FROM transactions WHERE mobile_money_request_id = ?",
            vec![request.id.to_string().into()],
        ))
        .await
        .unwrap()
        .expect("transaction row");
    assert_eq!(row.try_get::<String>("", "kind").unwrap(), "mobile_money");
    assert_eq!(row.try_get::<i64>("", "amount").unwrap(), 100_000);
    assert_eq!(
        row.try_get::<Option<String>>("", "counterparty_id").unwrap(),
        Some(bob.id.to_string())
    );
}

#[tokio::test]
async fn verify_requires_admin_and_fulfilled_state() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 2000).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;

    let request = fulfilled_request(&engine, &alice, &bob).await;
    let err = engine.verify_request(request.id, bob.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert_eq!(
        engine.request(request.id, alice.id).await.unwrap().status,
        RequestStatus::Fulfilled
    );

    let pending = engine
        .create_request(CreateRequestCmd::new(
            alice.id,
            Provider::Bkash,
            "01712345678",
            Money::from_major(10),
        ))
        .await
        .unwrap();
    let err = engine.verify_request(pending.id, admin.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn concurrent_verifies_settle_once() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let admin = admin(&engine).await;
    let second_admin = engine.create_admin("auditor", "password").await.unwrap();
    let alice = funded_user(&engine, &admin, "alice", 1000).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;
    let request_id = fulfilled_request(&engine, &alice, &bob).await.id;

    let handles: Vec<_> = [admin.id, second_admin.id, admin.id]
        .into_iter()
        .map(|admin_id| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.verify_request(request_id, admin_id).await })
        })
        .collect();

    let mut settled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => settled += 1,
            Err(err) => assert!(matches!(err, EngineError::InvalidState(_)), "{err:?}"),
        }
    }

    assert_eq!(settled, 1);
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(1000));
}

#[tokio::test]
async fn approve_assigns_the_admin() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;
    let request = engine
        .create_request(CreateRequestCmd::new(
            alice.id,
            Provider::Nagad,
            "01612345678",
            Money::from_major(60),
        ))
        .await
        .unwrap();

    let approved = engine.approve_request(request.id, admin.id).await.unwrap();

    assert_eq!(approved.status, RequestStatus::Accepted);
    assert_eq!(approved.fulfiller_id, Some(admin.id));
    assert!(approved.admin_verified);
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(40));

    let err = engine.approve_request(request.id, admin.id).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyClaimed(_)));
}

#[tokio::test]
async fn admin_cannot_approve_own_request() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    engine
        .admin_credit(admin.id, admin.id, Money::from_major(100), None)
        .await
        .unwrap();
    let alice = funded_user(&engine, &admin, "alice", 0).await;
    let request = engine
        .create_request(CreateRequestCmd::new(
            admin.id,
            Provider::Bkash,
            "01712345678",
            Money::from_major(10),
        ))
        .await
        .unwrap();

    let err = engine.approve_request(request.id, admin.id).await.unwrap_err();
    assert_eq!(err, EngineError::SelfAcceptForbidden);

    let err = engine.approve_request(request.id, alice.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn full_flow_conserves_money() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    standard_fees(&engine, &admin).await;
    let alice = funded_user(&engine, &admin, "alice", 5000).await;
    let bob = funded_user(&engine, &admin, "bob", 5000).await;

    let settled = fulfilled_request(&engine, &alice, &bob).await;
    engine.verify_request(settled.id, admin.id).await.unwrap();
    let refunded = engine
        .create_request(CreateRequestCmd::new(
            bob.id,
            Provider::Bkash,
            "01712345678",
            Money::from_major(300),
        ))
        .await
        .unwrap();
    engine.cancel_request(refunded.id, bob.id).await.unwrap();
    let open = engine
        .create_request(CreateRequestCmd::new(
            bob.id,
            Provider::Bkash,
            "01712345678",
            Money::from_major(200),
        ))
        .await
        .unwrap();

    let total = engine.wallet_balance(alice.id).await.unwrap()
        + engine.wallet_balance(bob.id).await.unwrap();
    // Credits in, minus settled fees, minus the open hold.
    assert_eq!(total, Money::from_major(10_000) - settled.fees - open.total_amount);
    for user in [&alice, &bob] {
        assert_eq!(
            ledger_sum(&engine, user).await,
            engine.wallet_balance(user.id).await.unwrap()
        );
    }
}
