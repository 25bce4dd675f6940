mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use engine::{
    CreateRequestCmd, EngineError, FulfillCmd, LedgerDelta, Money, Provider, RequestListFilter,
    RequestScope, RequestStatus, WalletTransactionKind,
};
use uuid::Uuid;

use common::{admin, engine_with_db, funded_user, ledger_sum, standard_fees};

fn bkash(requester: Uuid, major: i64) -> CreateRequestCmd {
    CreateRequestCmd::new(requester, Provider::Bkash, "01712345678", Money::from_major(major))
}

#[tokio::test]
async fn create_holds_amount_plus_fee() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    standard_fees(&engine, &admin).await;
    let alice = funded_user(&engine, &admin, "alice", 2000).await;

    let request = engine
        .create_request(bkash(alice.id, 1000).description("rent"))
        .await
        .unwrap();

    assert_eq!(request.fees, Money::from_major(15));
    assert_eq!(request.total_amount, Money::from_major(1015));
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.description.as_deref(), Some("rent"));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(985));

    let (entries, _) = engine
        .wallet_transactions_page(alice.id, alice.id, Some(1), None)
        .await
        .unwrap();
    assert_eq!(entries[0].kind, WalletTransactionKind::MobileMoneyOut);
    assert_eq!(entries[0].reference, request.reference);
    assert_eq!(entries[0].amount, Money::from_major(1015));
}

#[tokio::test]
async fn create_without_funds_leaves_nothing_behind() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    standard_fees(&engine, &admin).await;
    let alice = funded_user(&engine, &admin, "alice", 1000).await;

    let err = engine.create_request(bkash(alice.id, 1000)).await.unwrap_err();

    assert!(matches!(err, EngineError::InsufficientBalance(_)));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(1000));
    let mine = engine
        .list_requests(alice.id, &RequestListFilter::default())
        .await
        .unwrap();
    assert!(mine.is_empty());
}

#[tokio::test]
async fn create_validates_input() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;

    let err = engine.create_request(bkash(alice.id, 0)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let cmd = CreateRequestCmd::new(alice.id, Provider::Nagad, "call me", Money::from_major(5));
    let err = engine.create_request(cmd).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn zero_fee_cancel_refunds_everything() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 500).await;

    let request = engine.create_request(bkash(alice.id, 200)).await.unwrap();
    assert_eq!(request.fees, Money::ZERO);
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(300));

    let cancelled = engine.cancel_request(request.id, alice.id).await.unwrap();

    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(500));
    assert_eq!(ledger_sum(&engine, &alice).await, Money::from_major(500));
}

#[tokio::test]
async fn cancel_refunds_fee_too() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    standard_fees(&engine, &admin).await;
    let alice = funded_user(&engine, &admin, "alice", 2000).await;

    let request = engine.create_request(bkash(alice.id, 1000)).await.unwrap();
    engine.cancel_request(request.id, alice.id).await.unwrap();

    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(2000));
    let err = engine.cancel_request(request.id, alice.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(2000));
}

#[tokio::test]
async fn cancel_is_limited_to_requester_and_admin() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;

    let request = engine.create_request(bkash(alice.id, 50)).await.unwrap();
    let err = engine.cancel_request(request.id, bob.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert_eq!(
        engine.request(request.id, alice.id).await.unwrap().status,
        RequestStatus::Pending
    );

    let cancelled = engine.cancel_request(request.id, admin.id).await.unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(100));
}

#[tokio::test]
async fn accepted_request_cannot_be_cancelled() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;

    let request = engine.create_request(bkash(alice.id, 50)).await.unwrap();
    engine.accept_request(request.id, bob.id).await.unwrap();

    let err = engine.cancel_request(request.id, alice.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(50));
}

#[tokio::test]
async fn requester_cannot_accept_own_request() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;

    let request = engine.create_request(bkash(alice.id, 50)).await.unwrap();
    let err = engine.accept_request(request.id, alice.id).await.unwrap_err();

    assert_eq!(err, EngineError::SelfAcceptForbidden);
    let request = engine.request(request.id, alice.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.fulfiller_id.is_none());
}

#[tokio::test]
async fn concurrent_accepts_have_one_winner() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;
    let request_id = engine.create_request(bkash(alice.id, 50)).await.unwrap().id;

    let mut fulfillers = Vec::new();
    for i in 0..8 {
        fulfillers.push(funded_user(&engine, &admin, &format!("peer{i}"), 0).await);
    }

    let mut handles = Vec::new();
    for fulfiller in &fulfillers {
        let engine = Arc::clone(&engine);
        let fulfiller_id = fulfiller.id;
        handles.push(tokio::spawn(async move {
            engine.accept_request(request_id, fulfiller_id).await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(accepted) => winners.push(accepted.fulfiller_id),
            Err(err) => assert!(
                matches!(err, EngineError::AlreadyClaimed(_) | EngineError::InvalidState(_)),
                "unexpected error: {err:?}"
            ),
        }
    }

    assert_eq!(winners.len(), 1);
    let stored = engine.request(request_id, alice.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
    assert_eq!(stored.fulfiller_id, winners[0]);
}

#[tokio::test]
async fn only_the_fulfiller_can_fulfill() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;
    let carol = funded_user(&engine, &admin, "carol", 0).await;
    let request = engine.create_request(bkash(alice.id, 50)).await.unwrap();

    let err = engine
        .fulfill_request(FulfillCmd::new(request.id, bob.id, "TXN1", "01811111111"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    engine.accept_request(request.id, bob.id).await.unwrap();
    let err = engine
        .fulfill_request(FulfillCmd::new(request.id, carol.id, "TXN1", "01811111111"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .fulfill_request(FulfillCmd::new(request.id, bob.id, " ", "01811111111"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let fulfilled = engine
        .fulfill_request(
            FulfillCmd::new(request.id, bob.id, "TXN1", "01811111111").notes("sent at noon"),
        )
        .await
        .unwrap();
    assert_eq!(fulfilled.status, RequestStatus::Fulfilled);
    let proof = fulfilled.fulfillment.unwrap();
    assert_eq!(proof.transaction_id, "TXN1");
    assert_eq!(proof.notes.as_deref(), Some("sent at noon"));
    assert!(proof.screenshot.is_none());
    // Fulfilling moves no money.
    assert_eq!(engine.wallet_balance(bob.id).await.unwrap(), Money::ZERO);
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(50));
}

#[tokio::test]
async fn expire_refunds_and_is_admin_only() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;
    let request = engine.create_request(bkash(alice.id, 40)).await.unwrap();

    let err = engine.expire_request(request.id, alice.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let expired = engine.expire_request(request.id, admin.id).await.unwrap();
    assert_eq!(expired.status, RequestStatus::Expired);
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(100));
}

#[tokio::test]
async fn stale_sweep_expires_only_old_pending_requests() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 300).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;

    let stale = engine.create_request(bkash(alice.id, 100)).await.unwrap();
    let taken = engine.create_request(bkash(alice.id, 100)).await.unwrap();
    engine.accept_request(taken.id, bob.id).await.unwrap();

    let none = engine
        .expire_stale_requests(Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(none, 0);

    let expired = engine
        .expire_stale_requests(Utc::now() + Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(expired, 1);
    assert_eq!(
        engine.request(stale.id, alice.id).await.unwrap().status,
        RequestStatus::Expired
    );
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(200));
}

#[tokio::test]
async fn list_scopes_follow_the_caller() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 300).await;
    let bob = funded_user(&engine, &admin, "bob", 300).await;

    let first = engine.create_request(bkash(alice.id, 10)).await.unwrap();
    engine.create_request(bkash(alice.id, 20)).await.unwrap();
    engine.create_request(bkash(bob.id, 30)).await.unwrap();
    engine.accept_request(first.id, bob.id).await.unwrap();

    let scoped = |scope| RequestListFilter {
        scope,
        ..RequestListFilter::default()
    };

    let mine = engine.list_requests(alice.id, &scoped(RequestScope::Mine)).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].amount, Money::from_major(20));

    let open = engine.list_requests(bob.id, &scoped(RequestScope::Open)).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].requester_id, alice.id);

    let assigned = engine
        .list_requests(bob.id, &scoped(RequestScope::Assigned))
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, first.id);

    let err = engine
        .list_requests(alice.id, &scoped(RequestScope::All))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let pending = engine
        .list_requests(
            admin.id,
            &RequestListFilter {
                scope: RequestScope::All,
                status: Some(RequestStatus::Pending),
                limit: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
}

#[tokio::test]
async fn accepted_request_is_hidden_from_outsiders() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 100).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;
    let carol = funded_user(&engine, &admin, "carol", 0).await;
    let request = engine.create_request(bkash(alice.id, 10)).await.unwrap();

    assert!(engine.request(request.id, carol.id).await.is_ok());
    engine.accept_request(request.id, bob.id).await.unwrap();

    let err = engine.request(request.id, carol.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("request not exists".to_string()));
    assert!(engine.request(request.id, bob.id).await.is_ok());
    assert!(engine.request(request.id, admin.id).await.is_ok());
}

#[tokio::test]
async fn create_rejects_amount_whose_total_overflows() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    standard_fees(&engine, &admin).await;
    let alice = funded_user(&engine, &admin, "alice", 10).await;

    let cmd = CreateRequestCmd::new(
        alice.id,
        Provider::Bkash,
        "01712345678",
        Money::new(i64::MAX - 10),
    );
    let err = engine.create_request(cmd).await.unwrap_err();

    assert_eq!(err, EngineError::InvalidAmount("amount too large".to_string()));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(10));
    assert_eq!(ledger_sum(&engine, &alice).await, Money::from_major(10));
}

#[tokio::test]
async fn inactive_users_cannot_create_accept_or_fulfill() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 300).await;
    let bob = funded_user(&engine, &admin, "bob", 0).await;
    let carol = funded_user(&engine, &admin, "carol", 0).await;

    engine.set_user_active(admin.id, alice.id, false).await.unwrap();
    let err = engine.create_request(bkash(alice.id, 100)).await.unwrap_err();
    assert_eq!(err, EngineError::Forbidden("user is inactive".to_string()));
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(300));
    engine.set_user_active(admin.id, alice.id, true).await.unwrap();

    let request = engine.create_request(bkash(alice.id, 100)).await.unwrap();

    engine.set_user_active(admin.id, carol.id, false).await.unwrap();
    let err = engine.accept_request(request.id, carol.id).await.unwrap_err();
    assert_eq!(err, EngineError::Forbidden("user is inactive".to_string()));
    let unclaimed = engine.request(request.id, alice.id).await.unwrap();
    assert_eq!(unclaimed.status, RequestStatus::Pending);
    assert_eq!(unclaimed.fulfiller_id, None);

    engine.accept_request(request.id, bob.id).await.unwrap();
    engine.set_user_active(admin.id, bob.id, false).await.unwrap();
    let err = engine
        .fulfill_request(FulfillCmd::new(request.id, bob.id, "TX-1", "01811111111"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Forbidden("user is inactive".to_string()));
    let still_accepted = engine.request(request.id, alice.id).await.unwrap();
    assert_eq!(still_accepted.status, RequestStatus::Accepted);
    assert!(still_accepted.fulfillment.is_none());
}

#[tokio::test]
async fn stale_sweep_continues_past_a_failed_refund() {
    let (engine, _db) = engine_with_db().await;
    let admin = admin(&engine).await;
    let alice = funded_user(&engine, &admin, "alice", 300).await;

    let blocked = engine.create_request(bkash(alice.id, 100)).await.unwrap();
    let other = engine.create_request(bkash(alice.id, 100)).await.unwrap();
    // The refund reference is already taken, so expiring `blocked` fails.
    engine
        .apply_delta(LedgerDelta::new(
            alice.id,
            WalletTransactionKind::Credit,
            Money::from_major(1),
            "unrelated credit",
            blocked.refund_reference(),
        ))
        .await
        .unwrap();

    let expired = engine
        .expire_stale_requests(Utc::now() + Duration::minutes(1))
        .await
        .unwrap();

    assert_eq!(expired, 1);
    assert_eq!(
        engine.request(blocked.id, alice.id).await.unwrap().status,
        RequestStatus::Pending
    );
    assert_eq!(
        engine.request(other.id, alice.id).await.unwrap().status,
        RequestStatus::Expired
    );
    assert_eq!(engine.wallet_balance(alice.id).await.unwrap(), Money::from_major(201));
}
