#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, FeeSchedule, Money, Percent, User};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn admin(engine: &Engine) -> User {
    engine.create_admin("root", "password").await.unwrap()
}

/// Registers `username` and tops the wallet up with `major` taka.
pub async fn funded_user(engine: &Engine, admin: &User, username: &str, major: i64) -> User {
    let user = engine.register_user(username, "password").await.unwrap();
    if major > 0 {
        engine
            .admin_credit(admin.id, user.id, Money::from_major(major), None)
            .await
            .unwrap();
    }
    user
}

/// 1.5% mobile-money fee, 1% transfer fee, clamped to `[5, 100]` taka.
pub async fn standard_fees(engine: &Engine, admin: &User) -> FeeSchedule {
    let schedule = FeeSchedule::new(
        Percent::from_basis_points(100).unwrap(),
        Percent::from_basis_points(150).unwrap(),
        Money::from_major(5),
        Money::from_major(100),
    )
    .unwrap();
    engine.set_fee_schedule(admin.id, schedule).await.unwrap()
}

/// Sum of every signed ledger entry of `user`.
pub async fn ledger_sum(engine: &Engine, user: &User) -> Money {
    let mut total = Money::ZERO;
    let mut cursor: Option<String> = None;
    loop {
        let (items, next) = engine
            .wallet_transactions_page(user.id, user.id, Some(200), cursor.as_deref())
            .await
            .unwrap();
        for entry in items {
            total += entry.signed_amount();
        }
        match next {
            Some(next) => cursor = Some(next),
            None => return total,
        }
    }
}
