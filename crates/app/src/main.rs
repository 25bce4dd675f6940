use std::{net::SocketAddr, time::Duration};

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "mobipay={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;
    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, server.port).parse()?;

    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await?;
    let server_db = db.clone();
    tasks.spawn(async move {
        server::run(engine, server_db, addr).await;
    });

    if let Some(expiry) = settings.expiry {
        tracing::info!(
            ttl_minutes = expiry.pending_ttl_minutes,
            interval_secs = expiry.sweep_interval_secs,
            "Found expiry settings..."
        );
        let sweeper = engine::Engine::builder().database(db).build().await?;
        tasks.spawn(async move {
            let ttl = chrono::Duration::minutes(i64::from(expiry.pending_ttl_minutes));
            let mut interval =
                tokio::time::interval(Duration::from_secs(expiry.sweep_interval_secs.max(1)));
            loop {
                interval.tick().await;
                let cutoff = chrono::Utc::now() - ttl;
                if let Err(err) = sweeper.expire_stale_requests(cutoff).await {
                    tracing::error!("expiry sweep failed: {err}");
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
