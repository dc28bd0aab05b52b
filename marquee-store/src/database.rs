use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;
use crate::booking_repo::PgBookingStore;

/// Connects to Postgres and brings the schema up to date before handing out stores.
pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect(url)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("../migrations").run(&pool).await?;
    info!("Migrations completed successfully.");
    Ok(pool)
}

pub async fn booking_store(url: &str, config: &DatabaseConfig) -> Result<PgBookingStore, sqlx::Error> {
    Ok(PgBookingStore::new(connect(url, config).await?))
}
