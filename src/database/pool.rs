use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use super::DbError;
use crate::config;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Shared connection pool, created lazily from DATABASE_URL on first use.
pub async fn pool() -> Result<&'static PgPool, DbError> {
    POOL.get_or_try_init(connect).await
}

async fn connect() -> Result<PgPool, DbError> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| DbError::ConfigMissing("DATABASE_URL"))?;
    // Parse early so a malformed URL is a config error, not a connect error
    url::Url::parse(&database_url).map_err(|_| DbError::InvalidDatabaseUrl)?;

    let db_config = &config::config().database;
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
        .connect(&database_url)
        .await?;

    info!("Created database pool");
    Ok(pool)
}

/// Apply embedded migrations from ./migrations
pub async fn run_migrations() -> Result<(), DbError> {
    let pool = pool().await?;
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::Migration(e.to_string()))
}

/// Pings the pool to ensure connectivity
pub async fn health_check() -> Result<(), DbError> {
    let pool = pool().await?;
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
