//! Pool construction and migrations.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::{DbError, DbResult};

/// Connect to Postgres and verify the connection with a ping.
pub async fn connect(database_url: &str, max_connections: u32) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .map_err(|e| DbError::connection_failed(e.to_string()))?;

    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(|e| DbError::connection_failed(format!("health check failed: {e}")))?;

    info!("Connected to Postgres");
    Ok(pool)
}

/// Connect and bring the schema up to date.
pub async fn connect_and_migrate(database_url: &str, max_connections: u32) -> DbResult<PgPool> {
    let pool = connect(database_url, max_connections).await?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    info!("Migrations applied");
    Ok(pool)
}
