use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    config::DatabaseConfig,
    error::{AppError, Result},
};

/// Opens the pool and applies the embedded migrations under `migrations/`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to run migrations: {}", e)))?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database ready, migrations applied"
    );

    Ok(pool)
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
