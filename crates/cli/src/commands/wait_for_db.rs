//! Block until the database accepts connections.
//!
//! Used by container entrypoints before `rc-cli migrate`.

use std::time::Duration;

use recipe_catalog_api::config::CatalogConfig;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;

use super::CommandError;

/// Poll `SELECT 1` until it succeeds or `max_attempts` is reached.
pub async fn run(interval_secs: u64, max_attempts: u32) -> Result<(), CommandError> {
    let config = CatalogConfig::from_env()?;
    let interval = Duration::from_secs(interval_secs);
    let max_attempts = max_attempts.max(1);

    let mut attempt = 1;
    loop {
        match ping(config.database_url.expose_secret(), interval).await {
            Ok(()) => {
                tracing::info!(attempt, "Database is available");
                return Ok(());
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = %e, "Database unavailable, waiting...");
                tokio::time::sleep(interval).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "Database still unavailable, giving up");
                return Err(e.into());
            }
        }
    }
}

async fn ping(database_url: &str, timeout: Duration) -> Result<(), sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(timeout.max(Duration::from_secs(1)))
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    pool.close().await;
    Ok(())
}
