//! CLI subcommand implementations.

pub mod migrate;
pub mod user;
pub mod wait_for_db;

use recipe_catalog_api::config::{CatalogConfig, ConfigError};
use recipe_catalog_api::db;
use sqlx::PgPool;

/// Errors shared by commands that need a database connection.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Load configuration and open a connection pool.
async fn connect() -> Result<(CatalogConfig, PgPool), CommandError> {
    let config = CatalogConfig::from_env()?;

    tracing::info!("Connecting to catalog database...");
    let pool = db::create_pool(&config.database_url).await?;
    Ok((config, pool))
}
