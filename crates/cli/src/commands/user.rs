//! User management commands.
//!
//! ```bash
//! rc-cli user create-superuser -e admin@example.com -p secret -n "Admin"
//! rc-cli user purge-tokens
//! ```

use recipe_catalog_api::db::PgStore;
use recipe_catalog_api::services::{AuthError, AuthService};

use super::{CommandError, connect};

/// Errors from user management commands.
#[derive(Debug, thiserror::Error)]
pub enum UserCommandError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a user with `is_staff` and `is_superuser` set.
///
/// Goes through the same validation as registration: the email is
/// normalized and the password must meet the minimum length.
pub async fn create_superuser(
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<(), UserCommandError> {
    let (config, pool) = connect().await?;
    let store = PgStore::new(pool);

    let auth = AuthService::new(&store, config.token_ttl());
    let user = auth.create_superuser(email, password, name).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Superuser created");
    Ok(())
}

/// Delete every expired bearer token.
pub async fn purge_tokens() -> Result<(), UserCommandError> {
    let (config, pool) = connect().await?;
    let store = PgStore::new(pool);

    AuthService::new(&store, config.token_ttl())
        .purge_expired_tokens()
        .await?;
    Ok(())
}
