//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] recipe_catalog_core::EmailError),

    /// Display name rejected.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Invalid credentials (wrong password, unknown email or inactive user).
    #[error("unable to authenticate with provided credentials")]
    InvalidCredentials,

    /// Missing, unknown or expired bearer token.
    #[error("authentication required")]
    Unauthenticated,

    /// User already exists.
    #[error("a user with this email already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
