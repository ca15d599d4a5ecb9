//! Catalog error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected; the message is safe to show to the client.
    #[error("{0}")]
    Validation(String),

    /// No such resource owned by the caller.
    #[error("not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(msg) => Self::Validation(msg),
            other => Self::Repository(other),
        }
    }
}
