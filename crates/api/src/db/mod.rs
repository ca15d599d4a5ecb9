//! Persistence for the recipe catalog.
//!
//! # Schema: `catalog`
//!
//! ## Tables
//!
//! - `app_user` - Accounts with argon2 password hashes
//! - `auth_token` - SHA-256 digests of issued bearer tokens
//! - `recipe` - Recipes, owned by one user
//! - `tag`, `ingredient` - Owner-scoped labels, UNIQUE (user_id, name)
//! - `recipe_tag`, `recipe_ingredient` - Join tables, cascade on delete
//!
//! # Stores
//!
//! Handlers and services only see the [`IdentityStore`] and [`CatalogStore`]
//! traits. [`PgStore`] is the production implementation; `MemoryStore`
//! (feature `test-support`) backs the tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p recipe-catalog-cli -- migrate
//! ```

mod catalog;
mod labels;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use recipe_catalog_core::{Email, RecipeId, UserId};

use crate::models::{
    Label, LabelKind, NewToken, NewUser, Recipe, RecipeChanges, RecipeDraft, RecipeFilter, User,
    UserChanges,
};

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// User accounts and bearer tokens.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Get a user and their password hash by email.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Apply profile changes.
    ///
    /// Returns `RepositoryError::NotFound` for an unknown user and
    /// `RepositoryError::Conflict` if the new email is taken.
    async fn update_user(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<User, RepositoryError>;

    /// Persist a token digest, dropping the same user's expired tokens.
    async fn store_token(&self, token: &NewToken) -> Result<(), RepositoryError>;

    /// Delete every token expired at `now`, returning how many were removed.
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;

    /// Resolve a token digest to its owner, ignoring tokens expired at `now`.
    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError>;
}

/// Recipes and their labels.
///
/// Every operation is scoped by `owner`. Rows belonging to another user are
/// indistinguishable from missing rows.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// List the owner's recipes, newest first.
    async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RepositoryError>;

    /// Get one of the owner's recipes.
    async fn get_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError>;

    /// Insert a recipe, resolving label names by get-or-create.
    async fn create_recipe(
        &self,
        owner: UserId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, RepositoryError>;

    /// Apply changes to one of the owner's recipes.
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no such recipe.
    async fn update_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
        changes: &RecipeChanges,
    ) -> Result<Recipe, RepositoryError>;

    /// Delete one of the owner's recipes. Labels are kept.
    async fn delete_recipe(&self, owner: UserId, id: RecipeId) -> Result<(), RepositoryError>;

    /// List the owner's labels of one kind, ordered by name descending.
    ///
    /// With `assigned_only`, only labels attached to at least one of the
    /// owner's recipes are returned, each once.
    async fn list_labels(
        &self,
        owner: UserId,
        kind: LabelKind,
        assigned_only: bool,
    ) -> Result<Vec<Label>, RepositoryError>;

    /// Get one of the owner's labels.
    async fn get_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<Option<Label>, RepositoryError>;

    /// Insert a label.
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has one with this name.
    async fn create_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        name: &str,
    ) -> Result<Label, RepositoryError>;

    /// Rename one of the owner's labels.
    async fn rename_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
        name: &str,
    ) -> Result<Label, RepositoryError>;

    /// Delete one of the owner's labels, detaching it from every recipe.
    async fn delete_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<(), RepositoryError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store: IdentityStore + CatalogStore {
    /// Check that the backing database answers.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
