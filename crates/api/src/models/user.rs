//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use recipe_catalog_core::{Email, Patch, UserId};

/// A catalog user (domain type).
///
/// The password hash is deliberately not part of this type; it only travels
/// between the identity store and the password verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address (domain lower-cased).
    pub email: Email,
    /// Display name, empty if never set.
    pub name: String,
    /// Inactive users cannot log in or use existing tokens.
    pub is_active: bool,
    /// May manage other accounts.
    pub is_staff: bool,
    /// Holds every permission.
    pub is_superuser: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email address.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// Staff flag.
    pub is_staff: bool,
    /// Superuser flag.
    pub is_superuser: bool,
}

/// Validated self-service profile changes.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New email address.
    pub email: Patch<Email>,
    /// New display name.
    pub name: Patch<String>,
    /// New argon2 PHC string.
    pub password_hash: Patch<String>,
}

/// Input for persisting a bearer token digest.
#[derive(Debug, Clone)]
pub struct NewToken {
    /// Token owner.
    pub user_id: UserId,
    /// Hex-encoded SHA-256 of the plaintext token.
    pub token_hash: String,
    /// Moment after which the token no longer authenticates.
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued bearer token.
///
/// The plaintext is only available here; storage keeps the digest.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// Opaque token to send as `Authorization: Bearer <token>`.
    pub token: String,
    /// Expiry of the token.
    pub expires_at: DateTime<Utc>,
}
