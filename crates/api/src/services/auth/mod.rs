//! Authentication service.
//!
//! Provides password registration and login, opaque bearer tokens and
//! self-service profile updates.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use recipe_catalog_core::{Email, Patch};

use crate::db::{IdentityStore, RepositoryError};
use crate::models::{IssuedToken, NewToken, NewUser, User, UserChanges};

/// Minimum password length, in characters.
const MIN_PASSWORD_LENGTH: usize = 5;

/// Maximum display name length, in characters.
const MAX_NAME_LENGTH: usize = 255;

/// Random bytes per bearer token.
const TOKEN_BYTES: usize = 32;

/// Hash verified when the email is unknown, so that a miss costs one argon2
/// verification like a hit does.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("recipe-catalog-timing-equalizer").ok());

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Patch<String>,
    pub name: Patch<String>,
    pub password: Patch<String>,
}

/// Authentication service.
///
/// Handles user registration, login, token issuance and token resolution.
pub struct AuthService<'a, S: ?Sized> {
    store: &'a S,
    token_ttl: Duration,
}

impl<'a, S: IdentityStore + ?Sized> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a S, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        self.create(email, password, name, false).await
    }

    /// Register a user with the staff and superuser flags set.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        self.create(email, password, name, true).await
    }

    async fn create(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        superuser: bool,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let name = validate_name(name.unwrap_or_default())?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(&NewUser {
                email,
                password_hash,
                name,
                is_staff: superuser,
                is_superuser: superuser,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, superuser, "user registered");
        Ok(user)
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password.
    ///
    /// The email is normalized the same way as at registration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown or malformed
    /// email, a wrong or blank password and an inactive account alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let found = match Email::parse(email) {
            Ok(email) => self.store.get_credentials(&email).await?,
            Err(_) => None,
        };

        // Every attempt pays for exactly one argon2 verification
        let stored_hash = found.as_ref().map(|(_, hash)| hash.as_str());
        let verified = stored_hash
            .or(DUMMY_HASH.as_deref())
            .is_some_and(|hash| verify_password(password, hash).is_ok());

        match found {
            Some((user, _)) if verified && !password.is_empty() && user.is_active => Ok(user),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    // =========================================================================
    // Bearer Tokens
    // =========================================================================

    /// Issue a new bearer token for a user.
    ///
    /// Only the SHA-256 digest is stored; the plaintext is returned once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be stored.
    pub async fn issue_token(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        let expires_at = Utc::now() + self.token_ttl;

        self.store
            .store_token(&NewToken {
                user_id: user.id,
                token_hash: hash_token(&token),
                expires_at,
            })
            .await?;

        tracing::info!(user_id = %user.id, "token issued");
        Ok(IssuedToken { token, expires_at })
    }

    /// Resolve a bearer token to its active owner.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if the token is unknown, expired
    /// or belongs to an inactive user.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        self.store
            .user_for_token(&hash_token(token), Utc::now())
            .await?
            .filter(|user| user.is_active)
            .ok_or(AuthError::Unauthenticated)
    }

    /// Delete every expired token, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AuthError> {
        let purged = self.store.purge_expired_tokens(Utc::now()).await?;
        tracing::info!(purged, "expired tokens purged");
        Ok(purged)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Apply self-service profile changes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::InvalidName` or
    /// `AuthError::WeakPassword` for rejected values and
    /// `AuthError::UserAlreadyExists` if the new email is taken.
    pub async fn update_profile(
        &self,
        user: &User,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        let changes = UserChanges {
            email: match update.email {
                Patch::Set(raw) => Patch::Set(Email::parse(&raw)?),
                Patch::Unset => Patch::Unset,
            },
            name: match update.name {
                Patch::Set(raw) => Patch::Set(validate_name(&raw)?),
                Patch::Unset => Patch::Unset,
            },
            password_hash: match update.password {
                Patch::Set(raw) => {
                    validate_password(&raw)?;
                    Patch::Set(hash_password(&raw)?)
                }
                Patch::Unset => Patch::Unset,
            },
        };

        let updated = self
            .store
            .update_user(user.id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::Unauthenticated,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "profile updated");
        Ok(updated)
    }
}

/// Hex-encoded SHA-256 digest of a bearer token, as stored.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Trim a display name and check its length.
fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.contains('\0') {
        return Err(AuthError::InvalidName(
            "name cannot contain NUL characters".to_owned(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_owned())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

#[cfg(test)]
thread_local! {
    static VERIFICATIONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    #[cfg(test)]
    VERIFICATIONS.with(|count| count.set(count.get() + 1));

    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
