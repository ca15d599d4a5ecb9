//! `PostgreSQL` user and token queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use recipe_catalog_core::{Email, UserId};

use super::{IdentityStore, PgStore, RepositoryError, conflict_on_unique};
use crate::models::{NewToken, NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, email, name, is_active, is_staff, is_superuser, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO catalog.app_user (email, password_hash, name, is_staff, is_superuser)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.email.as_str())
            .bind(&user.password_hash)
            .bind(&user.name)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM catalog.app_user WHERE email = $1"
        );
        let row = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE catalog.app_user
             SET email = COALESCE($2, email),
                 name = COALESCE($3, name),
                 password_hash = COALESCE($4, password_hash),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_i32())
            .bind(changes.email.clone().into_option().map(Email::into_inner))
            .bind(changes.name.clone().into_option())
            .bind(changes.password_hash.clone().into_option())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email"))?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn store_token(&self, token: &NewToken) -> Result<(), RepositoryError> {
        sqlx::query(
            "WITH purged AS (
                 DELETE FROM catalog.auth_token WHERE user_id = $1 AND expires_at <= NOW()
             )
             INSERT INTO catalog.auth_token (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)",
        )
        .bind(token.user_id.as_i32())
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "token"))?;

        Ok(())
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.auth_token WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn user_for_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.email, u.name, u.is_active, u.is_staff, u.is_superuser,
                    u.created_at, u.updated_at
             FROM catalog.auth_token t
             JOIN catalog.app_user u ON u.id = t.user_id
             WHERE t.token_hash = $1 AND t.expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}
