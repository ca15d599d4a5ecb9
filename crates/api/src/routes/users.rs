//! Account route handlers: registration, token issuance and the own profile.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use recipe_catalog_core::{Email, Patch, UserId};

use super::extract::Json;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{IssuedToken, User};
use crate::services::ProfileUpdate;
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Token request payload.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// Profile update payload. Absent keys are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub password: Patch<String>,
}

/// Public view of a user. The password hash never leaves the store.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

/// `POST /users`
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth()
        .register(&req.email, &req.password, req.name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `POST /tokens`
pub async fn create_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<IssuedToken>> {
    let auth = state.auth();
    let user = auth.login(&req.email, &req.password).await?;
    let token = auth.issue_token(&user).await?;

    Ok(Json(token))
}

/// `GET /users/me`
pub async fn me(RequireAuth(user): RequireAuth) -> Json<UserResponse> {
    Json(user.into())
}

/// `PATCH /users/me`
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let updated = state
        .auth()
        .update_profile(
            &user,
            ProfileUpdate {
                email: req.email,
                name: req.name,
                password: req.password,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}
