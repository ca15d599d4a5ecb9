//! Bearer token authentication extractor.
//!
//! Clients send `Authorization: Bearer <token>`. The `Token <token>` scheme is
//! accepted too.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::AuthError;
use crate::state::AppState;

/// Authorization schemes that carry a catalog token.
const SCHEMES: [&str; 2] = ["Bearer", "Token"];

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 if the header is missing or malformed, or if the token is
/// unknown, expired or belongs to an inactive user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(token_from_header)
            .ok_or(AuthError::Unauthenticated)?;

        let user = state.auth().authenticate(token).await?;

        set_sentry_user(&user.id, None);
        tracing::Span::current().record("user_id", user.id.as_i32());

        Ok(Self(user))
    }
}

/// Extract the token from an `Authorization` header value.
fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) && !token.is_empty()).then_some(token)
}
