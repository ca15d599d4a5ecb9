//! HTTP route handlers for the recipe catalog.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Accounts (rate limited per IP)
//! POST /users                  - Register
//! POST /tokens                 - Issue bearer token
//!
//! # Own profile (requires auth)
//! GET   /users/me              - Profile
//! PATCH /users/me              - Update name, email or password
//!
//! # Recipes (requires auth)
//! GET    /recipes              - List, optional ?tags=1,2&ingredients=3
//! POST   /recipes              - Create
//! GET    /recipes/{id}         - Detail
//! PATCH  /recipes/{id}         - Partial update
//! PUT    /recipes/{id}         - Full update
//! DELETE /recipes/{id}         - Delete
//!
//! # Tags and ingredients (requires auth)
//! GET    /tags                 - List, optional ?assigned_only=1
//! POST   /tags                 - Create
//! GET    /tags/{id}            - Detail
//! PATCH  /tags/{id}            - Rename
//! PUT    /tags/{id}            - Rename
//! DELETE /tags/{id}            - Delete
//! (same under /ingredients)
//! ```

pub mod extract;
pub mod labels;
pub mod recipes;
pub mod users;

use axum::{
    Extension, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{auth_rate_limiter, request_id_middleware};
use crate::models::LabelKind;
use crate::state::AppState;

/// Create the account routes router (registration and token issuance).
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::create))
        .route("/tokens", post(users::create_token))
}

/// Create the own-profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(users::me).patch(users::update_me))
}

/// Create the recipe routes router.
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(recipes::index).post(recipes::create))
        .route(
            "/recipes/{id}",
            get(recipes::show)
                .patch(recipes::update)
                .put(recipes::replace)
                .delete(recipes::destroy),
        )
}

/// Create the routes router for one label kind under `/{prefix}`.
pub fn label_routes(prefix: &str, kind: LabelKind) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/{prefix}"),
            get(labels::index).post(labels::create),
        )
        .route(
            &format!("/{prefix}/{{id}}"),
            get(labels::show)
                .patch(labels::update)
                .put(labels::replace)
                .delete(labels::destroy),
        )
        .layer(Extension(kind))
}

/// Create the health check routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Build the complete application router.
///
/// `rate_limit` wraps the account routes in the per-IP limiter. The limiter
/// needs the client address, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn build_router(state: AppState, rate_limit: bool) -> Router {
    let mut accounts = account_routes();
    if rate_limit {
        accounts = accounts.layer(auth_rate_limiter());
    }

    Router::new()
        .merge(health_routes())
        .merge(accounts)
        .merge(profile_routes())
        .merge(recipe_routes())
        .merge(label_routes("tags", LabelKind::Tag))
        .merge(label_routes("ingredients", LabelKind::Ingredient))
        .with_state(state)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
