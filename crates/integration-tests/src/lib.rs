//! Integration tests for the recipe catalog API.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests over the in-memory store
//! cargo test -p recipe-catalog-integration-tests
//!
//! # PostgreSQL store tests (needs DATABASE_URL)
//! cargo test -p recipe-catalog-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `accounts` - Registration, tokens and the own profile
//! - `recipes` - Recipe CRUD, filtering and owner isolation
//! - `labels` - Tag and ingredient CRUD and `assigned_only`
//! - `health` - Liveness, readiness and request IDs
//! - `postgres_store` - `PgStore` against a real database
//!
//! [`TestApp`] drives the full router with `tower::ServiceExt::oneshot`, so no
//! socket is bound and the per-IP rate limiter is left off.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use recipe_catalog_api::config::{CatalogConfig, DEFAULT_TOKEN_TTL_HOURS};
use recipe_catalog_api::db::MemoryStore;
use recipe_catalog_api::routes::build_router;
use recipe_catalog_api::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Password used by [`TestApp::login_as`].
pub const TEST_PASSWORD: &str = "testpass123";

/// Configuration for tests. The database URL is never dialed.
#[must_use]
pub fn test_config() -> CatalogConfig {
    CatalogConfig {
        database_url: SecretString::from("postgres://unused@localhost/unused"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A response with its body decoded.
///
/// JSON bodies become a [`Value`], other non-empty bodies a
/// `Value::String`, and empty bodies `Value::Null`.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The router wired to a fresh in-memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config(), store.clone());

        Self {
            router: build_router(state, false),
            store,
        }
    }

    /// Send one request through the router.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send_request(request).await
    }

    /// Send a pre-built request through the router.
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: &Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: &Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// `POST /users` without authentication.
    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        let body = json!({"email": email, "password": password, "name": "Test Name"});
        self.send(Method::POST, "/users", None, Some(&body)).await
    }

    /// `POST /tokens` without authentication.
    pub async fn request_token(&self, email: &str, password: &str) -> TestResponse {
        let body = json!({"email": email, "password": password});
        self.send(Method::POST, "/tokens", None, Some(&body)).await
    }

    /// Register `email` with [`TEST_PASSWORD`] and return a bearer token.
    pub async fn login_as(&self, email: &str) -> String {
        let registered = self.register(email, TEST_PASSWORD).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);

        let issued = self.request_token(email, TEST_PASSWORD).await;
        assert_eq!(issued.status, StatusCode::OK, "{:?}", issued.body);

        issued.body["token"]
            .as_str()
            .expect("token missing from response")
            .to_owned()
    }

    /// Create a recipe with the given tag names and return its JSON.
    pub async fn create_recipe(&self, token: &str, title: &str, tags: &[&str]) -> Value {
        let tags: Vec<Value> = tags.iter().map(|name| json!({"name": name})).collect();
        let body = json!({
            "title": title,
            "time_minutes": 10,
            "price": "5.00",
            "tags": tags,
        });

        let response = self.post("/recipes", token, &body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }
}

/// The `id` field of a JSON object.
#[must_use]
pub fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().expect("id missing from response")
}

/// The `name` fields of a JSON array of labels, in order.
#[must_use]
pub fn names_of(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("expected a JSON array")
        .iter()
        .filter_map(|label| label["name"].as_str().map(str::to_owned))
        .collect()
}
