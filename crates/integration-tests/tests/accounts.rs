//! Registration, token issuance and own-profile tests.

use axum::http::{Method, StatusCode};
use recipe_catalog_core::UserId;
use recipe_catalog_integration_tests::{TEST_PASSWORD, TestApp, id_of};
use serde_json::json;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_returns_public_fields_only() {
    let app = TestApp::new();

    let response = app.register("test@example.com", TEST_PASSWORD).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "test@example.com");
    assert_eq!(response.body["name"], "Test Name");
    assert!(response.body["id"].is_i64());
    assert!(response.body.get("password").is_none());
    assert!(response.body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_normalizes_email_domain() {
    let app = TestApp::new();

    let response = app.register("Test2@Example.COM", TEST_PASSWORD).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "Test2@example.com");

    // Logging in with a differently-cased domain finds the same account
    let issued = app.request_token("Test2@EXAMPLE.com", TEST_PASSWORD).await;
    assert_eq!(issued.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_email_is_rejected() {
    let app = TestApp::new();
    app.register("dup@example.com", TEST_PASSWORD).await;

    let response = app.register("dup@EXAMPLE.com", TEST_PASSWORD).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_register_rejects_short_password_and_bad_email() {
    let app = TestApp::new();

    let short = app.register("short@example.com", "pw").await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let invalid = app.register("not-an-email", TEST_PASSWORD).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let nul = app.register("nul\u{0}@example.com", TEST_PASSWORD).await;
    assert_eq!(nul.status, StatusCode::BAD_REQUEST);

    // Neither attempt created an account
    let issued = app.request_token("short@example.com", "pw").await;
    assert_eq!(issued.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_missing_fields() {
    let app = TestApp::new();

    let response = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(&json!({"email": "x@example.com"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

// ============================================================================
// Tokens
// ============================================================================

#[tokio::test]
async fn test_token_is_issued_for_valid_credentials() {
    let app = TestApp::new();
    app.register("token@example.com", TEST_PASSWORD).await;

    let response = app.request_token("token@example.com", TEST_PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK);
    let token = response.body["token"].as_str().unwrap_or_default();
    assert_eq!(token.len(), 64);
    assert!(response.body["expires_at"].is_string());
}

#[tokio::test]
async fn test_credential_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.register("known@example.com", TEST_PASSWORD).await;

    let wrong_password = app.request_token("known@example.com", "wrongpass").await;
    let unknown_email = app.request_token("nobody@example.com", TEST_PASSWORD).await;
    let blank_password = app.request_token("known@example.com", "").await;

    assert_eq!(wrong_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body, blank_password.body);
    assert!(wrong_password.body.get("token").is_none());
}

#[tokio::test]
async fn test_inactive_user_cannot_log_in_or_use_token() {
    let app = TestApp::new();
    let token = app.login_as("inactive@example.com").await;
    let me = app.get("/users/me", &token).await;
    let user_id = i32::try_from(id_of(&me.body)).unwrap_or_default();

    app.store.deactivate_user(UserId::new(user_id)).await;

    let issued = app
        .request_token("inactive@example.com", TEST_PASSWORD)
        .await;
    assert_eq!(issued.status, StatusCode::BAD_REQUEST);

    let me = app.get("/users/me", &token).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    for uri in ["/users/me", "/recipes", "/tags", "/ingredients"] {
        let response = app.send(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(response.body["error"].is_string());
    }

    let bogus = app.get("/recipes", "not-a-real-token").await;
    assert_eq!(bogus.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_scheme_is_accepted() {
    let app = TestApp::new();
    let token = app.login_as("scheme@example.com").await;

    let request = axum::http::Request::builder()
        .uri("/users/me")
        .header("authorization", format!("Token {token}"))
        .body(axum::body::Body::empty())
        .expect("Failed to build request");
    let response = app.send_request(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], "scheme@example.com");
}

// ============================================================================
// Own profile
// ============================================================================

#[tokio::test]
async fn test_update_profile_name_and_password() {
    let app = TestApp::new();
    let token = app.login_as("profile@example.com").await;

    let response = app
        .patch(
            "/users/me",
            &token,
            &json!({"name": "Updated", "password": "newpassword"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Updated");
    assert_eq!(response.body["email"], "profile@example.com");

    let old = app.request_token("profile@example.com", TEST_PASSWORD).await;
    assert_eq!(old.status, StatusCode::BAD_REQUEST);

    let new = app.request_token("profile@example.com", "newpassword").await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile_rejects_taken_email() {
    let app = TestApp::new();
    app.register("taken@example.com", TEST_PASSWORD).await;
    let token = app.login_as("mover@example.com").await;

    let response = app
        .patch("/users/me", &token, &json!({"email": "taken@example.com"}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_profile_with_empty_body_changes_nothing() {
    let app = TestApp::new();
    let token = app.login_as("noop@example.com").await;

    let response = app.patch("/users/me", &token, &json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Test Name");
}
