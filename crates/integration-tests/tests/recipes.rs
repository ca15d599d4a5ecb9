//! Recipe CRUD, filtering and owner isolation tests.

use axum::http::StatusCode;
use recipe_catalog_core::RecipeId;
use recipe_catalog_integration_tests::{TestApp, id_of, names_of};
use serde_json::{Value, json};

fn tag_names(recipe: &Value) -> Vec<String> {
    names_of(&recipe["tags"])
}

fn recipe_id(recipe: &Value) -> RecipeId {
    RecipeId::new(i32::try_from(id_of(recipe)).expect("id fits in i32"))
}

// ============================================================================
// Create & read
// ============================================================================

#[tokio::test]
async fn test_create_recipe_returns_detail() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;

    let response = app
        .post(
            "/recipes",
            &token,
            &json!({
                "title": "Chai",
                "time_minutes": 5,
                "price": "5.50",
                "description": "Spiced tea",
                "link": "https://example.com/chai",
                "tags": [{"name": "Drinks"}],
                "ingredients": [{"name": "Tea"}, {"name": "Milk"}],
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    let body = &response.body;
    assert_eq!(body["title"], "Chai");
    assert_eq!(body["time_minutes"], 5);
    assert_eq!(body["price"], "5.50");
    assert_eq!(body["description"], "Spiced tea");
    assert_eq!(body["link"], "https://example.com/chai");
    assert_eq!(body["image"], Value::Null);
    assert_eq!(tag_names(body), vec!["Drinks"]);
    assert_eq!(names_of(&body["ingredients"]), vec!["Tea", "Milk"]);
}

#[tokio::test]
async fn test_list_recipes_newest_first_without_description() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    app.create_recipe(&token, "First", &[]).await;
    app.create_recipe(&token, "Second", &[]).await;

    let response = app.get("/recipes", &token).await;

    assert_eq!(response.status, StatusCode::OK);
    let list = response.body.as_array().expect("array");
    let titles: Vec<&str> = list.iter().filter_map(|r| r["title"].as_str()).collect();
    assert_eq!(titles, vec!["Second", "First"]);
    assert!(list[0].get("description").is_none());
    assert!(list[0].get("image").is_none());
}

#[tokio::test]
async fn test_create_recipe_validation_errors() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;

    let cases = [
        json!({"title": "", "time_minutes": 5, "price": "1.00"}),
        json!({"title": "T", "time_minutes": -1, "price": "1.00"}),
        json!({"title": "T", "time_minutes": 5, "price": "-1.00"}),
        json!({"title": "T", "time_minutes": 5, "price": "1.005"}),
        json!({"title": "T", "time_minutes": 5}),
        json!({"title": "x".repeat(256), "time_minutes": 5, "price": "1.00"}),
    ];

    for body in &cases {
        let response = app.post("/recipes", &token, body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert!(response.body["error"].is_string());
    }

    let list = app.get("/recipes", &token).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_nul_characters_are_bad_request() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Soup", &[]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    let cases = [
        json!({"title": "a\u{0}b", "time_minutes": 5, "price": "1.00"}),
        json!({"title": "T", "time_minutes": 5, "price": "1.00", "description": "\u{0}"}),
        json!({"title": "T", "time_minutes": 5, "price": "1.00", "tags": [{"name": "x\u{0}y"}]}),
    ];
    for body in &cases {
        let created = app.post("/recipes", &token, body).await;
        assert_eq!(created.status, StatusCode::BAD_REQUEST, "{body}");
    }

    let patched = app
        .patch(&uri, &token, &json!({"link": "https://example.com/\u{0}"}))
        .await;
    assert_eq!(patched.status, StatusCode::BAD_REQUEST);

    let tag = app.post("/tags", &token, &json!({"name": "\u{0}"})).await;
    assert_eq!(tag.status, StatusCode::BAD_REQUEST);

    let list = app.get("/recipes", &token).await;
    assert_eq!(list.body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/recipes")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("Failed to build request");
    let response = app.send_request(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;

    let response = app.get("/recipes/abc", &token).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Owner isolation
// ============================================================================

#[tokio::test]
async fn test_other_users_recipes_are_invisible() {
    let app = TestApp::new();
    let owner = app.login_as("owner@example.com").await;
    let other = app.login_as("other@example.com").await;
    let recipe = app.create_recipe(&owner, "Private", &["Secret"]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    assert_eq!(app.get("/recipes", &other).await.body, json!([]));
    assert_eq!(app.get("/tags", &other).await.body, json!([]));
    assert_eq!(app.get(&uri, &other).await.status, StatusCode::NOT_FOUND);

    let patch = app.patch(&uri, &other, &json!({"title": "Stolen"})).await;
    assert_eq!(patch.status, StatusCode::NOT_FOUND);

    let put = app
        .put(
            &uri,
            &other,
            &json!({"title": "Stolen", "time_minutes": 1, "price": "1.00"}),
        )
        .await;
    assert_eq!(put.status, StatusCode::NOT_FOUND);

    assert_eq!(app.delete(&uri, &other).await.status, StatusCode::NOT_FOUND);

    let still_there = app.get(&uri, &owner).await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["title"], "Private");
}

#[tokio::test]
async fn test_user_field_in_payload_is_ignored() {
    let app = TestApp::new();
    let owner = app.login_as("owner@example.com").await;
    let other = app.login_as("other@example.com").await;
    let other_id = id_of(&app.get("/users/me", &other).await.body);
    let recipe = app.create_recipe(&owner, "Mine", &[]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    let response = app
        .patch(&uri, &owner, &json!({"user": other_id, "title": "Still mine"}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Still mine");
    assert_eq!(app.get(&uri, &owner).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, &other).await.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Tag and ingredient associations
// ============================================================================

#[tokio::test]
async fn test_existing_tag_is_reused_by_name() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let indian = app.post("/tags", &token, &json!({"name": "Indian"})).await;
    assert_eq!(indian.status, StatusCode::CREATED);

    let recipe = app
        .create_recipe(&token, "Thai Prawn Curry", &["Indian", "Breakfast"])
        .await;

    let tags = recipe["tags"].as_array().expect("array");
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().any(|t| t["id"] == indian.body["id"]));

    let all_tags = app.get("/tags", &token).await;
    assert_eq!(names_of(&all_tags.body), vec!["Indian", "Breakfast"]);
}

#[tokio::test]
async fn test_duplicate_names_in_payload_attach_once() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;

    let recipe = app
        .create_recipe(&token, "Dal", &["Vegan", " Vegan ", "Vegan"])
        .await;

    assert_eq!(tag_names(&recipe), vec!["Vegan"]);
    assert_eq!(names_of(&app.get("/tags", &token).await.body), vec!["Vegan"]);
}

#[tokio::test]
async fn test_patch_with_empty_tags_clears_associations_only() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Curry", &["Spicy"]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    let response = app.patch(&uri, &token, &json!({"tags": []})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["tags"], json!([]));

    // The tag row survives without the association
    let tags = app.get("/tags", &token).await;
    assert_eq!(names_of(&tags.body), vec!["Spicy"]);
    let assigned = app.get("/tags?assigned_only=1", &token).await;
    assert_eq!(assigned.body, json!([]));
}

#[tokio::test]
async fn test_patch_without_tags_preserves_associations() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Curry", &["Spicy"]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    let response = app.patch(&uri, &token, &json!({"title": "Mild Curry"})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Mild Curry");
    assert_eq!(tag_names(&response.body), vec!["Spicy"]);
}

#[tokio::test]
async fn test_patch_replaces_tags_with_new_set() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Curry", &["Spicy"]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    let response = app
        .patch(&uri, &token, &json!({"tags": [{"name": "Lunch"}]}))
        .await;

    assert_eq!(tag_names(&response.body), vec!["Lunch"]);
}

// ============================================================================
// Full update
// ============================================================================

#[tokio::test]
async fn test_put_replaces_scalars_and_keeps_omitted_relations() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let created = app
        .post(
            "/recipes",
            &token,
            &json!({
                "title": "Spaghetti",
                "time_minutes": 25,
                "price": "5.00",
                "description": "Classic",
                "link": "https://example.com/pasta",
                "tags": [{"name": "Dinner"}],
            }),
        )
        .await;
    let uri = format!("/recipes/{}", id_of(&created.body));

    let response = app
        .put(
            &uri,
            &token,
            &json!({"title": "Carbonara", "time_minutes": 30, "price": "7.25"}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = &response.body;
    assert_eq!(body["title"], "Carbonara");
    assert_eq!(body["time_minutes"], 30);
    assert_eq!(body["price"], "7.25");
    assert_eq!(body["description"], Value::Null);
    assert_eq!(body["link"], Value::Null);
    assert_eq!(tag_names(body), vec!["Dinner"]);
}

#[tokio::test]
async fn test_put_requires_all_scalar_fields() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Soup", &[]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    let response = app.put(&uri, &token, &json!({"title": "Stew"})).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get(&uri, &token).await.body["title"], "Soup");
}

#[tokio::test]
async fn test_image_is_read_only() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Pie", &[]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));
    app.store
        .set_recipe_image(recipe_id(&recipe), Some("uploads/recipe/pie.jpg".to_owned()))
        .await;

    let response = app
        .patch(&uri, &token, &json!({"image": "hacked.jpg", "title": "Apple Pie"}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["image"], "uploads/recipe/pie.jpg");
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_recipe_keeps_its_tags() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Toast", &["Breakfast"]).await;
    let uri = format!("/recipes/{}", id_of(&recipe));

    let response = app.delete(&uri, &token).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, &token).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, &token).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        names_of(&app.get("/tags", &token).await.body),
        vec!["Breakfast"]
    );
}

// ============================================================================
// Filtering
// ============================================================================

#[tokio::test]
async fn test_filter_by_tags_and_ingredients() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let curry = app.create_recipe(&token, "Curry", &["Vegan"]).await;
    let fish = app.create_recipe(&token, "Fish", &["Pescatarian"]).await;
    app.create_recipe(&token, "Plain", &[]).await;
    let vegan_id = curry["tags"][0]["id"].clone();
    let fish_tag_id = fish["tags"][0]["id"].clone();

    let one = app.get(&format!("/recipes?tags={vegan_id}"), &token).await;
    let titles: Vec<&str> = one
        .body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|r| r["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Curry"]);

    let both = app
        .get(&format!("/recipes?tags={vegan_id},{fish_tag_id}"), &token)
        .await;
    assert_eq!(both.body.as_array().map(Vec::len), Some(2));

    let blank = app.get("/recipes?tags=", &token).await;
    assert_eq!(blank.body.as_array().map(Vec::len), Some(3));

    let bad = app.get("/recipes?tags=1,x", &token).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_filter_by_ingredients() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let salad = app
        .post(
            "/recipes",
            &token,
            &json!({
                "title": "Salad",
                "time_minutes": 5,
                "price": "3.00",
                "ingredients": [{"name": "Lettuce"}],
            }),
        )
        .await;
    app.create_recipe(&token, "Toast", &[]).await;
    let lettuce_id = salad.body["ingredients"][0]["id"].clone();

    let response = app
        .get(&format!("/recipes?ingredients={lettuce_id}"), &token)
        .await;

    let list = response.body.as_array().expect("array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Salad");
}
