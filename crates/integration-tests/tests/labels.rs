//! Tag and ingredient endpoint tests.

use axum::http::StatusCode;
use recipe_catalog_api::models::LabelKind;
use recipe_catalog_integration_tests::{TestApp, id_of, names_of};
use serde_json::json;

#[tokio::test]
async fn test_labels_are_listed_by_name_descending() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    for name in ["Apple", "Cherry", "Banana"] {
        let response = app.post("/ingredients", &token, &json!({"name": name})).await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["name"], name);
    }

    let response = app.get("/ingredients", &token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(names_of(&response.body), vec!["Cherry", "Banana", "Apple"]);
}

#[tokio::test]
async fn test_assigned_only_lists_each_label_once() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    app.create_recipe(&token, "Eggs", &["Breakfast"]).await;
    app.create_recipe(&token, "Porridge", &["Breakfast"]).await;
    app.post("/tags", &token, &json!({"name": "Lunch"})).await;

    let assigned = app.get("/tags?assigned_only=1", &token).await;
    assert_eq!(assigned.status, StatusCode::OK);
    assert_eq!(names_of(&assigned.body), vec!["Breakfast"]);

    let all = app.get("/tags?assigned_only=0", &token).await;
    assert_eq!(names_of(&all.body), vec!["Lunch", "Breakfast"]);

    let invalid = app.get("/tags?assigned_only=maybe", &token).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assigned_only_ignores_other_owners_recipes() {
    let app = TestApp::new();
    let mine = app.login_as("mine@example.com").await;
    let theirs = app.login_as("theirs@example.com").await;
    app.post("/tags", &mine, &json!({"name": "Dinner"})).await;
    app.create_recipe(&theirs, "Roast", &["Dinner"]).await;

    let assigned = app.get("/tags?assigned_only=1", &mine).await;

    assert_eq!(assigned.body, json!([]));
}

#[tokio::test]
async fn test_create_label_validation() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    app.post("/tags", &token, &json!({"name": "Vegan"})).await;

    let duplicate = app.post("/tags", &token, &json!({"name": "Vegan"})).await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

    let blank = app.post("/tags", &token, &json!({"name": "   "})).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let missing = app.post("/tags", &token, &json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.label_count(LabelKind::Tag).await, 1);
}

#[tokio::test]
async fn test_same_name_is_allowed_for_different_owners() {
    let app = TestApp::new();
    let first = app.login_as("first@example.com").await;
    let second = app.login_as("second@example.com").await;

    let a = app.post("/tags", &first, &json!({"name": "Vegan"})).await;
    let b = app.post("/tags", &second, &json!({"name": "Vegan"})).await;

    assert_eq!(a.status, StatusCode::CREATED);
    assert_eq!(b.status, StatusCode::CREATED);
    assert_ne!(a.body["id"], b.body["id"]);
}

#[tokio::test]
async fn test_rename_label() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let tag = app.post("/tags", &token, &json!({"name": "Desert"})).await;
    let uri = format!("/tags/{}", id_of(&tag.body));

    let patched = app.patch(&uri, &token, &json!({"name": "Dessert"})).await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["name"], "Dessert");
    assert_eq!(patched.body["id"], tag.body["id"]);

    let unchanged = app.patch(&uri, &token, &json!({})).await;
    assert_eq!(unchanged.status, StatusCode::OK);
    assert_eq!(unchanged.body["name"], "Dessert");

    let put = app.put(&uri, &token, &json!({"name": "Sweets"})).await;
    assert_eq!(put.status, StatusCode::OK);
    assert_eq!(app.get(&uri, &token).await.body["name"], "Sweets");

    let put_missing = app.put(&uri, &token, &json!({})).await;
    assert_eq!(put_missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_renamed_tag_shows_on_recipes() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Cake", &["Desert"]).await;
    let tag_uri = format!("/tags/{}", recipe["tags"][0]["id"]);

    app.patch(&tag_uri, &token, &json!({"name": "Dessert"})).await;

    let detail = app
        .get(&format!("/recipes/{}", id_of(&recipe)), &token)
        .await;
    assert_eq!(names_of(&detail.body["tags"]), vec!["Dessert"]);
}

#[tokio::test]
async fn test_delete_label_detaches_from_recipes() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let recipe = app.create_recipe(&token, "Cake", &["Sweet", "Baked"]).await;
    let sweet = recipe["tags"]
        .as_array()
        .expect("array")
        .iter()
        .find(|t| t["name"] == "Sweet")
        .map(|t| t["id"].clone())
        .expect("Sweet tag attached");
    let tag_uri = format!("/tags/{sweet}");

    let response = app.delete(&tag_uri, &token).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&tag_uri, &token).await.status, StatusCode::NOT_FOUND);

    let detail = app
        .get(&format!("/recipes/{}", id_of(&recipe)), &token)
        .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(names_of(&detail.body["tags"]), vec!["Baked"]);
}

#[tokio::test]
async fn test_other_users_labels_are_invisible() {
    let app = TestApp::new();
    let owner = app.login_as("owner@example.com").await;
    let other = app.login_as("other@example.com").await;
    let tag = app.post("/ingredients", &owner, &json!({"name": "Saffron"})).await;
    let uri = format!("/ingredients/{}", id_of(&tag.body));

    assert_eq!(app.get("/ingredients", &other).await.body, json!([]));
    assert_eq!(app.get(&uri, &other).await.status, StatusCode::NOT_FOUND);

    let rename = app.patch(&uri, &other, &json!({"name": "Mine"})).await;
    assert_eq!(rename.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, &other).await.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get(&uri, &owner).await.body["name"], "Saffron");
}

#[tokio::test]
async fn test_tag_ids_are_not_ingredient_ids() {
    let app = TestApp::new();
    let token = app.login_as("chef@example.com").await;
    let tag = app.post("/tags", &token, &json!({"name": "Quick"})).await;

    let response = app
        .get(&format!("/ingredients/{}", id_of(&tag.body)), &token)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
