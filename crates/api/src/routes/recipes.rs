//! Recipe route handlers.
//!
//! The owner always comes from the bearer token. A `user` key in any payload
//! is ignored.

use axum::{extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use recipe_catalog_core::{IngredientId, Patch, Price, RecipeId, TagId};

use super::extract::{Json, Path, Query};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Ingredient, Recipe, RecipeFields, RecipeFilter, RecipeUpdate, Tag};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// A nested tag or ingredient reference, `{"name": "..."}`.
#[derive(Debug, Deserialize)]
pub struct NameRef {
    pub name: String,
}

fn names(refs: Patch<Vec<NameRef>>) -> Patch<Vec<String>> {
    refs.map(|list| list.into_iter().map(|r| r.name).collect())
}

/// Create (`POST`) and full replace (`PUT`) payload.
#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Patch<Vec<NameRef>>,
    #[serde(default)]
    pub ingredients: Patch<Vec<NameRef>>,
}

impl From<RecipeRequest> for RecipeFields {
    fn from(req: RecipeRequest) -> Self {
        Self {
            title: req.title,
            time_minutes: req.time_minutes,
            price: req.price,
            description: req.description,
            link: req.link,
            tags: names(req.tags),
            ingredients: names(req.ingredients),
        }
    }
}

/// Partial update (`PATCH`) payload.
#[derive(Debug, Deserialize)]
pub struct RecipePatchRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub time_minutes: Patch<i64>,
    #[serde(default)]
    pub price: Patch<Decimal>,
    #[serde(default)]
    pub description: Patch<Option<String>>,
    #[serde(default)]
    pub link: Patch<Option<String>>,
    #[serde(default)]
    pub tags: Patch<Vec<NameRef>>,
    #[serde(default)]
    pub ingredients: Patch<Vec<NameRef>>,
}

impl From<RecipePatchRequest> for RecipeUpdate {
    fn from(req: RecipePatchRequest) -> Self {
        Self {
            title: req.title,
            time_minutes: req.time_minutes,
            price: req.price,
            description: req.description,
            link: req.link,
            tags: names(req.tags),
            ingredients: names(req.ingredients),
        }
    }
}

/// `GET /recipes` query: comma-separated label IDs.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    fn into_filter(self) -> Result<RecipeFilter> {
        Ok(RecipeFilter {
            tags: parse_ids::<TagId>("tags", self.tags.as_deref())?,
            ingredients: parse_ids::<IngredientId>("ingredients", self.ingredients.as_deref())?,
        })
    }
}

/// Parse `1,2,3` into IDs. A missing or blank parameter means no restriction.
fn parse_ids<T: From<i32>>(key: &str, raw: Option<&str>) -> Result<Option<Vec<T>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    raw.split(',')
        .map(|part| {
            part.trim().parse::<i32>().map(T::from).map_err(|_| {
                AppError::BadRequest(format!("{key} must be a comma-separated list of ids"))
            })
        })
        .collect::<Result<Vec<T>>>()
        .map(Some)
}

// =============================================================================
// Response Types
// =============================================================================

/// List representation of a recipe.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
        }
    }
}

/// Detail representation: the list fields plus description and image.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: RecipeId,
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub link: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl From<Recipe> for RecipeDetail {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags,
            ingredients: recipe.ingredients,
            description: recipe.description,
            image: recipe.image,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /recipes`
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeSummary>>> {
    let filter = query.into_filter()?;
    let recipes = state.catalog().list_recipes(user.id, &filter).await?;

    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}

/// `POST /recipes`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetail>)> {
    let recipe = state.catalog().create_recipe(user.id, req.into()).await?;

    Ok((StatusCode::CREATED, Json(recipe.into())))
}

/// `GET /recipes/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeDetail>> {
    let recipe = state.catalog().get_recipe(user.id, id).await?;

    Ok(Json(recipe.into()))
}

/// `PATCH /recipes/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    Json(req): Json<RecipePatchRequest>,
) -> Result<Json<RecipeDetail>> {
    let recipe = state
        .catalog()
        .update_recipe(user.id, id, req.into())
        .await?;

    Ok(Json(recipe.into()))
}

/// `PUT /recipes/{id}`
pub async fn replace(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    Json(req): Json<RecipeRequest>,
) -> Result<Json<RecipeDetail>> {
    let recipe = state
        .catalog()
        .replace_recipe(user.id, id, req.into())
        .await?;

    Ok(Json(recipe.into()))
}

/// `DELETE /recipes/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    state.catalog().delete_recipe(user.id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
