//! Tag and ingredient route handlers.
//!
//! Both resources share these handlers. The router attaches the
//! [`LabelKind`] as a request extension.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;

use recipe_catalog_core::Patch;

use super::extract::{Json, Path, Query};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Label, LabelKind};
use crate::state::AppState;

/// `GET /tags` and `GET /ingredients` query.
#[derive(Debug, Default, Deserialize)]
pub struct LabelListQuery {
    pub assigned_only: Option<String>,
}

/// Create (`POST`) and replace (`PUT`) payload.
#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub name: String,
}

/// Partial update (`PATCH`) payload.
#[derive(Debug, Deserialize)]
pub struct LabelPatchRequest {
    #[serde(default)]
    pub name: Patch<String>,
}

/// Parse a boolean query flag: `1`/`0`, `true`/`false`, or absent.
fn parse_flag(key: &str, raw: Option<&str>) -> Result<bool> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => Ok(true),
        Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => Ok(false),
        Some(_) => Err(AppError::BadRequest(format!(
            "{key} must be one of 1, 0, true, false"
        ))),
    }
}

/// `GET /{kind}s`
pub async fn index(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<LabelListQuery>,
) -> Result<Json<Vec<Label>>> {
    let assigned_only = parse_flag("assigned_only", query.assigned_only.as_deref())?;
    let labels = state
        .catalog()
        .list_labels(user.id, kind, assigned_only)
        .await?;

    Ok(Json(labels))
}

/// `POST /{kind}s`
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<LabelRequest>,
) -> Result<(StatusCode, Json<Label>)> {
    let label = state
        .catalog()
        .create_label(user.id, kind, &req.name)
        .await?;

    Ok((StatusCode::CREATED, Json(label)))
}

/// `GET /{kind}s/{id}`
pub async fn show(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Label>> {
    let label = state.catalog().get_label(user.id, kind, id).await?;

    Ok(Json(label))
}

/// `PATCH /{kind}s/{id}`
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Json(req): Json<LabelPatchRequest>,
) -> Result<Json<Label>> {
    let catalog = state.catalog();
    let label = match req.name {
        Patch::Set(name) => catalog.rename_label(user.id, kind, id, &name).await?,
        Patch::Unset => catalog.get_label(user.id, kind, id).await?,
    };

    Ok(Json(label))
}

/// `PUT /{kind}s/{id}`
pub async fn replace(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Json(req): Json<LabelRequest>,
) -> Result<Json<Label>> {
    let label = state
        .catalog()
        .rename_label(user.id, kind, id, &req.name)
        .await?;

    Ok(Json(label))
}

/// `DELETE /{kind}s/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<LabelKind>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    state.catalog().delete_label(user.id, kind, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("assigned_only", None).unwrap());
        assert!(parse_flag("assigned_only", Some("1")).unwrap());
        assert!(parse_flag("assigned_only", Some("TRUE")).unwrap());
        assert!(!parse_flag("assigned_only", Some("0")).unwrap());
        assert!(!parse_flag("assigned_only", Some("false")).unwrap());
        assert!(matches!(
            parse_flag("assigned_only", Some("yes")),
            Err(AppError::BadRequest(_))
        ));
    }
}
