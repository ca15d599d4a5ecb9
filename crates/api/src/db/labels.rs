//! `PostgreSQL` tag and ingredient queries.
//!
//! Tags and ingredients share one table layout, so every query here is built
//! from the [`LabelKind`]'s table names. The names are compile-time constants,
//! never user input.

use std::collections::HashMap;

use sqlx::{Connection, PgConnection, PgExecutor};

use recipe_catalog_core::UserId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Label, LabelKind};

/// Table and column names for one label kind.
struct Tables {
    label: &'static str,
    join: &'static str,
    join_column: &'static str,
}

const fn tables(kind: LabelKind) -> Tables {
    match kind {
        LabelKind::Tag => Tables {
            label: "catalog.tag",
            join: "catalog.recipe_tag",
            join_column: "tag_id",
        },
        LabelKind::Ingredient => Tables {
            label: "catalog.ingredient",
            join: "catalog.recipe_ingredient",
            join_column: "ingredient_id",
        },
    }
}

#[derive(sqlx::FromRow)]
struct LabelRow {
    id: i32,
    name: String,
}

impl From<LabelRow> for Label {
    fn from(row: LabelRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttachedLabelRow {
    recipe_id: i32,
    id: i32,
    name: String,
}

pub(super) async fn list(
    executor: impl PgExecutor<'_>,
    owner: UserId,
    kind: LabelKind,
    assigned_only: bool,
) -> Result<Vec<Label>, RepositoryError> {
    let t = tables(kind);
    let sql = if assigned_only {
        format!(
            "SELECT DISTINCT l.id, l.name
             FROM {label} l
             JOIN {join} j ON j.{col} = l.id
             JOIN catalog.recipe r ON r.id = j.recipe_id AND r.user_id = l.user_id
             WHERE l.user_id = $1
             ORDER BY l.name DESC",
            label = t.label,
            join = t.join,
            col = t.join_column,
        )
    } else {
        format!(
            "SELECT id, name FROM {} WHERE user_id = $1 ORDER BY name DESC",
            t.label
        )
    };

    let rows = sqlx::query_as::<_, LabelRow>(&sql)
        .bind(owner.as_i32())
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(Label::from).collect())
}

pub(super) async fn get(
    executor: impl PgExecutor<'_>,
    owner: UserId,
    kind: LabelKind,
    id: i32,
) -> Result<Option<Label>, RepositoryError> {
    let sql = format!(
        "SELECT id, name FROM {} WHERE id = $1 AND user_id = $2",
        tables(kind).label
    );
    let row = sqlx::query_as::<_, LabelRow>(&sql)
        .bind(id)
        .bind(owner.as_i32())
        .fetch_optional(executor)
        .await?;

    Ok(row.map(Label::from))
}

pub(super) async fn find_by_name(
    executor: impl PgExecutor<'_>,
    owner: UserId,
    kind: LabelKind,
    name: &str,
) -> Result<Option<Label>, RepositoryError> {
    let sql = format!(
        "SELECT id, name FROM {} WHERE user_id = $1 AND name = $2",
        tables(kind).label
    );
    let row = sqlx::query_as::<_, LabelRow>(&sql)
        .bind(owner.as_i32())
        .bind(name)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(Label::from))
}

pub(super) async fn insert(
    executor: impl PgExecutor<'_>,
    owner: UserId,
    kind: LabelKind,
    name: &str,
) -> Result<Label, RepositoryError> {
    let sql = format!(
        "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, name",
        tables(kind).label
    );
    let row = sqlx::query_as::<_, LabelRow>(&sql)
        .bind(owner.as_i32())
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_unique(e, kind.noun()))?;

    Ok(row.into())
}

pub(super) async fn rename(
    executor: impl PgExecutor<'_>,
    owner: UserId,
    kind: LabelKind,
    id: i32,
    name: &str,
) -> Result<Label, RepositoryError> {
    let sql = format!(
        "UPDATE {} SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING id, name",
        tables(kind).label
    );
    let row = sqlx::query_as::<_, LabelRow>(&sql)
        .bind(id)
        .bind(owner.as_i32())
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(|e| conflict_on_unique(e, kind.noun()))?
        .ok_or(RepositoryError::NotFound)?;

    Ok(row.into())
}

pub(super) async fn delete(
    executor: impl PgExecutor<'_>,
    owner: UserId,
    kind: LabelKind,
    id: i32,
) -> Result<(), RepositoryError> {
    let sql = format!(
        "DELETE FROM {} WHERE id = $1 AND user_id = $2",
        tables(kind).label
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(owner.as_i32())
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Return the owner's label with this name, creating it if needed.
///
/// The insert runs inside a savepoint. If a concurrent transaction inserted
/// the same (owner, name) first, the unique violation rolls back only the
/// savepoint and the winner's row is read instead.
pub(super) async fn get_or_create(
    conn: &mut PgConnection,
    owner: UserId,
    kind: LabelKind,
    name: &str,
) -> Result<Label, RepositoryError> {
    if let Some(label) = find_by_name(&mut *conn, owner, kind, name).await? {
        return Ok(label);
    }

    let mut savepoint = conn.begin().await?;
    match insert(&mut *savepoint, owner, kind, name).await {
        Ok(label) => {
            savepoint.commit().await?;
            Ok(label)
        }
        Err(RepositoryError::Conflict(_)) => {
            savepoint.rollback().await?;
            tracing::debug!(kind = kind.noun(), "label created concurrently, re-reading");
            find_by_name(&mut *conn, owner, kind, name)
                .await?
                .ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "{} vanished after unique violation",
                        kind.noun()
                    ))
                })
        }
        Err(e) => Err(e),
    }
}

/// Replace every association between a recipe and labels of one kind.
///
/// Names resolve by get-or-create; repeated names attach once. Names are
/// resolved in sorted order so that concurrent writers creating the same
/// labels take the (owner, name) uniqueness locks in the same order and
/// cannot deadlock.
pub(super) async fn replace_links(
    conn: &mut PgConnection,
    owner: UserId,
    kind: LabelKind,
    recipe_id: i32,
    names: &[String],
) -> Result<(), RepositoryError> {
    let mut ordered: Vec<&str> = names.iter().map(String::as_str).collect();
    ordered.sort_unstable();
    ordered.dedup();

    let mut ids = Vec::with_capacity(ordered.len());
    for name in ordered {
        let label = get_or_create(&mut *conn, owner, kind, name).await?;
        if !ids.contains(&label.id) {
            ids.push(label.id);
        }
    }

    let t = tables(kind);
    sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = $1", t.join))
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if !ids.is_empty() {
        let sql = format!(
            "INSERT INTO {join} (recipe_id, {col})
             SELECT $1, UNNEST($2::int4[])
             ON CONFLICT DO NOTHING",
            join = t.join,
            col = t.join_column,
        );
        sqlx::query(&sql)
            .bind(recipe_id)
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Load the labels of one kind attached to each recipe, ordered by label ID.
pub(super) async fn attached(
    executor: impl PgExecutor<'_>,
    kind: LabelKind,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<Label>>, RepositoryError> {
    let t = tables(kind);
    let sql = format!(
        "SELECT j.recipe_id, l.id, l.name
         FROM {join} j
         JOIN {label} l ON l.id = j.{col}
         WHERE j.recipe_id = ANY($1)
         ORDER BY l.id",
        join = t.join,
        label = t.label,
        col = t.join_column,
    );
    let rows = sqlx::query_as::<_, AttachedLabelRow>(&sql)
        .bind(recipe_ids)
        .fetch_all(executor)
        .await?;

    let mut by_recipe: HashMap<i32, Vec<Label>> = HashMap::new();
    for row in rows {
        by_recipe.entry(row.recipe_id).or_default().push(Label {
            id: row.id,
            name: row.name,
        });
    }
    Ok(by_recipe)
}
