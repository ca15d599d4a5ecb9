//! `PostgreSQL` recipe queries.
//!
//! Each write runs in one transaction. Reads that touch several tables run in
//! a read-only `REPEATABLE READ` transaction so a recipe and its labels come
//! from the same snapshot.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Postgres, Transaction};

use recipe_catalog_core::{Patch, Price, RecipeId, UserId};

use super::{CatalogStore, PgStore, RepositoryError, labels};
use crate::models::{Label, LabelKind, Recipe, RecipeChanges, RecipeDraft, RecipeFilter};

const RECIPE_COLUMNS: &str =
    "id, user_id, title, time_minutes, price, description, link, image";

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: i32,
    user_id: i32,
    title: String,
    time_minutes: i32,
    price: Decimal,
    description: Option<String>,
    link: Option<String>,
    image: Option<String>,
}

impl RecipeRow {
    fn into_recipe(
        self,
        tags: Vec<Label>,
        ingredients: Vec<Label>,
    ) -> Result<Recipe, RepositoryError> {
        let price = Price::new(self.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Recipe {
            id: RecipeId::new(self.id),
            user_id: UserId::new(self.user_id),
            title: self.title,
            time_minutes: self.time_minutes,
            price,
            description: self.description,
            link: self.link,
            image: self.image,
            tags: tags.into_iter().map(Into::into).collect(),
            ingredients: ingredients.into_iter().map(Into::into).collect(),
        })
    }
}

async fn begin_snapshot(store: &PgStore) -> Result<Transaction<'static, Postgres>, RepositoryError> {
    let mut tx = store.pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Attach tags and ingredients to recipe rows, preserving row order.
async fn hydrate(
    conn: &mut PgConnection,
    rows: Vec<RecipeRow>,
) -> Result<Vec<Recipe>, RepositoryError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let mut tags = labels::attached(&mut *conn, LabelKind::Tag, &ids).await?;
    let mut ingredients = labels::attached(&mut *conn, LabelKind::Ingredient, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            row.into_recipe(
                tags.remove(&id).unwrap_or_default(),
                ingredients.remove(&id).unwrap_or_default(),
            )
        })
        .collect()
}

async fn fetch_owned(
    conn: &mut PgConnection,
    owner: UserId,
    id: RecipeId,
    lock: bool,
) -> Result<Option<RecipeRow>, RepositoryError> {
    let sql = format!(
        "SELECT {RECIPE_COLUMNS} FROM catalog.recipe WHERE id = $1 AND user_id = $2{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(id.as_i32())
        .bind(owner.as_i32())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn load_one(
    conn: &mut PgConnection,
    row: RecipeRow,
) -> Result<Recipe, RepositoryError> {
    hydrate(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| RepositoryError::DataCorruption("recipe row lost during load".to_owned()))
}

async fn apply_relations(
    conn: &mut PgConnection,
    owner: UserId,
    recipe_id: i32,
    tags: &Patch<Vec<String>>,
    ingredients: &Patch<Vec<String>>,
) -> Result<(), RepositoryError> {
    if let Patch::Set(names) = tags {
        labels::replace_links(&mut *conn, owner, LabelKind::Tag, recipe_id, names).await?;
    }
    if let Patch::Set(names) = ingredients {
        labels::replace_links(&mut *conn, owner, LabelKind::Ingredient, recipe_id, names).await?;
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let tag_ids: Option<Vec<i32>> = filter
            .tags
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.as_i32()).collect());
        let ingredient_ids: Option<Vec<i32>> = filter
            .ingredients
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.as_i32()).collect());

        let mut tx = begin_snapshot(self).await?;
        let sql = format!(
            "SELECT {RECIPE_COLUMNS}
             FROM catalog.recipe r
             WHERE r.user_id = $1
               AND ($2::int4[] IS NULL OR EXISTS (
                     SELECT 1 FROM catalog.recipe_tag rt
                     WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)))
               AND ($3::int4[] IS NULL OR EXISTS (
                     SELECT 1 FROM catalog.recipe_ingredient ri
                     WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)))
             ORDER BY r.id DESC"
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(owner.as_i32())
            .bind(tag_ids)
            .bind(ingredient_ids)
            .fetch_all(&mut *tx)
            .await?;

        let recipes = hydrate(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(recipes)
    }

    async fn get_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        let mut tx = begin_snapshot(self).await?;
        let recipe = match fetch_owned(&mut tx, owner, id, false).await? {
            Some(row) => Some(load_one(&mut tx, row).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(recipe)
    }

    async fn create_recipe(
        &self,
        owner: UserId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO catalog.recipe (user_id, title, time_minutes, price, description, link)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {RECIPE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(owner.as_i32())
            .bind(&draft.title)
            .bind(draft.time_minutes)
            .bind(draft.price.amount())
            .bind(&draft.description)
            .bind(&draft.link)
            .fetch_one(&mut *tx)
            .await?;

        apply_relations(&mut tx, owner, row.id, &draft.tags, &draft.ingredients).await?;
        let recipe = load_one(&mut tx, row).await?;
        tx.commit().await?;

        tracing::info!(recipe_id = %recipe.id, user_id = %owner, "recipe created");
        Ok(recipe)
    }

    async fn update_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
        changes: &RecipeChanges,
    ) -> Result<Recipe, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_owned(&mut tx, owner, id, true)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let row = if changes.scalars_unset() {
            current
        } else {
            let current_price = Price::new(current.price).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
            })?;
            let sql = format!(
                "UPDATE catalog.recipe
                 SET title = $3, time_minutes = $4, price = $5, description = $6, link = $7,
                     updated_at = NOW()
                 WHERE id = $1 AND user_id = $2
                 RETURNING {RECIPE_COLUMNS}"
            );
            sqlx::query_as::<_, RecipeRow>(&sql)
                .bind(id.as_i32())
                .bind(owner.as_i32())
                .bind(changes.title.clone().unwrap_or(current.title))
                .bind(changes.time_minutes.clone().unwrap_or(current.time_minutes))
                .bind(changes.price.clone().unwrap_or(current_price).amount())
                .bind(changes.description.clone().unwrap_or(current.description))
                .bind(changes.link.clone().unwrap_or(current.link))
                .fetch_one(&mut *tx)
                .await?
        };

        apply_relations(&mut tx, owner, row.id, &changes.tags, &changes.ingredients).await?;
        let recipe = load_one(&mut tx, row).await?;
        tx.commit().await?;

        tracing::info!(recipe_id = %id, user_id = %owner, "recipe updated");
        Ok(recipe)
    }

    async fn delete_recipe(&self, owner: UserId, id: RecipeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM catalog.recipe WHERE id = $1 AND user_id = $2")
            .bind(id.as_i32())
            .bind(owner.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tracing::info!(recipe_id = %id, user_id = %owner, "recipe deleted");
        Ok(())
    }

    async fn list_labels(
        &self,
        owner: UserId,
        kind: LabelKind,
        assigned_only: bool,
    ) -> Result<Vec<Label>, RepositoryError> {
        labels::list(&self.pool, owner, kind, assigned_only).await
    }

    async fn get_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<Option<Label>, RepositoryError> {
        labels::get(&self.pool, owner, kind, id).await
    }

    async fn create_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        name: &str,
    ) -> Result<Label, RepositoryError> {
        labels::insert(&self.pool, owner, kind, name).await
    }

    async fn rename_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
        name: &str,
    ) -> Result<Label, RepositoryError> {
        labels::rename(&self.pool, owner, kind, id, name).await
    }

    async fn delete_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<(), RepositoryError> {
        labels::delete(&self.pool, owner, kind, id).await
    }
}
