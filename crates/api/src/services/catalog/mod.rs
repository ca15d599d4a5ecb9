//! Catalog service.
//!
//! Validates recipe and label input, then delegates to the [`CatalogStore`].
//! Every call carries the owner explicitly.

mod error;

pub use error::CatalogError;

use recipe_catalog_core::{Patch, Price, RecipeId, UserId};
use rust_decimal::Decimal;

use crate::db::CatalogStore;
use crate::models::{
    Label, LabelKind, Recipe, RecipeChanges, RecipeDraft, RecipeFields, RecipeFilter, RecipeUpdate,
};

/// Maximum length of titles, links and label names, in characters.
const MAX_TEXT_LENGTH: usize = 255;

/// Catalog service.
pub struct CatalogService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> CatalogService<'a, S> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    /// List the owner's recipes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, CatalogError> {
        Ok(self.store.list_recipes(owner, filter).await?)
    }

    /// Get one of the owner's recipes.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the owner has no such recipe.
    pub async fn get_recipe(&self, owner: UserId, id: RecipeId) -> Result<Recipe, CatalogError> {
        self.store
            .get_recipe(owner, id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    /// Create a recipe.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if any field is rejected.
    pub async fn create_recipe(
        &self,
        owner: UserId,
        fields: RecipeFields,
    ) -> Result<Recipe, CatalogError> {
        let draft = validate_fields(fields)?;
        Ok(self.store.create_recipe(owner, &draft).await?)
    }

    /// Partially update a recipe. Only supplied fields change.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if any supplied field is rejected
    /// and `CatalogError::NotFound` if the owner has no such recipe.
    pub async fn update_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
        update: RecipeUpdate,
    ) -> Result<Recipe, CatalogError> {
        let changes = validate_update(update)?;
        Ok(self.store.update_recipe(owner, id, &changes).await?)
    }

    /// Replace a recipe. Omitted optional fields are cleared; omitted
    /// relation lists are kept.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_recipe`].
    pub async fn replace_recipe(
        &self,
        owner: UserId,
        id: RecipeId,
        fields: RecipeFields,
    ) -> Result<Recipe, CatalogError> {
        let changes = RecipeChanges::from(validate_fields(fields)?);
        Ok(self.store.update_recipe(owner, id, &changes).await?)
    }

    /// Delete a recipe. Its tags and ingredients are kept.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the owner has no such recipe.
    pub async fn delete_recipe(&self, owner: UserId, id: RecipeId) -> Result<(), CatalogError> {
        Ok(self.store.delete_recipe(owner, id).await?)
    }

    // =========================================================================
    // Tags and Ingredients
    // =========================================================================

    /// List the owner's labels of one kind.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_labels(
        &self,
        owner: UserId,
        kind: LabelKind,
        assigned_only: bool,
    ) -> Result<Vec<Label>, CatalogError> {
        Ok(self.store.list_labels(owner, kind, assigned_only).await?)
    }

    /// Get one of the owner's labels.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the owner has no such label.
    pub async fn get_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<Label, CatalogError> {
        self.store
            .get_label(owner, kind, id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    /// Create a label.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is rejected or already
    /// used by another of the owner's labels of this kind.
    pub async fn create_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        name: &str,
    ) -> Result<Label, CatalogError> {
        let name = validate_label_name(kind, name)?;
        Ok(self.store.create_label(owner, kind, &name).await?)
    }

    /// Rename a label.
    ///
    /// # Errors
    ///
    /// As [`Self::create_label`], plus `CatalogError::NotFound`.
    pub async fn rename_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
        name: &str,
    ) -> Result<Label, CatalogError> {
        let name = validate_label_name(kind, name)?;
        Ok(self.store.rename_label(owner, kind, id, &name).await?)
    }

    /// Delete a label, detaching it from every recipe.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the owner has no such label.
    pub async fn delete_label(
        &self,
        owner: UserId,
        kind: LabelKind,
        id: i32,
    ) -> Result<(), CatalogError> {
        Ok(self.store.delete_label(owner, kind, id).await?)
    }
}

fn validate_fields(fields: RecipeFields) -> Result<RecipeDraft, CatalogError> {
    Ok(RecipeDraft {
        title: validate_title(&fields.title)?,
        time_minutes: validate_time_minutes(fields.time_minutes)?,
        price: validate_price(fields.price)?,
        description: validate_description(fields.description)?,
        link: validate_link(fields.link)?,
        tags: validate_names(LabelKind::Tag, fields.tags)?,
        ingredients: validate_names(LabelKind::Ingredient, fields.ingredients)?,
    })
}

fn validate_update(update: RecipeUpdate) -> Result<RecipeChanges, CatalogError> {
    Ok(RecipeChanges {
        title: match update.title {
            Patch::Set(title) => Patch::Set(validate_title(&title)?),
            Patch::Unset => Patch::Unset,
        },
        time_minutes: match update.time_minutes {
            Patch::Set(minutes) => Patch::Set(validate_time_minutes(minutes)?),
            Patch::Unset => Patch::Unset,
        },
        price: match update.price {
            Patch::Set(price) => Patch::Set(validate_price(price)?),
            Patch::Unset => Patch::Unset,
        },
        description: match update.description {
            Patch::Set(description) => Patch::Set(validate_description(description)?),
            Patch::Unset => Patch::Unset,
        },
        link: match update.link {
            Patch::Set(link) => Patch::Set(validate_link(link)?),
            Patch::Unset => Patch::Unset,
        },
        tags: validate_names(LabelKind::Tag, update.tags)?,
        ingredients: validate_names(LabelKind::Ingredient, update.ingredients)?,
    })
}

/// Postgres text columns cannot hold U+0000.
fn reject_nul(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.contains('\0') {
        return Err(CatalogError::Validation(format!(
            "{field} cannot contain NUL characters"
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<String, CatalogError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CatalogError::Validation("title cannot be empty".to_owned()));
    }
    reject_nul("title", title)?;
    if title.chars().count() > MAX_TEXT_LENGTH {
        return Err(CatalogError::Validation(format!(
            "title must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(title.to_owned())
}

fn validate_time_minutes(minutes: i64) -> Result<i32, CatalogError> {
    if minutes < 0 {
        return Err(CatalogError::Validation(
            "time_minutes cannot be negative".to_owned(),
        ));
    }
    i32::try_from(minutes)
        .map_err(|_| CatalogError::Validation("time_minutes is too large".to_owned()))
}

fn validate_price(price: Decimal) -> Result<Price, CatalogError> {
    Price::new(price).map_err(|e| CatalogError::Validation(e.to_string()))
}

/// Descriptions are stored as given.
fn validate_description(description: Option<String>) -> Result<Option<String>, CatalogError> {
    if let Some(text) = &description {
        reject_nul("description", text)?;
    }
    Ok(description)
}

/// Trim a link; blank links are stored as absent.
fn validate_link(link: Option<String>) -> Result<Option<String>, CatalogError> {
    let Some(link) = link else {
        return Ok(None);
    };
    let link = link.trim();
    if link.is_empty() {
        return Ok(None);
    }
    reject_nul("link", link)?;
    if link.chars().count() > MAX_TEXT_LENGTH {
        return Err(CatalogError::Validation(format!(
            "link must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(Some(link.to_owned()))
}

fn validate_label_name(kind: LabelKind, name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::Validation(format!(
            "{} name cannot be empty",
            kind.noun()
        )));
    }
    reject_nul(&format!("{} name", kind.noun()), name)?;
    if name.chars().count() > MAX_TEXT_LENGTH {
        return Err(CatalogError::Validation(format!(
            "{} name must be at most {MAX_TEXT_LENGTH} characters",
            kind.noun()
        )));
    }
    Ok(name.to_owned())
}

/// Validate a relation list, dropping repeated names but keeping first-seen order.
fn validate_names(
    kind: LabelKind,
    names: Patch<Vec<String>>,
) -> Result<Patch<Vec<String>>, CatalogError> {
    let Patch::Set(names) = names else {
        return Ok(Patch::Unset);
    };

    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = validate_label_name(kind, &name)?;
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    Ok(Patch::Set(unique))
}
