//! Recipe domain types.
//!
//! Input flows through two stages: the unvalidated shapes ([`RecipeFields`],
//! [`RecipeUpdate`]) built by the HTTP layer, and the validated shapes
//! ([`RecipeDraft`], [`RecipeChanges`]) the catalog store accepts.

use rust_decimal::Decimal;
use serde::Serialize;

use recipe_catalog_core::{IngredientId, Patch, Price, RecipeId, TagId, UserId};

use super::label::{Ingredient, Tag};

/// A recipe with its resolved tags and ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    /// Unique recipe ID.
    pub id: RecipeId,
    /// Owner. Never changes after creation.
    pub user_id: UserId,
    /// Non-empty title.
    pub title: String,
    /// Preparation time in minutes.
    pub time_minutes: i32,
    /// Non-negative price.
    pub price: Price,
    /// Free-form description.
    pub description: Option<String>,
    /// External link.
    pub link: Option<String>,
    /// Stored image path. Not writable through the API.
    pub image: Option<String>,
    /// Attached tags, ordered by id.
    pub tags: Vec<Tag>,
    /// Attached ingredients, ordered by id.
    pub ingredients: Vec<Ingredient>,
}

/// Unvalidated input for creating or fully replacing a recipe.
#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub title: String,
    pub time_minutes: i64,
    pub price: Decimal,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Patch<Vec<String>>,
    pub ingredients: Patch<Vec<String>>,
}

/// Unvalidated input for a partial update.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub title: Patch<String>,
    pub time_minutes: Patch<i64>,
    pub price: Patch<Decimal>,
    pub description: Patch<Option<String>>,
    pub link: Patch<Option<String>>,
    pub tags: Patch<Vec<String>>,
    pub ingredients: Patch<Vec<String>>,
}

/// A validated recipe ready to be inserted.
///
/// Relation lists hold tag and ingredient names, already trimmed and
/// deduplicated. They are resolved by get-or-create against the owner's
/// existing labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub title: String,
    pub time_minutes: i32,
    pub price: Price,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Patch<Vec<String>>,
    pub ingredients: Patch<Vec<String>>,
}

/// Validated changes to an existing recipe.
///
/// `Unset` fields keep their stored value. A `Set` relation list replaces the
/// whole relation set, so `Set(vec![])` detaches every label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub title: Patch<String>,
    pub time_minutes: Patch<i32>,
    pub price: Patch<Price>,
    pub description: Patch<Option<String>>,
    pub link: Patch<Option<String>>,
    pub tags: Patch<Vec<String>>,
    pub ingredients: Patch<Vec<String>>,
}

impl RecipeChanges {
    /// Returns `true` if no column of the recipe row itself changes.
    #[must_use]
    pub const fn scalars_unset(&self) -> bool {
        self.title.is_unset()
            && self.time_minutes.is_unset()
            && self.price.is_unset()
            && self.description.is_unset()
            && self.link.is_unset()
    }
}

/// A full replacement: every scalar is written, omitted optionals are cleared.
impl From<RecipeDraft> for RecipeChanges {
    fn from(draft: RecipeDraft) -> Self {
        Self {
            title: Patch::Set(draft.title),
            time_minutes: Patch::Set(draft.time_minutes),
            price: Patch::Set(draft.price),
            description: Patch::Set(draft.description),
            link: Patch::Set(draft.link),
            tags: draft.tags,
            ingredients: draft.ingredients,
        }
    }
}

/// Restrictions applied when listing recipes.
///
/// `None` means no restriction. A `Some` list keeps recipes attached to at
/// least one of the listed labels; both lists must match when both are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<TagId>>,
    pub ingredients: Option<Vec<IngredientId>>,
}

impl RecipeFilter {
    /// Returns `true` if the recipe passes both restrictions.
    #[must_use]
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let tags_ok = self
            .tags
            .as_ref()
            .is_none_or(|ids| recipe.tags.iter().any(|t| ids.contains(&t.id)));
        let ingredients_ok = self
            .ingredients
            .as_ref()
            .is_none_or(|ids| recipe.ingredients.iter().any(|i| ids.contains(&i.id)));
        tags_ok && ingredients_ok
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recipe(tags: &[i32], ingredients: &[i32]) -> Recipe {
        Recipe {
            id: RecipeId::new(1),
            user_id: UserId::new(1),
            title: "Soup".to_owned(),
            time_minutes: 10,
            price: Price::new(Decimal::new(500, 2)).unwrap(),
            description: None,
            link: None,
            image: None,
            tags: tags
                .iter()
                .map(|&id| Tag {
                    id: TagId::new(id),
                    name: format!("tag{id}"),
                })
                .collect(),
            ingredients: ingredients
                .iter()
                .map(|&id| Ingredient {
                    id: IngredientId::new(id),
                    name: format!("ingredient{id}"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(RecipeFilter::default().matches(&recipe(&[], &[])));
    }

    #[test]
    fn test_tag_filter_matches_any_listed_tag() {
        let filter = RecipeFilter {
            tags: Some(vec![TagId::new(2), TagId::new(9)]),
            ingredients: None,
        };
        assert!(filter.matches(&recipe(&[1, 2], &[])));
        assert!(!filter.matches(&recipe(&[1], &[])));
        assert!(!filter.matches(&recipe(&[], &[])));
    }

    #[test]
    fn test_both_filters_must_match() {
        let filter = RecipeFilter {
            tags: Some(vec![TagId::new(1)]),
            ingredients: Some(vec![IngredientId::new(5)]),
        };
        assert!(filter.matches(&recipe(&[1], &[5])));
        assert!(!filter.matches(&recipe(&[1], &[4])));
        assert!(!filter.matches(&recipe(&[2], &[5])));
    }

    #[test]
    fn test_draft_into_changes_clears_optionals() {
        let draft = RecipeDraft {
            title: "Stew".to_owned(),
            time_minutes: 30,
            price: Price::new(Decimal::ONE).unwrap(),
            description: None,
            link: None,
            tags: Patch::Unset,
            ingredients: Patch::Set(vec![]),
        };
        let changes = RecipeChanges::from(draft);
        assert_eq!(changes.description, Patch::Set(None));
        assert_eq!(changes.link, Patch::Set(None));
        assert!(changes.tags.is_unset());
        assert_eq!(changes.ingredients, Patch::Set(vec![]));
        assert!(!changes.scalars_unset());
    }
}
