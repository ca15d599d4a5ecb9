//! Tag and ingredient domain types.
//!
//! Both are owner-scoped names attached to recipes. They share storage rules
//! but live in independent namespaces.

use serde::Serialize;

use recipe_catalog_core::{IngredientId, TagId};

/// A recipe tag owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Unique tag ID.
    pub id: TagId,
    /// Tag name, unique per owner.
    pub name: String,
}

/// A recipe ingredient owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    /// Unique ingredient ID.
    pub id: IngredientId,
    /// Ingredient name, unique per owner.
    pub name: String,
}

/// Which label namespace an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Tag,
    Ingredient,
}

impl LabelKind {
    /// Singular noun used in messages.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }
}

/// A tag or ingredient as returned by the label endpoints.
///
/// The label endpoints treat both kinds alike, so the ID is untyped here and
/// the [`LabelKind`] travels alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub id: i32,
    pub name: String,
}

impl From<Label> for Tag {
    fn from(label: Label) -> Self {
        Self {
            id: TagId::new(label.id),
            name: label.name,
        }
    }
}

impl From<Label> for Ingredient {
    fn from(label: Label) -> Self {
        Self {
            id: IngredientId::new(label.id),
            name: label.name,
        }
    }
}
