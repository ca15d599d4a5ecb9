//! Domain models for the recipe catalog.
//!
//! These types are validated domain objects, separate from database row types
//! and from the HTTP request/response shapes in [`crate::routes`].

pub mod label;
pub mod recipe;
pub mod user;

pub use label::{Ingredient, Label, LabelKind, Tag};
pub use recipe::{Recipe, RecipeChanges, RecipeDraft, RecipeFields, RecipeFilter, RecipeUpdate};
pub use user::{IssuedToken, NewToken, NewUser, User, UserChanges};
