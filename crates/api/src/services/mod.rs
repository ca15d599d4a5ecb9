//! Business logic services for the recipe catalog.
//!
//! # Services
//!
//! - `auth` - Registration, password login, bearer tokens, profile updates
//! - `catalog` - Recipe, tag and ingredient validation on top of the catalog store
//!
//! Services are cheap borrowing wrappers, built per request from
//! [`crate::state::AppState`].

pub mod auth;
pub mod catalog;

pub use auth::{AuthError, AuthService, ProfileUpdate};
pub use catalog::{CatalogError, CatalogService};
