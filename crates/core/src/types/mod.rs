//! Core types for the recipe catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod patch;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use patch::Patch;
pub use price::{Price, PriceError};
