//! Recipe Catalog Core - Shared types library.
//!
//! This crate provides common types used across all recipe catalog components:
//! - `api` - The token-authenticated HTTP service
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and patch fields

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
