//! Recipe catalog API library.
//!
//! This crate provides the HTTP API as a library, allowing the binary, the
//! CLI and the integration tests to share the same router, services and
//! stores.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
