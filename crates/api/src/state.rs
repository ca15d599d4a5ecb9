//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::db::Store;
use crate::services::{AuthService, CatalogService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CatalogConfig,
    store: Arc<dyn Store>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Persistence backend (`PgStore` in production)
    #[must_use]
    pub fn new(config: CatalogConfig, store: Arc<dyn Store>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &(dyn Store + 'static) {
        self.inner.store.as_ref()
    }

    /// Authentication service borrowing this state's store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_, dyn Store> {
        AuthService::new(self.store(), self.config().token_ttl())
    }

    /// Catalog service borrowing this state's store.
    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_, dyn Store> {
        CatalogService::new(self.store())
    }
}
