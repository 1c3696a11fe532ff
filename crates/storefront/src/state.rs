//! Application state shared across handlers.

use std::sync::Arc;

use shopify_lite_core::{Product, catalog};
use shopify_lite_store::{DocumentStore, Repositories, SnapshotFeed, StoreError};

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the document store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    repos: Repositories,
    products: SnapshotFeed<Product>,
}

impl AppState {
    /// Create a new application state and subscribe to the product
    /// collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the initial product snapshot cannot be read.
    pub async fn new(
        config: StorefrontConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, StoreError> {
        let repos = Repositories::new(store, &config.store.app_id);
        let products = repos.products.subscribe().await?;
        tracing::info!(products = products.current().len(), "Product feed ready");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                products,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the typed repositories.
    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Products customers can buy right now, from the latest snapshot.
    #[must_use]
    pub fn catalog(&self) -> Vec<Product> {
        catalog::storefront_catalog(self.inner.products.current().iter().cloned())
    }
}
