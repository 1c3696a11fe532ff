//! Application state shared across handlers.

use std::sync::Arc;

use shopify_lite_core::{Order, Product, catalog, order};
use shopify_lite_store::{DocumentStore, Repositories, SnapshotFeed, StoreError};

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the document store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    repos: Repositories,
    products: SnapshotFeed<Product>,
    orders: SnapshotFeed<Order>,
}

impl AppState {
    /// Create a new application state and subscribe to both collections.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if either initial snapshot cannot be read.
    pub async fn new(config: AdminConfig, store: Arc<dyn DocumentStore>) -> Result<Self, StoreError> {
        let repos = Repositories::new(store, &config.store.app_id);
        let products = repos.products.subscribe().await?;
        let orders = repos.orders.subscribe().await?;
        tracing::info!(
            products = products.current().len(),
            orders = orders.current().len(),
            "Snapshot feeds ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                products,
                orders,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Every product, sorted by name, including sold-out ones.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        catalog::admin_catalog(self.inner.products.current().iter().cloned())
    }

    /// Every order, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        let mut orders = self.inner.orders.current().to_vec();
        order::sort_newest_first(&mut orders);
        orders
    }
}
