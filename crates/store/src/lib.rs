//! Shopify Lite Store - Document database access.
//!
//! Products and orders live in an external managed document database. This
//! crate is the only place that talks to it.
//!
//! # Architecture
//!
//! - [`DocumentStore`] is the port: untyped collections of documents with
//!   create/update/delete, an atomic batch [`commit`](DocumentStore::commit)
//!   with preconditions, and a snapshot subscription via [`watch`](DocumentStore::watch).
//! - [`FirestoreStore`] implements it over the Firestore REST API, signing in
//!   through Identity Toolkit (anonymous or custom token).
//! - [`MemoryStore`] implements it in-process for tests and local development.
//! - [`ProductRepository`] and [`OrderRepository`] map documents to the core
//!   domain types; [`SnapshotFeed`] keeps a decoded, always-current copy of a
//!   collection for rendering.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_lite_store::{Repositories, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let store = shopify_lite_store::connect(&config).await?;
//! let repos = Repositories::new(store, &config.app_id);
//!
//! let catalog = repos.products.subscribe().await?;
//! for product in catalog.current().iter() {
//!     println!("{} {}", product.name, product.price);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod document;
pub mod error;
pub mod feed;
pub mod firestore;
pub mod memory;
pub mod port;
pub mod records;
pub mod repository;

use std::sync::Arc;

pub use config::{ConfigError, FirestoreConfig, StoreBackend, StoreConfig};
pub use document::{Document, Fields, Precondition, Revision, Snapshot, Value, Write};
pub use error::StoreError;
pub use feed::SnapshotFeed;
pub use firestore::{AuthError, FirestoreStore};
pub use memory::MemoryStore;
pub use port::DocumentStore;
pub use repository::{Collections, OrderRepository, ProductRepository, Repositories};

/// Build the configured document store.
///
/// The Firestore adapter signs in eagerly. A failed sign-in is logged and
/// reported but does not stop startup; the next request signs in again.
///
/// # Errors
///
/// Returns [`StoreError`] if the HTTP client cannot be built.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match &config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Firestore(firestore) => {
            let store = FirestoreStore::new(firestore, config.poll_interval)?;
            match store.sign_in().await {
                Ok(()) => tracing::info!(project_id = %firestore.project_id, "Signed in to document store"),
                Err(e) => tracing::error!(error = %e, "Document store sign-in failed"),
            }
            Ok(Arc::new(store))
        }
    }
}
