//! The document store port.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::document::{Document, Fields, Snapshot, Write};
use crate::error::StoreError;

/// A collection-oriented document database.
///
/// Collections are addressed by slash-separated paths
/// (`artifacts/{app}/public/data/products`). Implementations must be cheap to
/// share behind an `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// A single document, or `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create a document with a store-assigned id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError>;

    /// Merge `fields` into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Delete a document. Missing documents are not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Apply a batch of writes atomically.
    ///
    /// Either every write applies or none does; a failed precondition yields
    /// [`StoreError::Conflict`].
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError>;

    /// Subscribe to full snapshots of a collection.
    ///
    /// The receiver holds the current state on return and is updated whenever
    /// the collection changes.
    async fn watch(&self, collection: &str) -> Result<watch::Receiver<Snapshot>, StoreError>;
}
