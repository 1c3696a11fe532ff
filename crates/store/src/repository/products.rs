//! Product repository.

use std::sync::Arc;

use shopify_lite_core::{Product, ProductId, ProductInput};
use tracing::{info, instrument, warn};

use crate::error::StoreError;
use crate::feed::SnapshotFeed;
use crate::port::DocumentStore;
use crate::records::{decode_product, product_fields};

/// Reads and writes product documents.
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl ProductRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collection: String) -> Self {
        Self { store, collection }
    }

    /// Every decodable product, in document id order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the collection cannot be read.
    pub async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let documents = self.store.list(&self.collection).await?;
        Ok(documents
            .iter()
            .filter_map(|doc| match decode_product(doc) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(document_id = %doc.id, error = %e, "Skipping undecodable product");
                    None
                }
            })
            .collect())
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or the document does not decode.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        self.store
            .get(&self.collection, id.as_str())
            .await?
            .map(|doc| decode_product(&doc))
            .transpose()
    }

    /// Create a product with a store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product, StoreError> {
        let doc = self
            .store
            .create(&self.collection, product_fields(input))
            .await?;
        info!(product_id = %doc.id, "Product created");
        Ok(input.clone().into_product(ProductId::new(doc.id)))
    }

    /// Overwrite every field of an existing product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product was deleted meanwhile.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, input: &ProductInput) -> Result<(), StoreError> {
        self.store
            .update(&self.collection, id.as_str(), product_fields(input))
            .await?;
        info!("Product updated");
        Ok(())
    }

    /// Delete a product. Orders that reference it keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), StoreError> {
        self.store.delete(&self.collection, id.as_str()).await?;
        info!("Product deleted");
        Ok(())
    }

    /// Live view of all products.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the subscription cannot be established.
    pub async fn subscribe(&self) -> Result<SnapshotFeed<Product>, StoreError> {
        let source = self.store.watch(&self.collection).await?;
        Ok(SnapshotFeed::spawn(source, decode_product, "products"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopify_lite_core::Price;

    use super::*;
    use crate::memory::MemoryStore;

    fn repo() -> ProductRepository {
        ProductRepository::new(Arc::new(MemoryStore::new()), "products".to_string())
    }

    fn input(name: &str, stock: u32) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Price::parse("4.99").unwrap(),
            stock,
            image_url: "https://cdn.example.com/p.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let repo = repo();
        let created = repo.create(&input("Mug", 3)).await.unwrap();
        assert_eq!(repo.get(&created.id).await.unwrap(), Some(created.clone()));

        repo.update(&created.id, &input("Big Mug", 0)).await.unwrap();
        let updated = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Big Mug");
        assert_eq!(updated.stock, 0);

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let err = repo()
            .update(&ProductId::new("gone"), &input("Mug", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subscribe_tracks_writes() {
        let repo = repo();
        let mut feed = repo.subscribe().await.unwrap();
        assert!(feed.current().is_empty());

        repo.create(&input("Mug", 3)).await.unwrap();
        let products = feed.changed().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Mug");
    }
}
