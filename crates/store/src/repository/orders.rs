//! Order repository.
//!
//! Placing an order is the one multi-document write in the system: the order
//! is created and every ordered product's stock is decremented in a single
//! atomic commit, each decrement guarded by the product's revision. If any
//! product changed between the read and the commit, nothing is written and the
//! caller gets [`StoreError::Conflict`].

use std::sync::Arc;

use shopify_lite_core::{NewOrder, Order, OrderId};
use tracing::{info, instrument, warn};

use super::Collections;
use crate::document::{Precondition, Write, new_document_id};
use crate::error::StoreError;
use crate::feed::SnapshotFeed;
use crate::port::DocumentStore;
use crate::records::{decode_order, order_fields, status_fields, stock_fields, stock_of};

/// Reads and writes order documents.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn DocumentStore>,
    collections: Collections,
}

impl OrderRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    /// Every decodable order, in document id order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the collection cannot be read.
    pub async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let documents = self.store.list(&self.collections.orders).await?;
        Ok(documents
            .iter()
            .filter_map(|doc| match decode_order(doc) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!(document_id = %doc.id, error = %e, "Skipping undecodable order");
                    None
                }
            })
            .collect())
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or the document does not decode.
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        self.store
            .get(&self.collections.orders, id.as_str())
            .await?
            .map(|doc| decode_order(&doc))
            .transpose()
    }

    /// Write a new order and take its items out of stock.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if a product was deleted, no longer has enough
    ///   stock, or changed before the commit landed. Nothing is written.
    /// - Any other `StoreError` if the store is unreachable.
    #[instrument(skip(self, order), fields(customer = %order.customer.email, items = order.items.len()))]
    pub async fn place(&self, order: NewOrder) -> Result<Order, StoreError> {
        let order_id = new_document_id();
        let mut writes = vec![Write::Create {
            collection: self.collections.orders.clone(),
            id: order_id.clone(),
            fields: order_fields(&order),
        }];

        for item in &order.items {
            let product = self
                .store
                .get(&self.collections.products, item.product_id.as_str())
                .await?
                .ok_or_else(|| {
                    StoreError::Conflict(format!("{} is no longer available", item.name))
                })?;

            let stock = stock_of(&product);
            let remaining = stock.checked_sub(item.quantity).ok_or_else(|| {
                StoreError::Conflict(format!(
                    "only {stock} of {} left in stock",
                    item.name
                ))
            })?;

            writes.push(Write::Update {
                collection: self.collections.products.clone(),
                id: product.id,
                fields: stock_fields(remaining),
                precondition: Precondition::Revision(product.revision),
            });
        }

        self.store.commit(writes).await?;
        info!(order_id = %order_id, total = %order.total, "Order placed");
        Ok(order.into_order(OrderId::new(order_id)))
    }

    /// Move an order from `new` to `shipped`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the order does not exist.
    /// - `StoreError::Transition` if it is already shipped.
    /// - `StoreError::Conflict` if it changed while being updated.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn mark_shipped(&self, id: &OrderId) -> Result<Order, StoreError> {
        let doc = self
            .store
            .get(&self.collections.orders, id.as_str())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        let mut order = decode_order(&doc)?;
        order.status = order.status.ship()?;

        self.store
            .commit(vec![Write::Update {
                collection: self.collections.orders.clone(),
                id: doc.id,
                fields: status_fields(order.status),
                precondition: Precondition::Revision(doc.revision),
            }])
            .await?;
        info!("Order shipped");
        Ok(order)
    }

    /// Live view of all orders.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the subscription cannot be established.
    pub async fn subscribe(&self) -> Result<SnapshotFeed<Order>, StoreError> {
        let source = self.store.watch(&self.collections.orders).await?;
        Ok(SnapshotFeed::spawn(source, decode_order, "orders"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use shopify_lite_core::{
        CustomerDetails, Email, LineItem, OrderStatus, Price, ProductId, ProductInput,
    };

    use super::*;
    use crate::memory::MemoryStore;
    use crate::repository::Repositories;

    fn setup() -> (MemoryStore, Repositories) {
        let store = MemoryStore::new();
        let repos = Repositories::new(Arc::new(store.clone()), "test");
        (store, repos)
    }

    async fn product(repos: &Repositories, stock: u32) -> ProductId {
        repos
            .products
            .create(&ProductInput {
                name: "Mug".to_string(),
                description: "Holds coffee".to_string(),
                price: Price::parse("5.00").unwrap(),
                stock,
                image_url: "https://cdn.example.com/mug.png".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn new_order(product_id: &ProductId, quantity: u32) -> NewOrder {
        let unit_price = Price::parse("5.00").unwrap();
        NewOrder {
            customer: CustomerDetails {
                name: "Ada".to_string(),
                email: Email::parse("ada@example.com").unwrap(),
            },
            items: vec![LineItem {
                product_id: product_id.clone(),
                name: "Mug".to_string(),
                quantity,
                unit_price,
            }],
            total: unit_price.times(quantity),
            status: OrderStatus::New,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_place_writes_one_order_and_decrements_stock() {
        let (_, repos) = setup();
        let id = product(&repos, 3).await;

        let order = repos.orders.place(new_order(&id, 2)).await.unwrap();

        let orders = repos.orders.list().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0], order);
        assert_eq!(orders[0].total, Price::parse("10.00").unwrap());
        assert_eq!(repos.products.get(&id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_place_rejects_oversell() {
        let (_, repos) = setup();
        let id = product(&repos, 1).await;

        let err = repos.orders.place(new_order(&id, 2)).await.unwrap_err();

        assert!(err.is_conflict());
        assert!(repos.orders.list().await.unwrap().is_empty());
        assert_eq!(repos.products.get(&id).await.unwrap().unwrap().stock, 1);
    }

    #[tokio::test]
    async fn test_place_rejects_deleted_product() {
        let (_, repos) = setup();
        let id = product(&repos, 5).await;
        repos.products.delete(&id).await.unwrap();

        let err = repos.orders.place(new_order(&id, 1)).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_second_order_for_last_unit_fails() {
        let (_, repos) = setup();
        let id = product(&repos, 1).await;

        repos.orders.place(new_order(&id, 1)).await.unwrap();
        let err = repos.orders.place(new_order(&id, 1)).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(repos.orders.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_behind() {
        let (store, repos) = setup();
        let id = product(&repos, 3).await;
        store.fail_writes(true);

        let err = repos.orders.place(new_order(&id, 1)).await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(repos.orders.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_shipped_is_one_way() {
        let (_, repos) = setup();
        let id = product(&repos, 3).await;
        let order = repos.orders.place(new_order(&id, 1)).await.unwrap();

        let shipped = repos.orders.mark_shipped(&order.id).await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(
            repos.orders.get(&order.id).await.unwrap().unwrap().status,
            OrderStatus::Shipped
        );

        let err = repos.orders.mark_shipped(&order.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Transition(_)));
    }

    #[tokio::test]
    async fn test_mark_shipped_unknown_order() {
        let (_, repos) = setup();
        let err = repos
            .orders
            .mark_shipped(&OrderId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_order_snapshot_survives_price_change() {
        let (_, repos) = setup();
        let id = product(&repos, 3).await;
        let order = repos.orders.place(new_order(&id, 1)).await.unwrap();

        let mut input = ProductInput::from(&repos.products.get(&id).await.unwrap().unwrap());
        input.price = Price::parse("99.00").unwrap();
        repos.products.update(&id, &input).await.unwrap();

        let stored = repos.orders.get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].unit_price, Price::parse("5.00").unwrap());
    }
}
