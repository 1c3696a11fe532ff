//! `orders` subcommands.

use shopify_lite_core::{Order, OrderId, order};
use shopify_lite_store::{Repositories, StoreError};

/// Every order, newest first.
///
/// # Errors
///
/// Returns `StoreError` if the collection cannot be read.
pub async fn list(repos: &Repositories) -> Result<Vec<Order>, StoreError> {
    let mut orders = repos.orders.list().await?;
    order::sort_newest_first(&mut orders);
    Ok(orders)
}

/// Move an order from new to shipped.
///
/// # Errors
///
/// `StoreError::NotFound` for an unknown id, `StoreError::Transition` if the
/// order was already shipped.
pub async fn ship(repos: &Repositories, id: &OrderId) -> Result<Order, StoreError> {
    repos.orders.mark_shipped(id).await
}

/// One-line summary of an order.
pub fn describe(order: &Order) -> String {
    let placed = order.created_at.map_or_else(
        || "unknown".to_string(),
        |at| at.format("%Y-%m-%d %H:%M").to_string(),
    );
    let items: u32 = order.items.iter().map(|item| item.quantity).sum();
    format!(
        "{}  {}  {} <{}>  {items} items  {}  {}",
        order.id,
        placed,
        order.customer_name,
        order.customer_email,
        order.total,
        order.status.as_str(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use shopify_lite_core::{
        CustomerDetails, Email, LineItem, NewOrder, OrderStatus, Price, ProductId, ProductInput,
    };
    use shopify_lite_store::MemoryStore;

    use super::*;

    async fn place_one(repos: &Repositories) -> Order {
        let product = repos
            .products
            .create(&ProductInput {
                name: "Cup".to_string(),
                description: "A cup".to_string(),
                price: Price::parse("2.50").unwrap(),
                stock: 10,
                image_url: "https://example.com/cup.jpg".to_string(),
            })
            .await
            .unwrap();

        repos
            .orders
            .place(NewOrder {
                customer: CustomerDetails {
                    name: "Ada".to_string(),
                    email: Email::parse("ada@example.com").unwrap(),
                },
                items: vec![LineItem {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    quantity: 2,
                    unit_price: product.price,
                }],
                total: product.price.times(2),
                status: OrderStatus::New,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ship_is_one_way() {
        let repos = Repositories::new(Arc::new(MemoryStore::new()), "test");
        let order = place_one(&repos).await;

        let shipped = ship(&repos, &order.id).await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        let err = ship(&repos, &order.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Transition(_)));
    }

    #[tokio::test]
    async fn test_ship_unknown_order() {
        let repos = Repositories::new(Arc::new(MemoryStore::new()), "test");
        let err = ship(&repos, &OrderId::new("missing")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_returns_placed_orders() {
        let repos = Repositories::new(Arc::new(MemoryStore::new()), "test");
        let order = place_one(&repos).await;

        let orders = list(&repos).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order.id);
    }

    #[test]
    fn test_describe() {
        let order = Order {
            id: OrderId::new("o1"),
            customer_name: "Ada".to_string(),
            customer_email: "ada@example.com".to_string(),
            items: vec![LineItem {
                product_id: ProductId::new("p1"),
                name: "Cup".to_string(),
                quantity: 2,
                unit_price: Price::parse("2.50").unwrap(),
            }],
            total: Price::parse("5.00").unwrap(),
            status: OrderStatus::New,
            created_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()),
        };

        assert_eq!(
            describe(&order),
            "o1  2024-05-01 09:30  Ada <ada@example.com>  2 items  $5.00  new"
        );
    }
}
