//! Display data for admin templates.

use shopify_lite_core::{LineItem, Order, Product};

/// Product table row.
#[derive(Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub stock: u32,
    pub image_url: String,
}

impl ProductRowView {
    #[must_use]
    pub const fn is_sold_out(&self) -> bool {
        self.stock == 0
    }
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            stock: product.stock,
            image_url: product.image_url.clone(),
        }
    }
}

/// One line of an order.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&LineItem> for OrderItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
            line_total: item.line_total().to_string(),
        }
    }
}

/// Order card.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItemView>,
    pub total: String,
    pub status: &'static str,
    pub is_new: bool,
    pub created_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            items: order.items.iter().map(OrderItemView::from).collect(),
            total: order.total.to_string(),
            status: order.status.as_str(),
            is_new: order.status.is_new(),
            created_at: order.created_at.map_or_else(
                || "unknown".to_string(),
                |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use shopify_lite_core::{OrderId, OrderStatus, Price, ProductId};

    use super::*;

    #[test]
    fn test_order_view() {
        let order = Order {
            id: OrderId::new("o1"),
            customer_name: "Ada".to_string(),
            customer_email: "ada@example.com".to_string(),
            items: vec![LineItem {
                product_id: ProductId::new("p1"),
                name: "Mug".to_string(),
                quantity: 3,
                unit_price: Price::parse("4.50").unwrap(),
            }],
            total: Price::parse("13.50").unwrap(),
            status: OrderStatus::New,
            created_at: Some(chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()),
        };

        let view = OrderView::from(&order);
        assert_eq!(view.created_at, "2024-05-01 09:30 UTC");
        assert_eq!(view.items[0].line_total, "$13.50");
        assert_eq!(view.status, "new");
        assert!(view.is_new);

        let view = OrderView::from(&Order {
            created_at: None,
            status: OrderStatus::Shipped,
            ..order
        });
        assert_eq!(view.created_at, "unknown");
        assert!(!view.is_new);
    }
}
