//! Orders and their line-item snapshots.
//!
//! An order is written once at checkout. Its line items carry the product
//! name and unit price as they were at submission time; later catalog edits
//! never change a placed order. The status is the only field that changes
//! afterwards.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, OrderId, OrderStatus, Price, ProductId};

/// One product line of an order, frozen at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Contact details collected by the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Email,
}

/// An order that has been built from a cart but not yet written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: CustomerDetails,
    pub items: Vec<LineItem>,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Attach the document id assigned by the store.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            customer_name: self.customer.name,
            customer_email: self.customer.email.into_inner(),
            items: self.items,
            total: self.total,
            status: self.status,
            created_at: Some(self.created_at),
        }
    }
}

/// A placed order as read back from the document database.
///
/// `customer_email` is kept as a plain string: documents written by other
/// clients are displayed as-is rather than rejected. `created_at` may be
/// missing on such documents too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }
}

/// Sort orders newest first. Orders without a timestamp sort last.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by_key(|order| (order.created_at.is_none(), Reverse(order.created_at)));
}

/// Number of orders still waiting to be shipped.
#[must_use]
pub fn count_new(orders: &[Order]) -> usize {
    orders.iter().filter(|o| o.status.is_new()).count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn order(id: &str, created_at: Option<DateTime<Utc>>, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(id),
            customer_name: "Ada".to_string(),
            customer_email: "ada@example.com".to_string(),
            items: vec![LineItem {
                product_id: ProductId::new("p1"),
                name: "Mug".to_string(),
                quantity: 2,
                unit_price: Price::parse("3.00").unwrap(),
            }],
            total: Price::parse("6.00").unwrap(),
            status,
            created_at,
        }
    }

    #[test]
    fn test_sort_newest_first_puts_missing_last() {
        let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut orders = vec![
            order("old", Some(t1), OrderStatus::New),
            order("none", None, OrderStatus::New),
            order("recent", Some(t2), OrderStatus::New),
        ];
        sort_newest_first(&mut orders);
        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["recent", "old", "none"]);
    }

    #[test]
    fn test_count_new() {
        let orders = vec![
            order("a", None, OrderStatus::New),
            order("b", None, OrderStatus::Shipped),
            order("c", None, OrderStatus::New),
        ];
        assert_eq!(count_new(&orders), 2);
    }

    #[test]
    fn test_line_total_and_item_count() {
        let o = order("a", None, OrderStatus::New);
        assert_eq!(o.items[0].line_total(), Price::parse("6").unwrap());
        assert_eq!(o.item_count(), 2);
    }
}
