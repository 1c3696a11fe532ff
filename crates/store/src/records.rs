//! Product and order document encoding.
//!
//! Field names are camelCase to stay readable by any other client of the same
//! collections:
//!
//! | Product | Order |
//! |---------|-------|
//! | `name` string | `customerName` string |
//! | `description` string | `customerEmail` string |
//! | `price` double | `items` array of `{id, name, quantity, price}` |
//! | `stock` integer | `total` double |
//! | `imageUrl` string | `status` `"new"` / `"shipped"` |
//! | | `createdAt` timestamp |
//!
//! Decoding is lenient about what other writers may leave behind (integer
//! prices, missing descriptions, string timestamps) and strict about what
//! would make a record meaningless (no usable price, unknown status).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shopify_lite_core::{
    LineItem, NewOrder, Order, OrderId, OrderStatus, Price, Product, ProductId, ProductInput,
};

use crate::document::{Document, Fields, Value};
use crate::error::StoreError;

pub mod field {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const PRICE: &str = "price";
    pub const STOCK: &str = "stock";
    pub const IMAGE_URL: &str = "imageUrl";

    pub const CUSTOMER_NAME: &str = "customerName";
    pub const CUSTOMER_EMAIL: &str = "customerEmail";
    pub const ITEMS: &str = "items";
    pub const TOTAL: &str = "total";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = "createdAt";

    pub const ITEM_ID: &str = "id";
    pub const ITEM_NAME: &str = "name";
    pub const ITEM_QUANTITY: &str = "quantity";
    pub const ITEM_PRICE: &str = "price";
}

// =============================================================================
// Products
// =============================================================================

/// Fields for a product document.
#[must_use]
pub fn product_fields(input: &ProductInput) -> Fields {
    Fields::from([
        (field::NAME.to_string(), Value::from(input.name.as_str())),
        (
            field::DESCRIPTION.to_string(),
            Value::from(input.description.as_str()),
        ),
        (field::PRICE.to_string(), price_value(input.price)),
        (field::STOCK.to_string(), Value::from(input.stock)),
        (
            field::IMAGE_URL.to_string(),
            Value::from(input.image_url.as_str()),
        ),
    ])
}

/// Just the stock field, for decrements.
#[must_use]
pub fn stock_fields(stock: u32) -> Fields {
    Fields::from([(field::STOCK.to_string(), Value::from(stock))])
}

/// Decode a product document.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] when the price is missing, negative or not
/// a number.
pub fn decode_product(doc: &Document) -> Result<Product, StoreError> {
    let price = doc
        .get(field::PRICE)
        .ok_or_else(|| StoreError::decode(&doc.id, "missing price"))
        .and_then(|v| decode_price(&doc.id, v))?;

    Ok(Product {
        id: ProductId::new(doc.id.as_str()),
        name: string_field(&doc.fields, field::NAME),
        description: string_field(&doc.fields, field::DESCRIPTION),
        price,
        stock: count_field(&doc.fields, field::STOCK),
        image_url: string_field(&doc.fields, field::IMAGE_URL),
    })
}

/// Stock as stored, for precondition checks on a raw document.
#[must_use]
pub fn stock_of(doc: &Document) -> u32 {
    count_field(&doc.fields, field::STOCK)
}

// =============================================================================
// Orders
// =============================================================================

/// Fields for a new order document.
#[must_use]
pub fn order_fields(order: &NewOrder) -> Fields {
    let items = order
        .items
        .iter()
        .map(|item| {
            Value::Map(Fields::from([
                (
                    field::ITEM_ID.to_string(),
                    Value::from(item.product_id.as_str()),
                ),
                (field::ITEM_NAME.to_string(), Value::from(item.name.as_str())),
                (field::ITEM_QUANTITY.to_string(), Value::from(item.quantity)),
                (field::ITEM_PRICE.to_string(), price_value(item.unit_price)),
            ]))
        })
        .collect();

    Fields::from([
        (
            field::CUSTOMER_NAME.to_string(),
            Value::from(order.customer.name.as_str()),
        ),
        (
            field::CUSTOMER_EMAIL.to_string(),
            Value::from(order.customer.email.as_str()),
        ),
        (field::ITEMS.to_string(), Value::Array(items)),
        (field::TOTAL.to_string(), price_value(order.total)),
        (field::STATUS.to_string(), status_value(order.status)),
        (
            field::CREATED_AT.to_string(),
            Value::Timestamp(order.created_at),
        ),
    ])
}

/// Just the status field.
#[must_use]
pub fn status_fields(status: OrderStatus) -> Fields {
    Fields::from([(field::STATUS.to_string(), status_value(status))])
}

/// Decode an order document.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] for an unknown status, a malformed line
/// item, or a missing total.
pub fn decode_order(doc: &Document) -> Result<Order, StoreError> {
    let status = match doc.get(field::STATUS).and_then(Value::as_str) {
        None => OrderStatus::New,
        Some(raw) => raw
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::decode(&doc.id, e.to_string()))?,
    };

    let items = match doc.get(field::ITEMS) {
        None => Vec::new(),
        Some(value) => value
            .as_array()
            .ok_or_else(|| StoreError::decode(&doc.id, "items is not an array"))?
            .iter()
            .map(|item| decode_line_item(&doc.id, item))
            .collect::<Result<_, _>>()?,
    };

    let total = doc
        .get(field::TOTAL)
        .ok_or_else(|| StoreError::decode(&doc.id, "missing total"))
        .and_then(|v| decode_price(&doc.id, v))?;

    Ok(Order {
        id: OrderId::new(doc.id.as_str()),
        customer_name: string_field(&doc.fields, field::CUSTOMER_NAME),
        customer_email: string_field(&doc.fields, field::CUSTOMER_EMAIL),
        items,
        total,
        status,
        created_at: doc.get(field::CREATED_AT).and_then(timestamp),
    })
}

fn decode_line_item(doc_id: &str, value: &Value) -> Result<LineItem, StoreError> {
    let fields = value
        .as_map()
        .ok_or_else(|| StoreError::decode(doc_id, "line item is not a map"))?;
    let unit_price = fields
        .get(field::ITEM_PRICE)
        .ok_or_else(|| StoreError::decode(doc_id, "line item has no price"))
        .and_then(|v| decode_price(doc_id, v))?;

    Ok(LineItem {
        product_id: ProductId::new(string_field(fields, field::ITEM_ID)),
        name: string_field(fields, field::ITEM_NAME),
        quantity: count_field(fields, field::ITEM_QUANTITY),
        unit_price,
    })
}

// =============================================================================
// Value helpers
// =============================================================================

/// Prices go on the wire as doubles.
fn price_value(price: Price) -> Value {
    price
        .amount()
        .to_f64()
        .map_or_else(|| Value::String(price.to_plain_string()), Value::Double)
}

fn decode_price(doc_id: &str, value: &Value) -> Result<Price, StoreError> {
    let amount = match value {
        Value::Integer(i) => Decimal::from(*i),
        Value::Double(d) => Decimal::try_from(*d)
            .map_err(|e| StoreError::decode(doc_id, format!("price {d}: {e}")))?,
        Value::String(s) => {
            return Price::parse(s).map_err(|e| StoreError::decode(doc_id, e.to_string()));
        }
        other => {
            return Err(StoreError::decode(
                doc_id,
                format!("price is not a number: {other:?}"),
            ));
        }
    };
    Price::new(amount.round_dp(Price::MAX_SCALE))
        .map_err(|e| StoreError::decode(doc_id, e.to_string()))
}

fn status_value(status: OrderStatus) -> Value {
    Value::from(status.as_str())
}

fn string_field(fields: &Fields, name: &str) -> String {
    fields
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Non-negative whole number; anything else reads as zero.
fn count_field(fields: &Fields, name: &str) -> u32 {
    fields
        .get(name)
        .and_then(Value::as_i64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(t) => Some(*t),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use shopify_lite_core::{CustomerDetails, Email};

    use super::*;
    use crate::document::Revision;

    fn doc(id: &str, fields: Fields) -> Document {
        Document {
            id: id.to_string(),
            fields,
            revision: Revision::new("1"),
        }
    }

    fn input() -> ProductInput {
        ProductInput {
            name: "Mug".to_string(),
            description: "Holds coffee".to_string(),
            price: Price::parse("12.50").unwrap(),
            stock: 4,
            image_url: "https://cdn.example.com/mug.png".to_string(),
        }
    }

    #[test]
    fn test_product_fields_use_wire_names_and_types() {
        let fields = product_fields(&input());
        assert_eq!(fields["price"], Value::Double(12.5));
        assert_eq!(fields["stock"], Value::Integer(4));
        assert_eq!(
            fields["imageUrl"],
            Value::from("https://cdn.example.com/mug.png")
        );
    }

    #[test]
    fn test_product_decodes_what_it_encodes() {
        let product = decode_product(&doc("p1", product_fields(&input()))).unwrap();
        assert_eq!(product, input().into_product(ProductId::new("p1")));
    }

    #[test]
    fn test_float_prices_round_to_cents() {
        let mut fields = product_fields(&input());
        fields.insert("price".to_string(), Value::Double(0.1 + 0.2));
        let product = decode_product(&doc("p1", fields)).unwrap();
        assert_eq!(product.price, Price::parse("0.30").unwrap());
    }

    #[test]
    fn test_integer_price_and_missing_optional_fields() {
        let fields = Fields::from([("price".to_string(), Value::Integer(5))]);
        let product = decode_product(&doc("p1", fields)).unwrap();
        assert_eq!(product.price, Price::parse("5").unwrap());
        assert_eq!(product.stock, 0);
        assert!(product.name.is_empty());
    }

    #[test]
    fn test_negative_stock_reads_as_zero() {
        let mut fields = product_fields(&input());
        fields.insert("stock".to_string(), Value::Integer(-3));
        assert_eq!(decode_product(&doc("p1", fields)).unwrap().stock, 0);
    }

    #[test]
    fn test_bad_price_is_a_decode_error() {
        let mut fields = product_fields(&input());
        fields.insert("price".to_string(), Value::Double(-1.0));
        assert!(matches!(
            decode_product(&doc("p1", fields)),
            Err(StoreError::Decode { .. })
        ));
        let fields = Fields::from([("name".to_string(), Value::from("No price"))]);
        assert!(decode_product(&doc("p2", fields)).is_err());
    }

    fn new_order() -> NewOrder {
        NewOrder {
            customer: CustomerDetails {
                name: "Ada".to_string(),
                email: Email::parse("ada@example.com").unwrap(),
            },
            items: vec![LineItem {
                product_id: ProductId::new("p1"),
                name: "Mug".to_string(),
                quantity: 2,
                unit_price: Price::parse("12.50").unwrap(),
            }],
            total: Price::parse("25.00").unwrap(),
            status: OrderStatus::New,
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap(),
        }
    }

    #[test]
    fn test_order_fields_shape() {
        let fields = order_fields(&new_order());
        assert_eq!(fields["customerName"], Value::from("Ada"));
        assert_eq!(fields["status"], Value::from("new"));
        assert_eq!(fields["total"], Value::Double(25.0));
        let item = fields["items"].as_array().unwrap()[0].as_map().unwrap();
        assert_eq!(item["id"], Value::from("p1"));
        assert_eq!(item["quantity"], Value::Integer(2));
        assert!(matches!(fields["createdAt"], Value::Timestamp(_)));
    }

    #[test]
    fn test_order_decodes_what_it_encodes() {
        let order = decode_order(&doc("o1", order_fields(&new_order()))).unwrap();
        assert_eq!(order, new_order().into_order(OrderId::new("o1")));
    }

    #[test]
    fn test_order_with_string_timestamp_and_no_status() {
        let mut fields = order_fields(&new_order());
        fields.remove("status");
        fields.insert(
            "createdAt".to_string(),
            Value::from("2025-03-14T15:09:26Z"),
        );
        let order = decode_order(&doc("o1", fields)).unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_unknown_status_is_a_decode_error() {
        let mut fields = order_fields(&new_order());
        fields.insert("status".to_string(), Value::from("lost"));
        assert!(decode_order(&doc("o1", fields)).is_err());
    }
}
