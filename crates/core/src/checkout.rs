//! Checkout validation and order snapshotting.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::cart::{self, Cart};
use crate::order::{CustomerDetails, LineItem, NewOrder};
use crate::product::Product;
use crate::types::{Email, EmailError, OrderStatus};

/// Maximum length of the customer name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Reasons a checkout cannot produce an order.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nothing in the cart resolves against the catalog.
    #[error("your cart is empty")]
    EmptyCart,

    /// Customer name is blank.
    #[error("name is required")]
    MissingName,

    /// Customer name exceeds [`MAX_NAME_LENGTH`].
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
    },

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The cart asks for more units than the catalog has.
    #[error("only {available} of {product} left in stock (you asked for {requested})")]
    InsufficientStock {
        /// Product name.
        product: String,
        /// Quantity in the cart.
        requested: u32,
        /// Current stock.
        available: u32,
    },
}

/// Raw checkout form as submitted by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl CheckoutForm {
    /// Validate the contact fields.
    ///
    /// # Errors
    ///
    /// Returns the first failing field's error.
    pub fn validate(&self) -> Result<CustomerDetails, CheckoutError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CheckoutError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CheckoutError::NameTooLong {
                max: MAX_NAME_LENGTH,
            });
        }
        let email = Email::parse(&self.email)?;

        Ok(CustomerDetails {
            name: name.to_owned(),
            email,
        })
    }
}

/// Snapshot the cart into a new order.
///
/// Line items copy each product's current name and price, and the total is
/// the cart subtotal at this instant. Nothing here reads the clock; callers
/// pass `now` so the order is reproducible.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] when no entry resolves against the
/// catalog, or [`CheckoutError::InsufficientStock`] for the first line that
/// asks for more than is available.
pub fn build_order(
    customer: CustomerDetails,
    cart: &Cart,
    catalog: &[Product],
    now: DateTime<Utc>,
) -> Result<NewOrder, CheckoutError> {
    let lines = cart.resolve(catalog);
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    if let Some(line) = lines.iter().find(|l| l.quantity > l.product.stock) {
        return Err(CheckoutError::InsufficientStock {
            product: line.product.name.clone(),
            requested: line.quantity,
            available: line.product.stock,
        });
    }

    let total = cart::subtotal(&lines);
    let items = lines
        .into_iter()
        .map(|line| LineItem {
            product_id: line.product.id,
            name: line.product.name,
            quantity: line.quantity,
            unit_price: line.product.price,
        })
        .collect();

    Ok(NewOrder {
        customer,
        items,
        total,
        status: OrderStatus::New,
        created_at: now,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::{Price, ProductId};

    fn product(id: &str, price: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::parse(price).unwrap(),
            stock,
            image_url: String::new(),
        }
    }

    fn customer() -> CustomerDetails {
        CheckoutForm {
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
        }
        .validate()
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
    }

    #[test]
    fn test_form_requires_name_and_email() {
        let form = CheckoutForm {
            name: "   ".to_string(),
            email: "grace@example.com".to_string(),
        };
        assert_eq!(form.validate(), Err(CheckoutError::MissingName));

        let form = CheckoutForm {
            name: "Grace".to_string(),
            email: "nope".to_string(),
        };
        assert!(matches!(form.validate(), Err(CheckoutError::InvalidEmail(_))));
    }

    #[test]
    fn test_form_rejects_long_name() {
        let form = CheckoutForm {
            name: "x".repeat(MAX_NAME_LENGTH + 1),
            email: "grace@example.com".to_string(),
        };
        assert!(matches!(
            form.validate(),
            Err(CheckoutError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_order_total_matches_cart_subtotal() {
        let catalog = vec![product("a", "9.99", 5), product("b", "0.01", 5)];
        let mut cart = Cart::new();
        cart.set_quantity(ProductId::new("a"), 2);
        cart.set_quantity(ProductId::new("b"), 3);
        let expected = cart::subtotal(&cart.resolve(&catalog));

        let order = build_order(customer(), &cart, &catalog, now()).unwrap();

        assert_eq!(order.total, expected);
        assert_eq!(order.total, Price::parse("20.01").unwrap());
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.created_at, now());
    }

    #[test]
    fn test_line_items_snapshot_prices() {
        let mut catalog = vec![product("a", "5.00", 5)];
        let mut cart = Cart::new();
        cart.add(ProductId::new("a"));

        let order = build_order(customer(), &cart, &catalog, now()).unwrap();
        catalog[0].price = Price::parse("99.00").unwrap();

        assert_eq!(order.items[0].unit_price, Price::parse("5.00").unwrap());
        assert_eq!(order.total, Price::parse("5.00").unwrap());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let catalog = vec![product("a", "5.00", 5)];
        let mut cart = Cart::new();
        cart.add(ProductId::new("deleted"));
        assert_eq!(
            build_order(customer(), &cart, &catalog, now()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_quantity_above_stock_is_rejected() {
        let catalog = vec![product("a", "5.00", 2)];
        let mut cart = Cart::new();
        cart.set_quantity(ProductId::new("a"), 3);
        assert_eq!(
            build_order(customer(), &cart, &catalog, now()),
            Err(CheckoutError::InsufficientStock {
                product: "Product a".to_string(),
                requested: 3,
                available: 2,
            })
        );
    }
}
