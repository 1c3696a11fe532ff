//! The customer's cart.
//!
//! A cart is a mapping from product id to quantity. It holds no prices: every
//! render resolves the entries against the current catalog, so the subtotal
//! always reflects current prices and silently drops products that were
//! deleted or sold out since they were added.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::product::Product;
use crate::types::{Price, ProductId};

/// Product id → quantity. Quantities are between one and
/// [`Cart::MAX_QUANTITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: BTreeMap<ProductId, u32>,
}

/// A cart entry paired with the catalog product it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Current price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

impl Cart {
    /// Largest quantity a single entry can hold.
    pub const MAX_QUANTITY: u32 = 999;

    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product, up to [`Cart::MAX_QUANTITY`]. Returns the
    /// new quantity.
    pub fn add(&mut self, product_id: ProductId) -> u32 {
        let quantity = self.entries.entry(product_id).or_insert(0);
        *quantity = quantity.saturating_add(1).min(Self::MAX_QUANTITY);
        *quantity
    }

    /// Set the quantity of a product. Zero or less removes the entry; larger
    /// values are clamped to [`Cart::MAX_QUANTITY`].
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.entries.remove(&product_id);
        } else {
            let quantity = u32::try_from(quantity)
                .unwrap_or(Self::MAX_QUANTITY)
                .min(Self::MAX_QUANTITY);
            self.entries.insert(product_id, quantity);
        }
    }

    /// Remove a product from the cart.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.entries.remove(product_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Quantity of a product, zero when absent.
    #[must_use]
    pub fn quantity(&self, product_id: &ProductId) -> u32 {
        self.entries.get(product_id).copied().unwrap_or(0)
    }

    /// Total number of units (the badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.entries
            .values()
            .fold(0u32, |acc, qty| acc.saturating_add(*qty))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(product id, quantity)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&ProductId, u32)> {
        self.entries.iter().map(|(id, qty)| (id, *qty))
    }

    /// Resolve entries against the catalog.
    ///
    /// Entries whose product is not in `catalog` are skipped. Lines are
    /// ordered by product name, case-insensitively.
    #[must_use]
    pub fn resolve(&self, catalog: &[Product]) -> Vec<CartLine> {
        let mut lines: Vec<CartLine> = catalog
            .iter()
            .filter_map(|product| {
                self.entries.get(&product.id).map(|&quantity| CartLine {
                    product: product.clone(),
                    quantity,
                })
            })
            .collect();
        lines.sort_by_cached_key(|line| {
            (line.product.name.to_lowercase(), line.product.id.clone())
        });
        lines
    }

    /// Drop entries that no longer resolve against `catalog`.
    ///
    /// Returns true when something was removed.
    pub fn prune(&mut self, catalog: &[Product]) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|id, _| catalog::find(catalog, id).is_some());
        before != self.entries.len()
    }
}

/// Sum of price × quantity over resolved lines.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}
