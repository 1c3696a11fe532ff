//! `products` subcommands.

use shopify_lite_core::{Product, catalog};
use shopify_lite_store::{Repositories, StoreError};

/// Every product sorted by name, sold-out ones included.
///
/// # Errors
///
/// Returns `StoreError` if the collection cannot be read.
pub async fn list(repos: &Repositories) -> Result<Vec<Product>, StoreError> {
    let products = repos.products.list().await?;
    Ok(catalog::admin_catalog(products))
}

/// One-line summary of a product.
pub fn describe(product: &Product) -> String {
    let stock = if product.is_in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "sold out".to_string()
    };
    format!("{}  {}  {}  {stock}", product.id, product.name, product.price)
}
