//! Catalog filtering and ordering.

use crate::product::Product;
use crate::types::ProductId;

/// Products customers may buy: stock above zero, sorted by name.
#[must_use]
pub fn storefront_catalog(products: impl IntoIterator<Item = Product>) -> Vec<Product> {
    let mut catalog: Vec<Product> = products
        .into_iter()
        .filter(Product::is_in_stock)
        .collect();
    sort_by_name(&mut catalog);
    catalog
}

/// Every product, sorted by name, for the merchant.
#[must_use]
pub fn admin_catalog(products: impl IntoIterator<Item = Product>) -> Vec<Product> {
    let mut catalog: Vec<Product> = products.into_iter().collect();
    sort_by_name(&mut catalog);
    catalog
}

/// Case-insensitive name order, ties broken by id.
pub fn sort_by_name(products: &mut [Product]) {
    products.sort_by_cached_key(|p| (p.name.to_lowercase(), p.id.clone()));
}

/// Look up a product by id.
#[must_use]
pub fn find<'a>(catalog: &'a [Product], id: &ProductId) -> Option<&'a Product> {
    catalog.iter().find(|p| &p.id == id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: &str, name: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: Price::ZERO,
            stock,
            image_url: String::new(),
        }
    }

    #[test]
    fn test_storefront_hides_out_of_stock() {
        let catalog = storefront_catalog(vec![
            product("1", "Kiwi", 0),
            product("2", "apple", 3),
            product("3", "Banana", 1),
        ]);
        let names: Vec<_> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["apple", "Banana"]);
        assert!(catalog.iter().all(|p| p.stock > 0));
    }

    #[test]
    fn test_admin_keeps_everything() {
        let catalog = admin_catalog(vec![product("1", "Kiwi", 0), product("2", "Apple", 3)]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].name, "Apple");
    }

    #[test]
    fn test_find() {
        let catalog = vec![product("1", "Kiwi", 0)];
        assert!(find(&catalog, &ProductId::new("1")).is_some());
        assert!(find(&catalog, &ProductId::new("2")).is_none());
    }
}
