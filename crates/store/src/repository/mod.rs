//! Typed repositories over the document store.

mod orders;
mod products;

use std::sync::Arc;

pub use orders::OrderRepository;
pub use products::ProductRepository;

use crate::port::DocumentStore;

/// Collection paths for one application id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub products: String,
    pub orders: String,
}

impl Collections {
    /// `artifacts/{app_id}/public/data/{products,orders}`.
    #[must_use]
    pub fn for_app(app_id: &str) -> Self {
        Self {
            products: format!("artifacts/{app_id}/public/data/products"),
            orders: format!("artifacts/{app_id}/public/data/orders"),
        }
    }
}

/// Both repositories over one store.
#[derive(Clone)]
pub struct Repositories {
    pub products: ProductRepository,
    pub orders: OrderRepository,
}

impl Repositories {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, app_id: &str) -> Self {
        let collections = Collections::for_app(app_id);
        Self {
            products: ProductRepository::new(Arc::clone(&store), collections.products.clone()),
            orders: OrderRepository::new(store, collections),
        }
    }
}
