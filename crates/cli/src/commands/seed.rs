//! Seed the catalog from a JSON file.
//!
//! The file holds an array of products:
//!
//! ```json
//! [
//!   {
//!     "name": "Enamel Mug",
//!     "description": "Holds 350ml.",
//!     "price": "12.50",
//!     "stock": 40,
//!     "image_url": "https://example.com/mug.jpg"
//!   }
//! ]
//! ```
//!
//! Every record goes through the same validation as the admin product form.
//! Nothing is written unless the whole file is valid.

use std::path::Path;

use serde::Deserialize;
use shopify_lite_core::{Price, Product, ProductForm, ProductFormErrors, ProductInput};
use shopify_lite_store::{Repositories, StoreError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed file: {0}")]
    Json(#[from] serde_json::Error),

    /// `index` is zero-based.
    #[error("product {index}: {errors}")]
    Invalid {
        index: usize,
        errors: ProductFormErrors,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    description: String,
    price: Price,
    stock: u32,
    image_url: String,
}

impl SeedProduct {
    fn into_form(self) -> ProductForm {
        ProductForm {
            name: self.name,
            description: self.description,
            price: self.price.to_plain_string(),
            stock: self.stock.to_string(),
            image_url: self.image_url,
        }
    }
}

/// Parse and validate a seed file's contents.
///
/// # Errors
///
/// Returns [`SeedError::Json`] for malformed JSON or out-of-range values and
/// [`SeedError::Invalid`] for the first record that fails form validation.
pub fn parse(json: &str) -> Result<Vec<ProductInput>, SeedError> {
    let records: Vec<SeedProduct> = serde_json::from_str(json)?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_form()
                .validate()
                .map_err(|errors| SeedError::Invalid { index, errors })
        })
        .collect()
}

/// Create every product, in file order.
///
/// # Errors
///
/// Stops at the first failed write. Products created before it stay.
pub async fn create_all(
    repos: &Repositories,
    inputs: &[ProductInput],
) -> Result<Vec<Product>, SeedError> {
    let mut created = Vec::with_capacity(inputs.len());
    for input in inputs {
        let product = repos.products.create(input).await?;
        info!(id = %product.id, name = %product.name, "Created product");
        created.push(product);
    }
    Ok(created)
}

/// Read, validate and write a seed file.
///
/// # Errors
///
/// See [`parse`] and [`create_all`].
pub async fn seed_file(repos: &Repositories, path: &Path) -> Result<Vec<Product>, SeedError> {
    info!(path = %path.display(), "Loading seed file");

    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;

    let inputs = parse(&json)?;
    info!(count = inputs.len(), "Seed file validated");

    create_all(repos, &inputs).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use shopify_lite_store::MemoryStore;

    use super::*;

    const MUG: &str = r#"{
        "name": "Enamel Mug",
        "description": "Holds 350ml.",
        "price": "12.50",
        "stock": 40,
        "image_url": "https://example.com/mug.jpg"
    }"#;

    #[test]
    fn test_parse_valid_file() {
        let inputs = parse(&format!("[{MUG}]")).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "Enamel Mug");
        assert_eq!(inputs[0].price, Price::parse("12.50").unwrap());
        assert_eq!(inputs[0].stock, 40);
    }

    #[test]
    fn test_parse_reports_invalid_record_index() {
        let blank = r#"{
            "name": "  ",
            "description": "No name",
            "price": "1.00",
            "stock": 1,
            "image_url": "https://example.com/x.jpg"
        }"#;

        let err = parse(&format!("[{MUG}, {blank}]")).unwrap_err();
        match err {
            SeedError::Invalid { index, errors } => {
                assert_eq!(index, 1);
                assert_eq!(errors.get("name"), Some("Name is required"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_negative_price() {
        let json = MUG.replace("\"12.50\"", "\"-1\"");
        assert!(matches!(parse(&format!("[{json}]")), Err(SeedError::Json(_))));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(parse(MUG), Err(SeedError::Json(_))));
    }

    #[tokio::test]
    async fn test_create_all_writes_products() {
        let repos = Repositories::new(Arc::new(MemoryStore::new()), "test");
        let inputs = parse(&format!("[{MUG}]")).unwrap();

        let created = create_all(&repos, &inputs).await.unwrap();
        assert_eq!(created.len(), 1);

        let stored = repos.products.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Enamel Mug");
    }

    #[tokio::test]
    async fn test_seed_file_missing() {
        let repos = Repositories::new(Arc::new(MemoryStore::new()), "test");
        let err = seed_file(&repos, Path::new("does/not/exist.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));
    }
}
