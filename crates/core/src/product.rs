//! Products and the merchant's product form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{Price, ProductId};

/// A product as stored in the document database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub image_url: String,
}

impl Product {
    /// Customers only see products while this returns true.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Validated product fields, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub image_url: String,
}

impl ProductInput {
    /// Attach a document id.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            image_url: self.image_url,
        }
    }
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            image_url: product.image_url.clone(),
        }
    }
}

/// Raw product form as submitted by the admin panel.
///
/// All fields are strings so that invalid input can be re-rendered verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub image_url: String,
}

/// Field-level validation errors for a [`ProductForm`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormErrors(BTreeMap<&'static str, String>);

impl ProductFormErrors {
    /// Error message for a form field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no field failed validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All errors as `(field, message)` pairs, ordered by field name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }
}

impl std::fmt::Display for ProductFormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ProductFormErrors {}

impl ProductForm {
    /// Prefill the form from an existing product (edit page).
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_plain_string(),
            stock: product.stock.to_string(),
            image_url: product.image_url.clone(),
        }
    }

    /// Validate every field, collecting all errors at once.
    ///
    /// # Errors
    ///
    /// Returns [`ProductFormErrors`] naming each field that is missing or
    /// malformed.
    pub fn validate(&self) -> Result<ProductInput, ProductFormErrors> {
        let mut errors = ProductFormErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name", "Name is required");
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.insert("description", "Description is required");
        }

        let price = match Price::parse(&self.price) {
            Ok(price) => Some(price),
            Err(e) => {
                errors.insert("price", capitalize(&e.to_string()));
                None
            }
        };

        let stock = match parse_stock(&self.stock) {
            Ok(stock) => Some(stock),
            Err(msg) => {
                errors.insert("stock", msg);
                None
            }
        };

        let image_url = self.image_url.trim();
        if let Err(msg) = validate_image_url(image_url) {
            errors.insert("image_url", msg);
        }

        match (price, stock) {
            (Some(price), Some(stock)) if errors.is_empty() => Ok(ProductInput {
                name: name.to_owned(),
                description: description.to_owned(),
                price,
                stock,
                image_url: image_url.to_owned(),
            }),
            _ => Err(errors),
        }
    }
}

fn parse_stock(raw: &str) -> Result<u32, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Stock is required");
    }
    let value: i64 = raw.parse().map_err(|_| "Stock must be a whole number")?;
    if value < 0 {
        return Err("Stock cannot be negative");
    }
    u32::try_from(value).map_err(|_| "Stock is too large")
}

fn validate_image_url(raw: &str) -> Result<(), &'static str> {
    if raw.is_empty() {
        return Err("Image URL is required");
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err("Image URL must be an http(s) URL"),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
