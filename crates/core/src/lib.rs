//! Shopify Lite Core - Shared domain types and logic.
//!
//! This crate provides the types and pure logic used across all Shopify Lite
//! components:
//! - `storefront` - Customer-facing catalog, cart, and checkout
//! - `admin` - Merchant panel for products and orders
//! - `cli` - Command-line tools for seeding and inspecting the store
//!
//! # Architecture
//!
//! The core crate contains only types and synchronous logic - no I/O, no
//! document store access, no HTTP clients. Everything that talks to the
//! external document database lives in `shopify-lite-store`.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`product`] - Products and the admin product form
//! - [`order`] - Orders and their line-item snapshots
//! - [`cart`] - The session cart and its subtotal
//! - [`catalog`] - Catalog filtering and ordering
//! - [`checkout`] - Checkout validation and order snapshotting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod product;
pub mod types;

pub use cart::{Cart, CartLine};
pub use checkout::{CheckoutError, CheckoutForm};
pub use order::{CustomerDetails, LineItem, NewOrder, Order};
pub use product::{Product, ProductForm, ProductFormErrors, ProductInput};
pub use types::*;
