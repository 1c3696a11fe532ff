//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store reachable)
//!
//! # Dashboard
//! GET  /                       - Product table and incoming orders
//!
//! # Products
//! GET  /products/new           - New product form
//! POST /products               - Create product
//! GET  /products/{id}/edit     - Edit product form
//! POST /products/{id}          - Update product
//! POST /products/{id}/delete   - Delete product (hx-confirm)
//!
//! # Orders
//! GET  /orders                 - All orders, newest first
//! POST /orders/{id}/ship       - Mark order shipped
//! ```

pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}/ship", post(orders::ship))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
}

/// Redirect after a form post.
///
/// HTMX requests get an `HX-Redirect` so the whole page navigates instead of
/// swapping the target.
pub fn see_other(headers: &HeaderMap, location: &str) -> Response {
    if headers.contains_key("hx-request") {
        (StatusCode::OK, [("HX-Redirect", location.to_string())]).into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

/// Local path to return to after an action, defaulting to `fallback`.
///
/// Browsers treat `\` like `/` and drop control characters, so either
/// one could turn a path into a protocol-relative URL.
#[must_use]
pub fn return_path<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    next.filter(|path| is_local_path(path)).unwrap_or(fallback)
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}
