//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself is a product id → quantity map kept in the session under
//! [`CART_KEY`]; prices are resolved against the live catalog on every render.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Deserialize;
use shopify_lite_core::{Cart, CartLine, Product, ProductId, cart, catalog};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Session key holding the [`Cart`].
pub const CART_KEY: &str = "cart";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_lines(&[])
    }

    /// Build the view from resolved cart lines.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            items: lines.iter().map(CartItemView::from).collect(),
            subtotal: cart::subtotal(lines).to_string(),
            item_count: lines
                .iter()
                .fold(0u32, |acc, line| acc.saturating_add(line.quantity)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.product.id.to_string(),
            name: line.product.name.clone(),
            quantity: line.quantity,
            price: line.product.price.to_string(),
            line_price: line.line_total().to_string(),
            image_url: line.product.image_url.clone(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session. A missing or unreadable cart is empty.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(CART_KEY).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart from session");
            Cart::new()
        }
    }
}

/// Store the cart in the session.
pub async fn save_cart(
    session: &Session,
    cart: &Cart,
) -> std::result::Result<(), tower_sessions::session::Error> {
    session.insert(CART_KEY, cart).await
}

/// Load the cart and drop entries whose product left the catalog.
pub async fn current_cart(session: &Session, catalog: &[Product]) -> Result<Cart> {
    let mut cart = load_cart(session).await;
    if cart.prune(catalog) {
        tracing::debug!("Dropped unavailable products from cart");
        save_cart(session, &cart).await?;
    }
    Ok(cart)
}

// =============================================================================
// Forms & Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data. A quantity of zero or less removes the item.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let catalog = state.catalog();
    let cart = current_cart(&session, &catalog).await?;

    Ok(CartShowTemplate {
        cart: CartView::from_lines(&cart.resolve(&catalog)),
    })
}

/// Add one unit to the cart (HTMX).
///
/// Returns the new count badge with an HTMX trigger so other elements can
/// refresh.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let catalog = state.catalog();
    let product_id = ProductId::new(form.product_id);

    if catalog::find(&catalog, &product_id).is_none() {
        tracing::info!(product_id = %product_id, "Add to cart for unavailable product");
        return Ok((
            StatusCode::NOT_FOUND,
            Html("<span class=\"text-red-500\">No longer available</span>"),
        )
            .into_response());
    }

    let mut cart = current_cart(&session, &catalog).await?;
    let quantity = cart.add(product_id.clone());
    save_cart(&session, &cart).await?;
    tracing::info!(product_id = %product_id, quantity, "Added to cart");

    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let catalog = state.catalog();
    let mut cart = current_cart(&session, &catalog).await?;
    cart.set_quantity(ProductId::new(form.product_id), form.quantity);
    save_cart(&session, &cart).await?;

    Ok(items_fragment(&cart, &catalog))
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let catalog = state.catalog();
    let mut cart = current_cart(&session, &catalog).await?;
    cart.remove(&ProductId::new(form.product_id));
    save_cart(&session, &cart).await?;

    Ok(items_fragment(&cart, &catalog))
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = current_cart(&session, &state.catalog()).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}

fn items_fragment(cart: &Cart, catalog: &[Product]) -> Response {
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from_lines(&cart.resolve(catalog)),
        },
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopify_lite_core::Price;

    use super::*;

    fn product(id: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            description: String::new(),
            price: Price::parse(price).unwrap(),
            stock: 10,
            image_url: String::new(),
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let catalog = vec![product("a", "2.50"), product("b", "10.00")];
        let mut cart = Cart::new();
        cart.add(ProductId::new("a"));
        cart.add(ProductId::new("a"));
        cart.add(ProductId::new("b"));

        let view = CartView::from_lines(&cart.resolve(&catalog));
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "$15.00");
        assert_eq!(view.items[0].line_price, "$5.00");
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::empty();
        assert!(view.is_empty());
        assert_eq!(view.subtotal, "$0.00");
        assert_eq!(view.item_count, 0);
    }
}
