//! Checkout route handlers.
//!
//! Checkout validates the contact fields, snapshots the cart into line items
//! at current prices and writes a single order. The cart is cleared only once
//! the order write succeeded; any failure re-renders the form with an alert
//! and leaves the cart as it was. Nothing is retried.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use shopify_lite_core::{Cart, CartLine, CheckoutError, CheckoutForm, checkout};
use shopify_lite_store::StoreError;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{CART_KEY, CartView, current_cart};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::state::AppState;

/// Shown after the order was written.
pub const ORDER_PLACED_MESSAGE: &str = "Order placed successfully! The merchant has been notified.";

/// Shown when the order write failed.
pub const ORDER_FAILED_MESSAGE: &str = "There was an error placing your order. Please try again.";

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub cart: CartView,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub message: &'static str,
    pub order_id: String,
    pub total: String,
    pub email: String,
}

/// Display the checkout form with an order summary.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let catalog = state.catalog();
    let cart = current_cart(&session, &catalog).await?;
    let lines = cart.resolve(&catalog);

    if lines.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(form_page(StatusCode::OK, &lines, CheckoutForm::default(), None))
}

/// Place the order.
#[instrument(skip(state, session, form))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let catalog = state.catalog();
    let cart: Cart = current_cart(&session, &catalog).await?;
    let lines = cart.resolve(&catalog);

    if lines.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let customer = match form.validate() {
        Ok(customer) => customer,
        Err(e) => {
            let message = sentence(&e.to_string());
            return Ok(form_page(StatusCode::UNPROCESSABLE_ENTITY, &lines, form, Some(message)));
        }
    };

    let order = match checkout::build_order(customer, &cart, &catalog, Utc::now()) {
        Ok(order) => order,
        Err(CheckoutError::EmptyCart) => return Ok(Redirect::to("/cart").into_response()),
        Err(e) => {
            let message = sentence(&e.to_string());
            return Ok(form_page(StatusCode::CONFLICT, &lines, form, Some(message)));
        }
    };

    match state.repos().orders.place(order).await {
        Ok(order) => {
            if let Err(e) = session.remove::<Cart>(CART_KEY).await {
                tracing::warn!(order_id = %order.id, error = %e, "Failed to clear cart after checkout");
            }
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
            tracing::info!(order_id = %order.id, total = %order.total, "Checkout complete");

            Ok(CheckoutSuccessTemplate {
                message: ORDER_PLACED_MESSAGE,
                order_id: order.id.to_string(),
                total: order.total.to_string(),
                email: order.customer_email,
            }
            .into_response())
        }
        Err(StoreError::Conflict(reason)) => {
            tracing::warn!(%reason, "Order rejected by stock check");
            let message = format!("Sorry, {reason}. Please review your cart and try again.");
            Ok(form_page(StatusCode::CONFLICT, &lines, form, Some(message)))
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to place order");
            Ok(form_page(
                StatusCode::SERVICE_UNAVAILABLE,
                &lines,
                form,
                Some(ORDER_FAILED_MESSAGE.to_string()),
            ))
        }
    }
}

fn form_page(
    status: StatusCode,
    lines: &[CartLine],
    form: CheckoutForm,
    error: Option<String>,
) -> Response {
    (
        status,
        CheckoutShowTemplate {
            cart: CartView::from_lines(lines),
            name: form.name,
            email: form.email,
            error,
        },
    )
        .into_response()
}

/// Capitalize the first letter and end with a period.
fn sentence(message: &str) -> String {
    let mut chars = message.chars();
    let mut out: String = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    if !out.ends_with('.') {
        out.push('.');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence() {
        assert_eq!(sentence("name is required"), "Name is required.");
        assert_eq!(sentence("Done."), "Done.");
        assert_eq!(sentence(""), ".");
    }
}
