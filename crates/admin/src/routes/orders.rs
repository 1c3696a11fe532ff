//! Order list and the ship action.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use shopify_lite_core::{OrderId, order};
use shopify_lite_store::StoreError;
use tower_sessions::Session;
use tracing::instrument;

use super::{return_path, see_other};
use crate::filters;
use crate::flash::{self, Flash, SHIP_FAILED};
use crate::state::AppState;
use crate::views::OrderView;

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub flash: Option<Flash>,
    pub orders: Vec<OrderView>,
    pub new_count: usize,
    pub next: &'static str,
}

/// Where to go after shipping.
#[derive(Debug, Default, Deserialize)]
pub struct ShipForm {
    pub next: Option<String>,
}

/// Display all orders, newest first.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let orders = state.orders();

    OrdersTemplate {
        flash: flash::take(&session).await,
        new_count: order::count_new(&orders),
        orders: orders.iter().map(OrderView::from).collect(),
        next: "/orders",
    }
}

/// Mark an order shipped. Only `new` orders can be shipped; there is no way
/// back.
#[instrument(skip(state, session, headers, form))]
pub async fn ship(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<ShipForm>,
) -> Response {
    let order_id = OrderId::new(id);

    let message = match state.repos().orders.mark_shipped(&order_id).await {
        Ok(_) => Flash::success(format!("Order {order_id} marked as shipped.")),
        Err(StoreError::Transition(e)) => {
            tracing::info!(order_id = %order_id, error = %e, "Ship requested for shipped order");
            Flash::error(format!("Order {order_id} has already been shipped."))
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(order_id = %order_id, error = %e, sentry_event_id = %event_id, "Failed to ship order");
            Flash::error(SHIP_FAILED)
        }
    };
    flash::set(&session, message).await;

    see_other(&headers, return_path(form.next.as_deref(), "/orders"))
}
