//! Dashboard: every product and the incoming orders.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use shopify_lite_core::order;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::flash::{self, Flash};
use crate::state::AppState;
use crate::views::{OrderView, ProductRowView};

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub flash: Option<Flash>,
    pub products: Vec<ProductRowView>,
    pub orders: Vec<OrderView>,
    pub new_count: usize,
    pub next: &'static str,
}

/// Display the dashboard.
#[instrument(skip(state, session))]
pub async fn index(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let orders = state.orders();

    DashboardTemplate {
        flash: flash::take(&session).await,
        products: state.products().iter().map(ProductRowView::from).collect(),
        new_count: order::count_new(&orders),
        orders: orders.iter().map(OrderView::from).collect(),
        next: "/",
    }
}
