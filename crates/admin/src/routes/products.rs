//! Product create, edit and delete.
//!
//! Invalid input re-renders the form with the submitted values and field
//! errors. A store failure re-renders it with a banner; nothing is retried.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use shopify_lite_core::{ProductForm, ProductFormErrors, ProductId};
use shopify_lite_store::StoreError;
use tower_sessions::Session;
use tracing::instrument;

use super::see_other;
use crate::error::{AppError, Result};
use crate::filters;
use crate::flash::{self, DELETE_FAILED, Flash, SAVE_FAILED};
use crate::state::AppState;

/// New/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub flash: Option<Flash>,
    pub title: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub errors: ProductFormErrors,
}

impl ProductFormTemplate {
    fn new_product(form: ProductForm) -> Self {
        Self {
            flash: None,
            title: "New Product",
            action: "/products".to_string(),
            form,
            errors: ProductFormErrors::default(),
        }
    }

    fn edit_product(id: &ProductId, form: ProductForm) -> Self {
        Self {
            flash: None,
            title: "Edit Product",
            action: format!("/products/{id}"),
            form,
            errors: ProductFormErrors::default(),
        }
    }

    fn with_errors(mut self, errors: ProductFormErrors) -> Response {
        self.errors = errors;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }

    fn with_store_error(mut self, error: &StoreError) -> Response {
        let event_id = sentry::capture_error(error);
        tracing::error!(error = %error, sentry_event_id = %event_id, "Failed to save product");
        self.flash = Some(Flash::error(SAVE_FAILED));
        (StatusCode::SERVICE_UNAVAILABLE, self).into_response()
    }
}

/// Display the new product form.
#[instrument]
pub async fn new_form() -> impl IntoResponse {
    ProductFormTemplate::new_product(ProductForm::default())
}

/// Create a product.
#[instrument(skip(state, session, headers, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return ProductFormTemplate::new_product(form).with_errors(errors),
    };

    match state.repos().products.create(&input).await {
        Ok(product) => {
            flash::set(&session, Flash::success(format!("Created {}.", product.name))).await;
            see_other(&headers, "/")
        }
        Err(e) => ProductFormTemplate::new_product(form).with_store_error(&e),
    }
}

/// Display the edit form, prefilled from the stored product.
#[instrument(skip(state))]
pub async fn edit_form(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id = ProductId::new(id);
    let product = state
        .repos()
        .products
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate::edit_product(&id, ProductForm::from_product(&product)).into_response())
}

/// Overwrite a product.
#[instrument(skip(state, session, headers, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Response {
    let id = ProductId::new(id);
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return ProductFormTemplate::edit_product(&id, form).with_errors(errors),
    };

    match state.repos().products.update(&id, &input).await {
        Ok(()) => {
            flash::set(&session, Flash::success(format!("Saved {}.", input.name))).await;
            see_other(&headers, "/")
        }
        Err(StoreError::NotFound(_)) => AppError::NotFound(format!("product {id}")).into_response(),
        Err(e) => ProductFormTemplate::edit_product(&id, form).with_store_error(&e),
    }
}

/// Delete a product. Placed orders keep their line-item snapshot.
#[instrument(skip(state, session, headers))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let id = ProductId::new(id);

    let message = match state.repos().products.delete(&id).await {
        Ok(()) => Flash::success("Product deleted."),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(product_id = %id, error = %e, sentry_event_id = %event_id, "Failed to delete product");
            Flash::error(DELETE_FAILED)
        }
    };
    flash::set(&session, message).await;

    see_other(&headers, "/")
}
