//! Custom Askama template filters.

use std::fmt::Display;

/// Shown when a product has no usable image.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400/e2e8f0/a0aec0?text=Image+Not+Found";

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Falls back to the placeholder image for blank URLs.
///
/// Usage in templates: `{{ product.image_url|image_or_placeholder }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn image_or_placeholder(url: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let url = url.to_string();
    if url.trim().is_empty() {
        Ok(PLACEHOLDER_IMAGE.to_string())
    } else {
        Ok(url)
    }
}
