//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Thumbnail URL, falling back to a placeholder for blank image URLs.
///
/// Usage in templates: `{{ product.image_url|thumbnail }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn thumbnail(url: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let url = url.to_string();
    Ok(if url.trim().is_empty() {
        "https://placehold.co/80x80/e2e8f0/a0aec0?text=No+Image".to_string()
    } else {
        url
    })
}
