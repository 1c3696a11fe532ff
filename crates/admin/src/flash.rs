//! One-shot flash messages carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key holding the pending [`Flash`].
pub const FLASH_KEY: &str = "flash";

pub const SAVE_FAILED: &str = "Failed to save product.";
pub const DELETE_FAILED: &str = "Failed to delete product.";
pub const SHIP_FAILED: &str = "Failed to update order status.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A banner shown once on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// CSS class of the banner.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "alert-success",
            FlashKind::Error => "alert-error",
        }
    }
}

/// Queue a flash for the next render. Failures are logged, not surfaced.
pub async fn set(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(FLASH_KEY, &flash).await {
        tracing::warn!(error = %e, message = %flash.message, "Failed to store flash message");
    }
}

/// Take the pending flash, if any.
pub async fn take(session: &Session) -> Option<Flash> {
    session.remove::<Flash>(FLASH_KEY).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read flash message");
        None
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        set(&session, Flash::error(DELETE_FAILED)).await;

        let flash = take(&session).await.unwrap();
        assert_eq!(flash.message, DELETE_FAILED);
        assert_eq!(flash.css_class(), "alert-error");
        assert!(take(&session).await.is_none());
    }

    #[test]
    fn test_flash_serializes_kind_lowercase() {
        let json = serde_json::to_string(&Flash::success("Saved")).unwrap();
        assert_eq!(json, r#"{"kind":"success","message":"Saved"}"#);
    }
}
