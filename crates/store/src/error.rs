//! Store error type.

use shopify_lite_core::StatusTransitionError;
use thiserror::Error;

use crate::firestore::AuthError;

/// Errors returned by [`DocumentStore`](crate::DocumentStore) implementations
/// and the typed repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The database answered with a non-success status.
    #[error("HTTP {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Message from the error body, truncated.
        message: String,
    },

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A document exists but its fields do not describe a valid record.
    #[error("cannot decode document {id}: {reason}")]
    Decode {
        /// Document id.
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A write precondition failed; nothing in the batch was applied.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requested status change is not allowed.
    #[error("Invalid transition: {0}")]
    Transition(#[from] StatusTransitionError),

    /// Signing in to the database failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The database is unreachable or refused the write.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Build a [`StoreError::Decode`].
    pub fn decode(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a precondition failure the caller can surface as
    /// "something changed, try again".
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
