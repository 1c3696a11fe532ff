//! Order status and its transitions.

use serde::{Deserialize, Serialize};

/// Errors returned when a status transition is not allowed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransitionError {
    /// The order has already been shipped.
    #[error("order has already been shipped")]
    AlreadyShipped,
}

/// Fulfillment status of an order.
///
/// Orders are created as [`OrderStatus::New`] and move to
/// [`OrderStatus::Shipped`] exactly once. There is no operation that moves an
/// order back to `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Submitted by the customer, waiting for the merchant.
    #[default]
    New,
    /// Shipped by the merchant.
    Shipped,
}

impl OrderStatus {
    /// Apply the ship transition.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError::AlreadyShipped`] if the order is not new.
    pub const fn ship(self) -> Result<Self, StatusTransitionError> {
        match self {
            Self::New => Ok(Self::Shipped),
            Self::Shipped => Err(StatusTransitionError::AlreadyShipped),
        }
    }

    /// Whether the merchant still has to act on this order.
    #[must_use]
    pub const fn is_new(self) -> bool {
        matches!(self, Self::New)
    }

    /// Wire value stored in the document (`"new"` / `"shipped"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Shipped => "shipped",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "shipped" => Ok(Self::Shipped),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
