//! Orders
//!
//! The order lifecycle state machine. Checkout creates orders as `pending`;
//! payment confirmation and fulfillment events move them through the graph
//! below, and nothing moves out of a terminal state.
//!
//! ```text
//! pending → confirmed → processing → shipped → delivered
//!    └──────────┴───────────┴→ cancelled
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Created by checkout; awaiting payment confirmation.
    Pending,
    /// Payment confirmed.
    Confirmed,
    /// Being picked and packed.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Delivered to the customer. Terminal.
    Delivered,
    /// Cancelled before shipping. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are permitted.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the state graph permits moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (
                    Self::Pending | Self::Confirmed | Self::Processing,
                    Self::Cancelled
                )
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Payment status of an order, driven by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    /// No successful authorization yet.
    Pending,
    /// Authorized and captured.
    Paid,
    /// The most recent attempt failed.
    Failed,
    /// Captured funds were returned.
    Refunded,
}

impl PaymentStatus {
    /// The storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A stored status string did not match any known status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status {0:?}")]
pub struct UnknownStatus(pub String);

/// A transition not permitted by the state graph.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("order cannot move from {from} to {to}")]
pub struct InvalidTransition {
    /// The current status.
    pub from: OrderStatus,
    /// The rejected target status.
    pub to: OrderStatus,
}

/// Validates a transition against the state graph.
///
/// # Errors
///
/// Returns [`InvalidTransition`] when the graph has no edge from `from` to
/// `to`, including every transition out of a terminal state.
pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
    if from.can_transition_to(to) {
        Ok(to)
    } else {
        Err(InvalidTransition { from, to })
    }
}
