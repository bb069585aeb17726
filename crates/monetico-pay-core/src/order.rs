//! Order status types and the transitions a payment notification may apply.
//!
//! Orders live in the external order store. This crate only models the two
//! fields a payment notification is allowed to change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::Reference;

/// Return codes meaning the payment went through.
const SUCCESS_RETURN_CODE: &str = "paiement";
const TEST_SUCCESS_RETURN_CODE: &str = "payetest";

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting payment.
    Pending,
    /// Paid.
    Paid,
    /// Payment refused or cancelled.
    Failed,
    /// Refunded by the back office.
    Refunded,
}

impl PaymentStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Not yet confirmed.
    Pending,
    /// Confirmed (paid).
    Confirmed,
    /// Shipped.
    Shipped,
    /// Cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

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

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// The gateway's `code-retour`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnCode {
    /// `paiement`: payment accepted.
    Payment,
    /// `payetest`: payment accepted in test mode.
    TestPayment,
    /// Anything else (`Annulation`, refusals, empty).
    Other(String),
}

impl ReturnCode {
    /// Interpret a raw return code, ignoring case.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            SUCCESS_RETURN_CODE => Self::Payment,
            TEST_SUCCESS_RETURN_CODE => Self::TestPayment,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Whether the payment went through.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Payment | Self::TestPayment)
    }
}

/// Absolute status values to write on an order.
///
/// Values are set, never derived from the previous state, so applying the
/// same update twice is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// New payment status.
    pub payment_status: PaymentStatus,
    /// New fulfillment status, `None` to leave it untouched.
    pub status: Option<OrderStatus>,
}

impl StatusUpdate {
    /// Payment accepted: `paid` / `confirmed`.
    #[must_use]
    pub const fn paid() -> Self {
        Self {
            payment_status: PaymentStatus::Paid,
            status: Some(OrderStatus::Confirmed),
        }
    }

    /// Payment refused: `failed`, fulfillment untouched.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            payment_status: PaymentStatus::Failed,
            status: None,
        }
    }

    /// The update a notification with this return code calls for.
    #[must_use]
    pub const fn for_return_code(code: &ReturnCode) -> Self {
        if code.is_success() {
            Self::paid()
        } else {
            Self::failed()
        }
    }
}

/// The slice of an order the payment flow reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier in the store.
    pub id: String,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Fulfillment status.
    pub status: OrderStatus,
}

impl Order {
    /// A freshly created order: `pending` / `pending`.
    #[must_use]
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
        }
    }

    /// The gateway reference for this order.
    #[must_use]
    pub fn reference(&self) -> Reference {
        Reference::from_order_id(&self.id)
    }

    /// Apply a status update.
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.payment_status = update.payment_status;
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}
