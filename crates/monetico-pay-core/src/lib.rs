//! Core types and pure helpers for Monetico (CM-CIC) payments.
//!
//! This crate provides everything needed to talk the gateway's signing
//! protocol without any I/O:
//!
//! - **Keys**: `SigningKey`, `KeyFormat` - normalization of the configured secret
//! - **Signing**: `sign`, `canonical_string`, `Mac`
//! - **Fields**: `PaymentRequestFields`, `WebhookNotification` - ordered field sets
//! - **Formatting**: `Reference`, `Amount`, `BillingAddress`
//! - **Orders**: `PaymentStatus`, `OrderStatus`, `StatusUpdate`
//!
//! # MAC
//!
//! The MAC is a lowercase hex HMAC-SHA1 over the values of a field set,
//! joined with `*` in the protocol-mandated order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod fields;
pub mod format;
pub mod key;
pub mod order;
pub mod signer;

pub use error::{KeyError, PaymentError, Result};
pub use fields::{
    CanonicalFields, PaymentRequestFields, SignedPaymentFields, WebhookNotification,
    PAYMENT_FIELD_ORDER, WEBHOOK_FIELD_ORDER,
};
pub use format::{free_text, gateway_date, Amount, BillingAddress, Reference};
pub use key::{normalize, KeyFormat, SigningKey};
pub use order::{Order, OrderStatus, PaymentStatus, ReturnCode, StatusUpdate, UnknownStatus};
pub use signer::{canonical_string, sign, Mac};
