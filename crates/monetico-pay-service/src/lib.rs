//! Monetico payment HTTP service.
//!
//! This crate provides the HTTP API in front of the signing core:
//!
//! - Payment initiation: validates an order descriptor from the storefront
//!   and returns the signed form to post to the gateway
//! - Payment notifications: authenticates the gateway callback and flips
//!   the order's payment status in the order store
//!
//! # Key handling
//!
//! The merchant secret is normalized once at startup. With strict key
//! validation (the default) a malformed secret stops the service; a missing
//! one only disables payments.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod config;
pub mod error;
pub mod handlers;
pub mod initiator;
pub mod keys;
pub mod routes;
pub mod state;
pub mod verifier;

pub use config::{ConfigError, GatewayConfig, OrderStoreConfig, ServiceConfig};
pub use error::ApiError;
pub use initiator::{InitiationRequest, PaymentInitiator, SignedPaymentForm};
pub use keys::{KeyProvider, StaticKeyProvider};
pub use routes::create_router;
pub use state::AppState;
pub use verifier::{Ack, VerificationOutcome, WebhookVerifier};
