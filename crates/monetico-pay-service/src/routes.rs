//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::any::Any;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{health, payments, webhooks};
use crate::state::AppState;
use crate::verifier::Ack;

/// Maximum concurrent requests for payment initiation.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `POST /v1/payments/init` - Sign a payment request (rate limited)
/// - `POST /webhooks/monetico` - Gateway payment notification
pub fn create_router(state: AppState) -> Router {
    // Body size and timeout limits are applied by the payment handlers so
    // that they answer in their own response shapes.
    let cors = build_cors_layer(&state.config.cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        .route("/payments/init", post(payments::init_payment))
        .layer(CatchPanicLayer::custom(api_panic_response))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - the gateway controls delivery)
        .route(
            "/webhooks/monetico",
            post(webhooks::monetico_webhook).layer(CatchPanicLayer::custom(webhook_panic_response)),
        )
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn panic_message(err: &(dyn Any + Send)) -> &str {
    err.downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
}

#[allow(clippy::needless_pass_by_value)]
fn api_panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Internal(format!("handler panicked: {}", panic_message(err.as_ref()))).into_response()
}

#[allow(clippy::needless_pass_by_value)]
fn webhook_panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!(panic = panic_message(err.as_ref()), "Notification handler panicked");
    Ack::Rejected.into_response()
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(AnyOrigin)
            .allow_headers(AnyOrigin)
    }
}
