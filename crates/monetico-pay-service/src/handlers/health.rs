//! Health check handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Whether a signing key is loaded. Without one, initiation fails and
    /// notifications are rejected.
    pub signing_key: bool,
    /// Order store backend.
    pub order_store: &'static str,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "monetico-pay",
        version: env!("CARGO_PKG_VERSION"),
        signing_key: state.has_signing_key(),
        order_store: state.order_store_backend(),
    })
}
