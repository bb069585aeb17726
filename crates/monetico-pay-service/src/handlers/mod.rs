//! API handlers.
//!
//! Both payment endpoints answer in a fixed shape no matter what goes
//! wrong, so the body limit and request timeout are enforced here rather
//! than by tower-http layers, whose 413/408 responses would break it.

use std::future::Future;

use axum::body::{Body, Bytes};

use crate::config::ServiceConfig;

pub mod health;
pub mod payments;
pub mod webhooks;

/// Why a request was cut short.
#[derive(Debug, thiserror::Error)]
pub enum RequestLimitError {
    /// The body could not be read within `max_body_bytes`.
    #[error("Invalid request body: {0}")]
    Body(#[source] axum::Error),

    /// The request did not complete within `request_timeout_seconds`.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

/// Buffer `body` up to the configured size limit.
pub(crate) async fn read_body(
    config: &ServiceConfig,
    body: Body,
) -> Result<Bytes, RequestLimitError> {
    axum::body::to_bytes(body, config.max_body_bytes)
        .await
        .map_err(RequestLimitError::Body)
}

/// Run `work` under the configured request timeout.
pub(crate) async fn within_timeout<F: Future>(
    config: &ServiceConfig,
    work: F,
) -> Result<F::Output, RequestLimitError> {
    tokio::time::timeout(config.request_timeout(), work)
        .await
        .map_err(|_| RequestLimitError::Timeout(config.request_timeout_seconds))
}
