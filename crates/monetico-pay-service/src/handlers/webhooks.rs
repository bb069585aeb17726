//! Payment gateway notification handler.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;

use super::{read_body, within_timeout, RequestLimitError};
use crate::state::AppState;
use crate::verifier::Ack;

/// Handle a Monetico payment notification.
///
/// Always answers `200 text/plain` with the `cdr` acknowledgement, including
/// for oversized bodies and timeouts.
pub async fn monetico_webhook(State(state): State<Arc<AppState>>, body: Body) -> Ack {
    let result = within_timeout(&state.config, async {
        let body = read_body(&state.config, body).await?;
        tracing::debug!(bytes = body.len(), "Received Monetico notification");
        Ok::<_, RequestLimitError>(state.verifier.verify(&body).await)
    })
    .await
    .and_then(std::convert::identity);

    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Payment notification not processed");
        Ack::Rejected
    })
}
