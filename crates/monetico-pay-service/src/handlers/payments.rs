//! Payment initiation handler.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::{read_body, within_timeout, RequestLimitError};
use crate::error::ApiError;
use crate::initiator::{InitiationRequest, SignedPaymentForm};
use crate::state::AppState;

/// Successful initiation response.
#[derive(Debug, Serialize)]
pub struct InitiationResponse {
    /// Always `true`.
    pub success: bool,
    /// Gateway target and signed fields.
    #[serde(flatten)]
    pub form: SignedPaymentForm,
}

impl From<RequestLimitError> for ApiError {
    fn from(err: RequestLimitError) -> Self {
        match err {
            RequestLimitError::Body(_) => Self::Validation(err.to_string()),
            RequestLimitError::Timeout(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Sign a payment request.
///
/// The body is decoded here rather than through the `Json` extractor so
/// that malformed input gets the same `{success:false}` shape as every
/// other failure.
pub async fn init_payment(
    State(state): State<Arc<AppState>>,
    body: Body,
) -> Result<Json<InitiationResponse>, ApiError> {
    within_timeout(&state.config, async {
        let body = read_body(&state.config, body).await?;

        let request: InitiationRequest = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid request body: {e}")))?;

        let form = state.initiator.initiate(request)?;

        Ok::<_, ApiError>(Json(InitiationResponse {
            success: true,
            form,
        }))
    })
    .await?
}
