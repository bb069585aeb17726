//! API error types and responses.
//!
//! The storefront reads the `success` flag of the body rather than the HTTP
//! status, so initiation failures are rendered as `200 OK` JSON.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use monetico_pay_core::PaymentError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request - missing or unusable input.
    #[error("{0}")]
    Validation(String),

    /// The service cannot sign requests as configured.
    #[error("{0}")]
    Configuration(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Validation(msg) => tracing::debug!(error = %msg, "Rejected payment request"),
            Self::Configuration(msg) => tracing::error!(error = %msg, "Service misconfigured"),
            Self::Internal(msg) => tracing::error!(error = %msg, "Internal server error"),
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.code(),
        };

        (StatusCode::OK, Json(body)).into_response()
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(msg) => Self::Validation(msg),
            PaymentError::Configuration(msg) => Self::Configuration(msg),
            other @ (PaymentError::SignatureMismatch { .. }
            | PaymentError::Store(_)
            | PaymentError::Internal(_)) => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_errors_map_to_api_codes() {
        let validation: ApiError = PaymentError::Validation("missing".into()).into();
        assert_eq!(validation.code(), "validation_error");
        assert_eq!(validation.to_string(), "missing");

        let config: ApiError = PaymentError::Configuration("no key".into()).into();
        assert_eq!(config.code(), "configuration_error");

        let store: ApiError = PaymentError::Store("down".into()).into();
        assert_eq!(store.code(), "internal_error");
    }

    #[test]
    fn errors_render_as_ok_status() {
        let response = ApiError::Validation("missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
