//! Error types for the order store.

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// The REST backend answered with an error status.
    #[error("HTTP error: {status} - {message}")]
    Http {
        /// HTTP status code (0 if the request never completed).
        status: u16,
        /// Error message.
        message: String,
    },

    /// More than one order derives the same reference; nothing was written.
    #[error("ambiguous reference {reference}: {matches} orders match")]
    AmbiguousReference {
        /// The reference from the notification.
        reference: String,
        /// Number of orders it matches.
        matches: u64,
    },

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend is not usable as configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(feature = "supabase")]
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http {
            status: err.status().map_or(0, |s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for monetico_pay_core::PaymentError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}
