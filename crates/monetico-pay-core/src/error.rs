//! Error types for Monetico payments.

/// Result type for payment operations.
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur while initiating or verifying a payment.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// A required initiation input is missing or unusable.
    #[error("validation error: {0}")]
    Validation(String),

    /// The service is misconfigured (e.g. no signing secret).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The MAC asserted by the gateway does not match the recomputed one.
    #[error("signature mismatch")]
    SignatureMismatch {
        /// MAC computed locally.
        computed: String,
        /// MAC received from the gateway.
        received: String,
    },

    /// The order store failed.
    #[error("order store error: {0}")]
    Store(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Configuration(_) => "configuration_error",
            Self::SignatureMismatch { .. } => "signature_mismatch",
            Self::Store(_) => "store_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Errors raised by strict signing-key parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The secret is empty once wrappers and whitespace are removed.
    #[error("signing secret is empty")]
    Empty,

    /// The hex string has an odd number of digits.
    #[error("signing secret has an odd number of hex digits ({len})")]
    OddLength {
        /// Number of hex digits.
        len: usize,
    },

    /// A character that is not a hex digit was found.
    #[error("signing secret contains a non-hex character at position {position}")]
    InvalidHex {
        /// Zero-based character position.
        position: usize,
    },

    /// The length matches neither the long nor the legacy key format.
    #[error("signing secret has an unsupported length ({len} hex digits)")]
    UnsupportedLength {
        /// Number of hex digits.
        len: usize,
    },
}
