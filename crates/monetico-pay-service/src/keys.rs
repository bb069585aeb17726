//! Signing key providers.
//!
//! The initiator and verifier get their key through [`KeyProvider`] so tests
//! can inject a fixed key (or none) without touching the environment.

use monetico_pay_core::{KeyError, SigningKey};

use crate::config::ServiceConfig;

/// Source of the usable signing key.
pub trait KeyProvider: Send + Sync {
    /// The usable key, or `None` when no secret is configured.
    fn signing_key(&self) -> Option<SigningKey>;
}

/// A key normalized once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    key: Option<SigningKey>,
}

impl StaticKeyProvider {
    /// Wrap an already normalized key.
    #[must_use]
    pub const fn new(key: Option<SigningKey>) -> Self {
        Self { key }
    }

    /// Normalize `secret` leniently.
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        Self::new(Some(SigningKey::from_secret(secret)))
    }

    /// Provider with no key; initiation fails and notifications are rejected.
    #[must_use]
    pub const fn missing() -> Self {
        Self::new(None)
    }

    /// Build the provider from configuration.
    ///
    /// # Errors
    ///
    /// With `strict_key` enabled, returns the [`KeyError`] for a malformed
    /// or unsupported secret. A missing secret is not an error here; it is
    /// logged and surfaces on each request instead.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, KeyError> {
        let Some(secret) = config.secret_key.as_deref() else {
            tracing::warn!(
                "MONETICO_SECRET_KEY not configured - payment initiation will fail and notifications will be rejected"
            );
            return Ok(Self::missing());
        };

        let key = if config.strict_key {
            SigningKey::from_secret_strict(secret)?
        } else {
            SigningKey::from_secret(secret)
        };

        tracing::info!(
            key_format = ?key.format(),
            key_len = key.as_bytes().len(),
            strict = config.strict_key,
            "Signing key loaded"
        );

        Ok(Self::new(Some(key)))
    }
}

impl KeyProvider for StaticKeyProvider {
    fn signing_key(&self) -> Option<SigningKey> {
        self.key.clone()
    }
}
