//! Application state.

use std::sync::Arc;

use monetico_pay_store::OrderStore;

use crate::config::ServiceConfig;
use crate::initiator::PaymentInitiator;
use crate::keys::KeyProvider;
use crate::verifier::WebhookVerifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Signs payment requests.
    pub initiator: PaymentInitiator,

    /// Verifies payment notifications.
    pub verifier: WebhookVerifier,

    keys: Arc<dyn KeyProvider>,
    order_store: &'static str,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn OrderStore>,
        keys: Arc<dyn KeyProvider>,
    ) -> Self {
        let order_store = store.backend();
        tracing::info!(backend = order_store, "Order store ready");

        if keys.signing_key().is_none() {
            tracing::warn!("No signing key - payments will not be available");
        }

        let initiator = PaymentInitiator::new(
            config.gateway.clone(),
            keys.clone(),
            config.storefront_origin.clone(),
        );
        let verifier = WebhookVerifier::new(keys.clone(), store);

        Self {
            config,
            initiator,
            verifier,
            keys,
            order_store,
        }
    }

    /// Check if a signing key is configured.
    #[must_use]
    pub fn has_signing_key(&self) -> bool {
        self.keys.signing_key().is_some()
    }

    /// Name of the order store backend.
    #[must_use]
    pub const fn order_store_backend(&self) -> &'static str {
        self.order_store
    }
}
