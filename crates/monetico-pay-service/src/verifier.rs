//! Payment notification verification.
//!
//! The gateway keeps redelivering a notification until it reads `cdr=0`, so
//! every outcome collapses to one of two fixed acknowledgements. Details go
//! to the logs only.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use monetico_pay_core::{
    PaymentError, Reference, Result, ReturnCode, StatusUpdate, WebhookNotification,
};
use monetico_pay_store::OrderStore;

use crate::keys::KeyProvider;

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Notification authentic and processed (`cdr=0`).
    Accepted,
    /// Anything else (`cdr=1`); the gateway will retry.
    Rejected,
}

impl Ack {
    /// Exact response body.
    #[must_use]
    pub const fn body(self) -> &'static str {
        match self {
            Self::Accepted => "version=2\ncdr=0\n",
            Self::Rejected => "version=2\ncdr=1\n",
        }
    }
}

impl IntoResponse for Ack {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            self.body(),
        )
            .into_response()
    }
}

/// What an authentic notification led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The update was sent to the store.
    Applied {
        /// Reference the update was keyed on.
        reference: Reference,
        /// Statuses written.
        update: StatusUpdate,
        /// Orders updated; zero when none matched.
        updated: u64,
    },
    /// The notification carried no usable reference.
    NoReference,
}

/// Verifies notifications and applies their outcome to the order store.
#[derive(Clone)]
pub struct WebhookVerifier {
    keys: Arc<dyn KeyProvider>,
    store: Arc<dyn OrderStore>,
}

impl WebhookVerifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(keys: Arc<dyn KeyProvider>, store: Arc<dyn OrderStore>) -> Self {
        Self { keys, store }
    }

    /// Verify a raw form-encoded body and produce the acknowledgement.
    pub async fn verify(&self, body: &[u8]) -> Ack {
        let notification: WebhookNotification = match serde_urlencoded::from_bytes(body) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable payment notification");
                return Ack::Rejected;
            }
        };

        match self.verify_notification(&notification).await {
            Ok(VerificationOutcome::Applied {
                reference,
                update,
                updated: 0,
            }) => {
                tracing::warn!(
                    reference = %reference,
                    payment_status = %update.payment_status,
                    "No order matched notification reference"
                );
                Ack::Accepted
            }
            Ok(VerificationOutcome::Applied {
                reference,
                update,
                updated,
            }) => {
                tracing::info!(
                    reference = %reference,
                    payment_status = %update.payment_status,
                    updated,
                    "Order payment status updated"
                );
                Ack::Accepted
            }
            Ok(VerificationOutcome::NoReference) => {
                tracing::warn!("Authentic notification without reference, nothing to update");
                Ack::Accepted
            }
            Err(PaymentError::SignatureMismatch { computed, received }) => {
                tracing::warn!(
                    computed = %computed,
                    received = %received,
                    reference = ?notification.reference,
                    "Payment notification MAC mismatch"
                );
                Ack::Rejected
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    code = e.code(),
                    reference = ?notification.reference,
                    "Payment notification rejected"
                );
                Ack::Rejected
            }
        }
    }

    /// Authenticate `notification` and, if authentic, update the order.
    ///
    /// # Errors
    ///
    /// - `PaymentError::Configuration` if no signing key is configured.
    /// - `PaymentError::Validation` if the notification carries no MAC.
    /// - `PaymentError::SignatureMismatch` if the MAC does not match; the
    ///   store is not touched.
    /// - `PaymentError::Store` if the update fails, including when the
    ///   reference matches more than one order.
    pub async fn verify_notification(
        &self,
        notification: &WebhookNotification,
    ) -> Result<VerificationOutcome> {
        let key = self.keys.signing_key().ok_or_else(|| {
            PaymentError::Configuration("Server misconfiguration: Missing Payment Key".into())
        })?;

        let received = notification
            .mac
            .as_deref()
            .map(str::trim)
            .filter(|mac| !mac.is_empty())
            .ok_or_else(|| PaymentError::Validation("notification has no MAC".into()))?;

        let computed = notification.compute_mac(&key);
        if !computed.matches(received) {
            return Err(PaymentError::SignatureMismatch {
                computed: computed.into_string(),
                received: received.to_string(),
            });
        }

        let reference = Reference::from_order_id(notification.reference.as_deref().unwrap_or(""));
        if reference.is_empty() {
            return Ok(VerificationOutcome::NoReference);
        }

        let return_code = ReturnCode::parse(notification.return_code.as_deref().unwrap_or(""));
        let update = StatusUpdate::for_return_code(&return_code);
        tracing::debug!(
            reference = %reference,
            return_code = ?return_code,
            "Authentic payment notification"
        );

        let updated = self.store.update_status(&reference, &update).await?;

        Ok(VerificationOutcome::Applied {
            reference,
            update,
            updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use monetico_pay_core::{Order, OrderStatus, PaymentStatus, SigningKey};
    use monetico_pay_store::MemoryOrderStore;

    use crate::keys::StaticKeyProvider;

    const LONG_SECRET: &str =
        "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff0011223344556677";
    const ORDER_ID: &str = "abcd1234-ef56-4a7b-9c8d";

    fn key() -> SigningKey {
        SigningKey::from_secret(LONG_SECRET)
    }

    async fn setup() -> (WebhookVerifier, Arc<MemoryOrderStore>) {
        let store = Arc::new(MemoryOrderStore::new());
        store.insert(Order::pending(ORDER_ID)).await;
        let verifier = WebhookVerifier::new(
            Arc::new(StaticKeyProvider::new(Some(key()))),
            store.clone(),
        );
        (verifier, store)
    }

    fn notification(return_code: &str) -> WebhookNotification {
        WebhookNotification {
            tpe: Some("7675540".into()),
            date: Some("17/10/2026_a_14:31:02".into()),
            amount: Some("29.90EUR".into()),
            reference: Some("ABCD1234EF56".into()),
            free_text: Some("Order_abcd1234".into()),
            version: Some("3.0".into()),
            return_code: Some(return_code.into()),
            cvx: Some("oui".into()),
            vld: Some("1228".into()),
            brand: Some("VI".into()),
            status3ds: Some("1".into()),
            ..WebhookNotification::default()
        }
        .signed(&key())
    }

    fn form(notification: &WebhookNotification) -> Vec<u8> {
        serde_urlencoded::to_string(notification).unwrap().into_bytes()
    }

    #[test]
    fn ack_bodies_are_exact() {
        assert_eq!(Ack::Accepted.body(), "version=2\ncdr=0\n");
        assert_eq!(Ack::Rejected.body(), "version=2\ncdr=1\n");
    }

    #[tokio::test]
    async fn success_marks_order_paid_and_is_idempotent() {
        let (verifier, store) = setup().await;
        let body = form(&notification("paiement"));

        assert_eq!(verifier.verify(&body).await, Ack::Accepted);
        assert_eq!(verifier.verify(&body).await, Ack::Accepted);

        let order = store.get(ORDER_ID).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_mode_code_is_success_in_any_case() {
        let (verifier, store) = setup().await;
        assert_eq!(
            verifier.verify(&form(&notification("PayeTest"))).await,
            Ack::Accepted
        );
        assert_eq!(
            store.get(ORDER_ID).await.unwrap().payment_status,
            PaymentStatus::Paid
        );
    }

    #[tokio::test]
    async fn tampered_mac_leaves_order_untouched() {
        let (verifier, store) = setup().await;
        let mut tampered = notification("paiement");
        let mut mac = tampered.mac.take().unwrap();
        let flipped = if mac.ends_with('0') { '1' } else { '0' };
        mac.pop();
        mac.push(flipped);
        tampered.mac = Some(mac);

        assert_eq!(verifier.verify(&form(&tampered)).await, Ack::Rejected);
        assert_eq!(store.get(ORDER_ID).await.unwrap(), Order::pending(ORDER_ID));
    }

    #[tokio::test]
    async fn tampered_field_is_rejected() {
        let (verifier, store) = setup().await;
        let mut tampered = notification("Annulation");
        tampered.return_code = Some("paiement".into());

        assert_eq!(verifier.verify(&form(&tampered)).await, Ack::Rejected);
        assert_eq!(store.get(ORDER_ID).await.unwrap(), Order::pending(ORDER_ID));
    }

    #[tokio::test]
    async fn uppercase_mac_is_accepted() {
        let (verifier, _store) = setup().await;
        let mut upper = notification("paiement");
        upper.mac = upper.mac.map(|m| m.to_uppercase());
        assert_eq!(verifier.verify(&form(&upper)).await, Ack::Accepted);
    }

    #[tokio::test]
    async fn refusal_only_fails_payment() {
        let (verifier, store) = setup().await;
        assert_eq!(
            verifier.verify(&form(&notification("refused"))).await,
            Ack::Accepted
        );

        let order = store.get(ORDER_ID).await.unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Failed);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_order_is_still_acknowledged() {
        let (verifier, _store) = setup().await;
        let mut other = notification("paiement");
        other.reference = Some("ZZZZ9999".into());
        let other = other.signed(&key());

        let outcome = verifier.verify_notification(&other).await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::Applied { updated: 0, .. }));
        assert_eq!(verifier.verify(&form(&other)).await, Ack::Accepted);
    }

    #[tokio::test]
    async fn colliding_references_are_rejected_without_writes() {
        let store = Arc::new(MemoryOrderStore::new());
        store.insert(Order::pending("order-000000001")).await;
        store.insert(Order::pending("order-000000002")).await;
        let verifier = WebhookVerifier::new(
            Arc::new(StaticKeyProvider::new(Some(key()))),
            store.clone(),
        );

        let mut colliding = notification("paiement");
        colliding.reference = Some("ORDER0000000".into());
        let colliding = colliding.signed(&key());

        let err = verifier.verify_notification(&colliding).await.unwrap_err();
        assert!(matches!(err, PaymentError::Store(_)));
        assert_eq!(verifier.verify(&form(&colliding)).await, Ack::Rejected);

        for id in ["order-000000001", "order-000000002"] {
            assert_eq!(store.get(id).await.unwrap(), Order::pending(id));
        }
    }

    #[tokio::test]
    async fn missing_mac_is_rejected() {
        let (verifier, _store) = setup().await;
        let mut unsigned = notification("paiement");
        unsigned.mac = None;

        let err = verifier.verify_notification(&unsigned).await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
        assert_eq!(verifier.verify(&form(&unsigned)).await, Ack::Rejected);
    }

    #[tokio::test]
    async fn missing_key_is_rejected() {
        let store = Arc::new(MemoryOrderStore::new());
        store.insert(Order::pending(ORDER_ID)).await;
        let verifier = WebhookVerifier::new(Arc::new(StaticKeyProvider::missing()), store.clone());

        assert_eq!(
            verifier.verify(&form(&notification("paiement"))).await,
            Ack::Rejected
        );
        assert_eq!(store.get(ORDER_ID).await.unwrap(), Order::pending(ORDER_ID));
    }

    #[tokio::test]
    async fn garbage_body_is_rejected() {
        let (verifier, _store) = setup().await;
        assert_eq!(verifier.verify(b"%%%=&&=%zz").await, Ack::Rejected);
        assert_eq!(verifier.verify(b"").await, Ack::Rejected);
    }
}
