//! Payment initiation.
//!
//! Turns an order descriptor from the storefront into the signed form the
//! browser posts to the gateway. Nothing is written anywhere: the order
//! already exists in `pending/pending` state when this runs.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use monetico_pay_core::{
    free_text, gateway_date, Amount, BillingAddress, PaymentError, PaymentRequestFields,
    Reference, Result, SignedPaymentFields,
};

use crate::config::GatewayConfig;
use crate::keys::KeyProvider;

/// Initiation request sent by the storefront.
///
/// Required fields are optional here so that their absence is reported as a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiationRequest {
    /// Order identifier.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Amount as a decimal string or a number.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    /// Payer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Storefront base URL.
    #[serde(default)]
    pub origin: Option<String>,
    /// Billing address.
    #[serde(default)]
    pub billing: Option<BillingAddress>,
}

/// A validated order descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOrder {
    /// Order identifier.
    pub order_id: String,
    /// Amount to charge.
    pub amount: Amount,
    /// Payer email.
    pub email: String,
    /// Storefront base URL, if the caller sent one.
    pub origin: Option<String>,
    /// Billing address.
    pub billing: Option<BillingAddress>,
}

impl TryFrom<InitiationRequest> for PaymentOrder {
    type Error = PaymentError;

    fn try_from(request: InitiationRequest) -> Result<Self> {
        let order_id = non_empty(request.order_id);
        let email = non_empty(request.email);
        let amount = request.amount.filter(|v| !is_blank(v));

        let (Some(order_id), Some(amount), Some(email)) = (order_id, amount, email) else {
            return Err(PaymentError::Validation(
                "Missing required fields: orderId, amount, or email".into(),
            ));
        };

        if Reference::from_order_id(&order_id).is_empty() {
            return Err(PaymentError::Validation(
                "orderId must contain at least one letter or digit".into(),
            ));
        }

        Ok(Self {
            order_id,
            amount: parse_amount(&amount)?,
            email,
            origin: non_empty(request.origin),
            billing: request.billing,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn parse_amount(value: &serde_json::Value) -> Result<Amount> {
    match value {
        serde_json::Value::String(s) => Amount::parse(s),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PaymentError::Validation(format!("invalid amount: {n}")))
            .and_then(Amount::from_units),
        other => Err(PaymentError::Validation(format!("invalid amount: {other}"))),
    }
}

/// The redirect form: where to post and what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPaymentForm {
    /// Gateway form target.
    pub action_url: String,
    /// Fields to post, `MAC` included.
    pub fields: SignedPaymentFields,
}

/// Builds and signs payment requests.
#[derive(Clone)]
pub struct PaymentInitiator {
    gateway: GatewayConfig,
    keys: Arc<dyn KeyProvider>,
    default_origin: String,
}

impl PaymentInitiator {
    /// Create an initiator.
    #[must_use]
    pub fn new(
        gateway: GatewayConfig,
        keys: Arc<dyn KeyProvider>,
        default_origin: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            keys,
            default_origin: default_origin.into(),
        }
    }

    /// Validate, format and sign a request at the current local time.
    ///
    /// # Errors
    ///
    /// - `PaymentError::Validation` if `orderId`, `amount` or `email` is missing or unusable.
    /// - `PaymentError::Configuration` if no signing key is configured.
    pub fn initiate(&self, request: InitiationRequest) -> Result<SignedPaymentForm> {
        self.initiate_at(request, Local::now().naive_local())
    }

    /// Same as [`initiate`](Self::initiate) with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`initiate`](Self::initiate).
    pub fn initiate_at(
        &self,
        request: InitiationRequest,
        now: NaiveDateTime,
    ) -> Result<SignedPaymentForm> {
        let order = PaymentOrder::try_from(request)?;

        let key = self.keys.signing_key().ok_or_else(|| {
            PaymentError::Configuration("Server misconfiguration: Missing Payment Key".into())
        })?;

        let fields = self.build_fields(&order, &now)?;
        let reference = fields.reference.clone();
        let signed = fields.sign(&key);

        tracing::info!(
            order_id = %order.order_id,
            reference = %reference,
            amount = %signed.fields.amount,
            origin = %order.origin.as_deref().unwrap_or(&self.default_origin),
            "Payment request signed"
        );

        Ok(SignedPaymentForm {
            action_url: self.gateway.action_url.clone(),
            fields: signed,
        })
    }

    fn build_fields(&self, order: &PaymentOrder, now: &NaiveDateTime) -> Result<PaymentRequestFields> {
        let order_context = match &order.billing {
            Some(address) => address.to_order_context()?,
            None => String::new(),
        };

        Ok(PaymentRequestFields {
            tpe: self.gateway.tpe.clone(),
            order_context,
            date: gateway_date(now),
            language: self.gateway.language.clone(),
            email: order.email.clone(),
            amount: order.amount.with_currency(&self.gateway.currency),
            reference: Reference::from_order_id(&order.order_id),
            merchant_code: self.gateway.merchant_code.clone(),
            free_text: free_text(&order.order_id),
            version: self.gateway.version.clone(),
        })
    }
}
