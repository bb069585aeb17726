//! Ordered field sets exchanged with the gateway.
//!
//! The order in which values are joined is part of the wire contract. Each
//! field set is a plain struct whose [`CanonicalFields`] implementation
//! lists its values in that order, so the order lives in one place.

use serde::{Deserialize, Serialize};

use crate::format::Reference;
use crate::key::SigningKey;
use crate::signer::{canonical_string, sign, Mac};

/// Wire names of the payment request fields, in signing order: terminal id
/// first, then the remaining fields sorted by name.
pub const PAYMENT_FIELD_ORDER: [&str; 10] = [
    "TPE",
    "contexte_commande",
    "date",
    "lgue",
    "mail",
    "montant",
    "reference",
    "societe",
    "texte-libre",
    "version",
];

/// Wire names of the payment result notification fields, in signing order.
pub const WEBHOOK_FIELD_ORDER: [&str; 20] = [
    "TPE",
    "date",
    "montant",
    "reference",
    "texte-libre",
    "version",
    "code-retour",
    "cvx",
    "vld",
    "brand",
    "status3ds",
    "numauto",
    "motifrefus",
    "originecb",
    "bincb",
    "hpancb",
    "ipclient",
    "originetr",
    "veres",
    "pares",
];

/// A field set with a protocol-defined signing order.
pub trait CanonicalFields {
    /// `(wire name, value)` pairs in signing order.
    fn canonical_values(&self) -> Vec<(&'static str, Option<&str>)>;

    /// Whether the string to sign ends with a separator.
    fn trailing_separator(&self) -> bool {
        false
    }

    /// The exact string the MAC is computed over.
    fn string_to_sign(&self) -> String {
        canonical_string(
            self.canonical_values().into_iter().map(|(_, value)| value),
            self.trailing_separator(),
        )
    }
}

/// Fields posted to the gateway to start a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequestFields {
    /// Terminal identifier.
    #[serde(rename = "TPE")]
    pub tpe: String,
    /// Base64 JSON billing context, empty when no address was given.
    #[serde(rename = "contexte_commande")]
    pub order_context: String,
    /// Transaction date (`dd/mm/yyyy:HH:MM:SS`).
    pub date: String,
    /// Language code.
    #[serde(rename = "lgue")]
    pub language: String,
    /// Payer email.
    #[serde(rename = "mail")]
    pub email: String,
    /// Amount and currency, e.g. `29.90EUR`.
    #[serde(rename = "montant")]
    pub amount: String,
    /// Order reference.
    pub reference: Reference,
    /// Merchant code.
    #[serde(rename = "societe")]
    pub merchant_code: String,
    /// Free-text label.
    #[serde(rename = "texte-libre")]
    pub free_text: String,
    /// Protocol version.
    pub version: String,
}

impl CanonicalFields for PaymentRequestFields {
    fn canonical_values(&self) -> Vec<(&'static str, Option<&str>)> {
        let values = [
            self.tpe.as_str(),
            self.order_context.as_str(),
            self.date.as_str(),
            self.language.as_str(),
            self.email.as_str(),
            self.amount.as_str(),
            self.reference.as_str(),
            self.merchant_code.as_str(),
            self.free_text.as_str(),
            self.version.as_str(),
        ];
        PAYMENT_FIELD_ORDER
            .into_iter()
            .zip(values.into_iter().map(Some))
            .collect()
    }
}

impl PaymentRequestFields {
    /// Sign the fields and attach the MAC.
    #[must_use]
    pub fn sign(self, key: &SigningKey) -> SignedPaymentFields {
        let mac = sign(&self, key).into_string();
        SignedPaymentFields { fields: self, mac }
    }
}

/// Payment request fields plus their MAC, as posted in the redirect form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPaymentFields {
    /// The signed fields.
    #[serde(flatten)]
    pub fields: PaymentRequestFields,
    /// Lowercase hex MAC.
    #[serde(rename = "MAC")]
    pub mac: String,
}

/// Payment result notification posted by the gateway.
///
/// Every field is optional on the wire; absent values sign as empty strings.
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookNotification {
    /// Terminal identifier.
    #[serde(rename = "TPE", skip_serializing_if = "Option::is_none")]
    pub tpe: Option<String>,
    /// Transaction date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Amount and currency.
    #[serde(rename = "montant", skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Order reference issued at initiation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Free-text label issued at initiation.
    #[serde(rename = "texte-libre", skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
    /// Protocol version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Payment outcome (`paiement`, `payetest`, `Annulation`, ...).
    #[serde(rename = "code-retour", skip_serializing_if = "Option::is_none")]
    pub return_code: Option<String>,
    /// Whether a card verification value was entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvx: Option<String>,
    /// Card expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vld: Option<String>,
    /// Card brand code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// 3-D Secure status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status3ds: Option<String>,
    /// Authorization number.
    #[serde(rename = "numauto", skip_serializing_if = "Option::is_none")]
    pub authorization_number: Option<String>,
    /// Refusal reason.
    #[serde(rename = "motifrefus", skip_serializing_if = "Option::is_none")]
    pub refusal_reason: Option<String>,
    /// Card issuing country.
    #[serde(rename = "originecb", skip_serializing_if = "Option::is_none")]
    pub card_origin: Option<String>,
    /// Card BIN.
    #[serde(rename = "bincb", skip_serializing_if = "Option::is_none")]
    pub card_bin: Option<String>,
    /// Hashed card number.
    #[serde(rename = "hpancb", skip_serializing_if = "Option::is_none")]
    pub card_hash: Option<String>,
    /// Payer IP address.
    #[serde(rename = "ipclient", skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    /// Transaction origin country.
    #[serde(rename = "originetr", skip_serializing_if = "Option::is_none")]
    pub transaction_origin: Option<String>,
    /// 3-D Secure enrolment result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veres: Option<String>,
    /// 3-D Secure authentication result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pares: Option<String>,
    /// MAC asserted by the gateway.
    #[serde(rename = "MAC", skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

impl CanonicalFields for WebhookNotification {
    fn canonical_values(&self) -> Vec<(&'static str, Option<&str>)> {
        let values = [
            &self.tpe,
            &self.date,
            &self.amount,
            &self.reference,
            &self.free_text,
            &self.version,
            &self.return_code,
            &self.cvx,
            &self.vld,
            &self.brand,
            &self.status3ds,
            &self.authorization_number,
            &self.refusal_reason,
            &self.card_origin,
            &self.card_bin,
            &self.card_hash,
            &self.client_ip,
            &self.transaction_origin,
            &self.veres,
            &self.pares,
        ];
        WEBHOOK_FIELD_ORDER
            .into_iter()
            .zip(values.into_iter().map(Option::as_deref))
            .collect()
    }

    // The notification string ends with a separator.
    fn trailing_separator(&self) -> bool {
        true
    }
}

impl WebhookNotification {
    /// Recompute the MAC over this notification.
    #[must_use]
    pub fn compute_mac(&self, key: &SigningKey) -> Mac {
        sign(self, key)
    }

    /// Attach a freshly computed MAC, as the gateway would.
    #[must_use]
    pub fn signed(mut self, key: &SigningKey) -> Self {
        self.mac = Some(self.compute_mac(key).into_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_SECRET: &str =
        "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff0011223344556677";

    fn request_fields() -> PaymentRequestFields {
        PaymentRequestFields {
            tpe: "7675540".into(),
            order_context: String::new(),
            date: "17/10/2026:14:30:00".into(),
            language: "FR".into(),
            email: "client@example.fr".into(),
            amount: "29.90EUR".into(),
            reference: Reference::from_order_id("abcd1234-ef56"),
            merchant_code: "boucheries".into(),
            free_text: "Order_abcd1234".into(),
            version: "3.0".into(),
        }
    }

    #[test]
    fn payment_order_is_terminal_then_alphabetical() {
        assert_eq!(PAYMENT_FIELD_ORDER[0], "TPE");
        let mut rest = PAYMENT_FIELD_ORDER[1..].to_vec();
        rest.sort_unstable();
        assert_eq!(rest, PAYMENT_FIELD_ORDER[1..]);
    }

    #[test]
    fn payment_string_to_sign() {
        assert_eq!(
            request_fields().string_to_sign(),
            "7675540**17/10/2026:14:30:00*FR*client@example.fr*29.90EUR*ABCD1234EF56*boucheries*Order_abcd1234*3.0"
        );
    }

    #[test]
    fn payment_fields_sign_to_known_mac() {
        let key = SigningKey::from_secret(LONG_SECRET);
        let signed = request_fields().sign(&key);
        assert_eq!(signed.mac, "83814e76e629128189dba477c9d378375c273731");
    }

    #[test]
    fn signed_fields_serialize_with_wire_names() {
        let key = SigningKey::from_secret(LONG_SECRET);
        let json = serde_json::to_value(request_fields().sign(&key)).unwrap();
        assert_eq!(json["TPE"], "7675540");
        assert_eq!(json["texte-libre"], "Order_abcd1234");
        assert_eq!(json["montant"], "29.90EUR");
        assert_eq!(json["reference"], "ABCD1234EF56");
        assert_eq!(json["MAC"].as_str().unwrap().len(), 40);
        assert_eq!(json.as_object().unwrap().len(), 11);
    }

    #[test]
    fn webhook_string_has_trailing_separator() {
        let notification = WebhookNotification {
            tpe: Some("7675540".into()),
            reference: Some("ABCD1234EF56".into()),
            return_code: Some("paiement".into()),
            ..WebhookNotification::default()
        };
        assert_eq!(
            notification.string_to_sign(),
            "7675540***ABCD1234EF56***paiement**************"
        );
    }

    #[test]
    fn webhook_mac_ignores_the_mac_field() {
        let key = SigningKey::from_secret(LONG_SECRET);
        let notification = WebhookNotification {
            reference: Some("ABC".into()),
            ..WebhookNotification::default()
        };
        let signed = notification.clone().signed(&key);
        assert_eq!(signed.compute_mac(&key), notification.compute_mac(&key));
        assert!(signed.compute_mac(&key).matches(signed.mac.as_deref().unwrap()));
    }

    #[test]
    fn webhook_names_match_serialized_fields() {
        let mut notification = WebhookNotification::default();
        for (i, slot) in [
            &mut notification.tpe,
            &mut notification.date,
            &mut notification.amount,
            &mut notification.reference,
            &mut notification.free_text,
            &mut notification.version,
            &mut notification.return_code,
            &mut notification.cvx,
            &mut notification.vld,
            &mut notification.brand,
            &mut notification.status3ds,
            &mut notification.authorization_number,
            &mut notification.refusal_reason,
            &mut notification.card_origin,
            &mut notification.card_bin,
            &mut notification.card_hash,
            &mut notification.client_ip,
            &mut notification.transaction_origin,
            &mut notification.veres,
            &mut notification.pares,
        ]
        .into_iter()
        .enumerate()
        {
            *slot = Some(format!("v{i}"));
        }

        let json = serde_json::to_value(&notification).unwrap();
        for (i, name) in WEBHOOK_FIELD_ORDER.iter().enumerate() {
            assert_eq!(json[*name], format!("v{i}"), "field {name}");
        }
    }
}
