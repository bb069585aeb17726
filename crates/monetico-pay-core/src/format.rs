//! Formatting of values placed in gateway field sets.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// Date format expected by the gateway (`dd/mm/yyyy:HH:MM:SS`).
pub const GATEWAY_DATE_FORMAT: &str = "%d/%m/%Y:%H:%M:%S";

/// Country used in the billing context when none is given.
pub const DEFAULT_BILLING_COUNTRY: &str = "FR";

/// Prefix of the free-text label.
const FREE_TEXT_PREFIX: &str = "Order_";

/// Number of order id characters kept in the free-text label.
const FREE_TEXT_ID_CHARS: usize = 8;

/// Upper bound on accepted amounts, in currency units.
const MAX_AMOUNT_UNITS: f64 = 1e12;

/// The gateway-visible order reference.
///
/// Alphanumeric only, upper-case, at most 12 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// Gateway hard limit on the reference length.
    pub const MAX_LEN: usize = 12;

    /// Derive the reference from an order identifier.
    ///
    /// Non-alphanumeric characters are removed before truncation. Applying
    /// this to an existing reference returns it unchanged.
    #[must_use]
    pub fn from_order_id(order_id: &str) -> Self {
        Self(
            order_id
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .take(Self::MAX_LEN)
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        )
    }

    /// The reference text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positive payment amount, held in integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount {
    cents: i64,
}

impl Amount {
    /// Create an amount from cents.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Validation` if `cents` is not positive.
    pub fn from_cents(cents: i64) -> Result<Self> {
        if cents <= 0 {
            return Err(PaymentError::Validation(format!(
                "amount must be positive, got {cents} cents"
            )));
        }
        Ok(Self { cents })
    }

    /// Create an amount from a value in currency units, rounded to the cent.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Validation` for non-finite, non-positive or
    /// absurdly large values.
    #[allow(clippy::cast_possible_truncation)] // bounded by MAX_AMOUNT_UNITS
    pub fn from_units(units: f64) -> Result<Self> {
        if !units.is_finite() || units > MAX_AMOUNT_UNITS {
            return Err(PaymentError::Validation(format!("invalid amount: {units}")));
        }
        Self::from_cents((units * 100.0).round() as i64)
    }

    /// Parse a decimal string such as `"29.9"` or `"7"`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Validation` if the text is not a positive number.
    pub fn parse(text: &str) -> Result<Self> {
        let units: f64 = text
            .trim()
            .parse()
            .map_err(|_| PaymentError::Validation(format!("invalid amount: {text:?}")))?;
        Self::from_units(units)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Render as the gateway expects: two decimals immediately followed by
    /// the currency code, e.g. `29.90EUR`.
    #[must_use]
    pub fn with_currency(&self, currency: &str) -> String {
        format!("{}.{:02}{currency}", self.cents / 100, self.cents % 100)
    }
}

/// Billing address forwarded to the gateway in the order context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingAddress {
    /// Full name of the payer.
    #[serde(default)]
    pub name: Option<String>,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// ISO country code (defaults to `FR`).
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Serialize)]
struct OrderContext<'a> {
    billing: BillingContext<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BillingContext<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    address_line1: &'a str,
    city: &'a str,
    postal_code: &'a str,
    country: &'a str,
}

impl BillingAddress {
    /// Encode as the gateway's order context: base64 of
    /// `{"billing":{...}}`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Internal` if JSON serialization fails.
    pub fn to_order_context(&self) -> Result<String> {
        let context = OrderContext {
            billing: BillingContext {
                name: self.name.as_deref().filter(|n| !n.trim().is_empty()),
                address_line1: &self.address,
                city: &self.city,
                postal_code: &self.postal_code,
                country: self
                    .country
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(DEFAULT_BILLING_COUNTRY),
            },
        };
        let json =
            serde_json::to_vec(&context).map_err(|e| PaymentError::Internal(e.to_string()))?;
        Ok(general_purpose::STANDARD.encode(json))
    }
}

/// Format a timestamp for the `date` field.
#[must_use]
pub fn gateway_date(at: &NaiveDateTime) -> String {
    at.format(GATEWAY_DATE_FORMAT).to_string()
}

/// Machine-safe free-text label for an order: `Order_` followed by the first
/// eight alphanumeric characters of the id.
#[must_use]
pub fn free_text(order_id: &str) -> String {
    let id: String = order_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(FREE_TEXT_ID_CHARS)
        .collect();
    format!("{FREE_TEXT_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reference_strips_uppercases_and_truncates() {
        let reference = Reference::from_order_id("ab-12_CD!!longer-than-twelve");
        assert_eq!(reference.as_str(), "AB12CDLONGER");
        assert_eq!(reference.as_str().len(), Reference::MAX_LEN);
        assert!(reference.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn reference_is_idempotent() {
        let reference = Reference::from_order_id("5f0c1a2b-9d3e-4f5a-8b7c-6d5e4f3a2b1c");
        assert_eq!(reference.as_str(), "5F0C1A2B9D3E");
        assert_eq!(Reference::from_order_id(reference.as_str()), reference);
    }

    #[test]
    fn short_reference_is_kept_whole() {
        assert_eq!(Reference::from_order_id("a-1").as_str(), "A1");
        assert!(Reference::from_order_id("--").is_empty());
    }

    #[test]
    fn amount_formats_with_two_decimals_and_currency() {
        assert_eq!(Amount::from_units(7.0).unwrap().with_currency("EUR"), "7.00EUR");
        assert_eq!(Amount::from_units(12.5).unwrap().with_currency("EUR"), "12.50EUR");
        assert_eq!(Amount::parse("29.9").unwrap().with_currency("EUR"), "29.90EUR");
        assert_eq!(Amount::parse(" 0.05 ").unwrap().with_currency("EUR"), "0.05EUR");
    }

    #[test]
    fn amount_rounds_to_the_cent() {
        assert_eq!(Amount::parse("19.999").unwrap().cents(), 2000);
        assert_eq!(Amount::parse("1234.56").unwrap().cents(), 123_456);
    }

    #[test]
    fn amount_rejects_unusable_values() {
        assert!(Amount::parse("abc").is_err());
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("0").is_err());
        assert!(Amount::parse("-3").is_err());
        assert!(Amount::parse("NaN").is_err());
        assert!(Amount::from_units(f64::INFINITY).is_err());
        assert!(Amount::from_cents(0).is_err());
    }

    #[test]
    fn date_uses_gateway_format() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap();
        assert_eq!(gateway_date(&at), "07/03/2026:09:05:02");
    }

    #[test]
    fn free_text_is_machine_safe() {
        assert_eq!(free_text("5f0c1a2b-9d3e-4f5a"), "Order_5f0c1a2b");
        assert_eq!(free_text("a*b c"), "Order_abc");
    }

    #[test]
    fn billing_context_is_base64_json() {
        let address = BillingAddress {
            name: None,
            address: "12 rue des Halles".into(),
            city: "Paris".into(),
            postal_code: "75001".into(),
            country: None,
        };
        assert_eq!(
            address.to_order_context().unwrap(),
            "eyJiaWxsaW5nIjp7ImFkZHJlc3NMaW5lMSI6IjEyIHJ1ZSBkZXMgSGFsbGVzIiwiY2l0eSI6IlBhcmlzIiwicG9zdGFsQ29kZSI6Ijc1MDAxIiwiY291bnRyeSI6IkZSIn19"
        );
    }

    #[test]
    fn billing_context_includes_name_when_present() {
        let address = BillingAddress {
            name: Some("Jeanne Dupont".into()),
            address: "1 place du Marché".into(),
            city: "Lyon".into(),
            postal_code: "69001".into(),
            country: Some("FR".into()),
        };
        let encoded = address.to_order_context().unwrap();
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(json["billing"]["name"], "Jeanne Dupont");
        assert_eq!(json["billing"]["addressLine1"], "1 place du Marché");
        assert_eq!(json["billing"]["postalCode"], "69001");
    }
}
