//! Supabase order store.
//!
//! Supabase exposes the storefront database through PostgREST. The update is
//! keyed by the derived gateway reference, which a plain table filter cannot
//! express, so it goes through a database function called over RPC. The
//! function receives the reference and the new statuses and returns the
//! number of orders it updated.
//!
//! The function ships with this crate in `sql/mark_order_payment.sql`
//! (also available as [`MARK_ORDER_PAYMENT_SQL`]) and must be installed in
//! the project before this backend is used; without it every call fails
//! with a PostgREST 404. It raises an error instead of writing when the
//! reference matches more than one order, which surfaces here as
//! `StoreError::Http`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use monetico_pay_core::{Reference, StatusUpdate};

use crate::error::{Result, StoreError};
use crate::OrderStore;

/// Default name of the RPC function.
pub const DEFAULT_RPC_FUNCTION: &str = "mark_order_payment";

/// Definition of the default RPC function.
pub const MARK_ORDER_PAYMENT_SQL: &str = include_str!("../sql/mark_order_payment.sql");

/// HTTP timeout for store calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// RPC arguments.
#[derive(Debug, Serialize)]
struct MarkOrderPayment<'a> {
    order_reference: &'a str,
    new_payment_status: &'a str,
    new_status: Option<&'a str>,
}

/// Order store backed by the Supabase REST API.
#[derive(Debug, Clone)]
pub struct SupabaseOrderStore {
    client: Client,
    base_url: String,
    service_role_key: String,
    rpc_function: String,
}

impl SupabaseOrderStore {
    /// Create a new Supabase store.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL (e.g., `"https://xyz.supabase.co"`)
    /// * `service_role_key` - Service role key (bypasses row-level security)
    /// * `rpc_function` - Name of the status update function
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Configuration` if the URL or key is empty or the
    /// HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        service_role_key: impl Into<String>,
        rpc_function: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let service_role_key = service_role_key.into();
        if base_url.is_empty() || service_role_key.is_empty() {
            return Err(StoreError::Configuration(
                "Supabase URL and service role key are required".into(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            service_role_key,
            rpc_function: rpc_function.into(),
        })
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.rpc_function)
    }
}

#[async_trait]
impl OrderStore for SupabaseOrderStore {
    async fn update_status(&self, reference: &Reference, update: &StatusUpdate) -> Result<u64> {
        let args = MarkOrderPayment {
            order_reference: reference.as_str(),
            new_payment_status: update.payment_status.as_str(),
            new_status: update.status.as_ref().map(|s| s.as_str()),
        };

        let response = self
            .client
            .post(self.rpc_url())
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(StoreError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_row_count(&body)
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}

/// The function returns an integer; PostgREST may also return `null` when it
/// is declared `void`.
fn parse_row_count(body: &str) -> Result<u64> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| StoreError::Serialization(e.to_string()))?;
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| StoreError::Serialization(format!("invalid row count: {n}"))),
        other => Err(StoreError::Serialization(format!(
            "unexpected RPC result: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_trims_trailing_slash() {
        let store = SupabaseOrderStore::new("https://xyz.supabase.co/", "key", "fn").unwrap();
        assert_eq!(store.rpc_url(), "https://xyz.supabase.co/rest/v1/rpc/fn");
    }

    #[test]
    fn store_requires_credentials() {
        assert!(SupabaseOrderStore::new("", "key", DEFAULT_RPC_FUNCTION).is_err());
        assert!(SupabaseOrderStore::new("https://xyz.supabase.co", "", DEFAULT_RPC_FUNCTION).is_err());
    }

    #[test]
    fn shipped_function_matches_rpc_arguments() {
        let sql = MARK_ORDER_PAYMENT_SQL;
        assert!(sql.contains(&format!("function public.{DEFAULT_RPC_FUNCTION}(")));

        let args = serde_json::to_value(MarkOrderPayment {
            order_reference: "X",
            new_payment_status: "paid",
            new_status: None,
        })
        .unwrap();
        for name in args.as_object().unwrap().keys() {
            assert!(sql.contains(&format!("{name} text")), "missing argument {name}");
        }
    }

    #[test]
    fn shipped_function_refuses_colliding_references() {
        assert!(MARK_ORDER_PAYMENT_SQL.contains("if matched > 1 then"));
        assert!(MARK_ORDER_PAYMENT_SQL
            .contains("upper(left(regexp_replace(id::text, '[^a-zA-Z0-9]', '', 'g'), 12))"));
    }

    #[test]
    fn row_count_parsing() {
        assert_eq!(parse_row_count("2").unwrap(), 2);
        assert_eq!(parse_row_count("null").unwrap(), 0);
        assert!(parse_row_count("\"x\"").is_err());
        assert!(parse_row_count("-1").is_err());
    }
}
