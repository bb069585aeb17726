//! PostgreSQL order store.
//!
//! Talks to the storefront's `orders` table directly. Orders are matched on
//! the gateway reference derived from their id, computed in SQL the same way
//! [`Reference::from_order_id`] does it.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use monetico_pay_core::{Reference, StatusUpdate};

use crate::error::{Result, StoreError};
use crate::OrderStore;

/// Maximum pooled connections. Each webhook performs a single statement.
const MAX_CONNECTIONS: u32 = 5;

/// Reference derivation in SQL: alphanumerics only, first 12, upper-case.
const REFERENCE_EXPR: &str =
    "upper(left(regexp_replace(id::text, '[^a-zA-Z0-9]', '', 'g'), 12))";

/// Order store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database at `url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }
}

/// Update guarded against colliding references: the write only happens when
/// exactly one order matches, and both counts come back in one round trip.
///
/// `$1` payment status, `$2` fulfillment status (NULL keeps the current one),
/// `$3` reference.
fn guarded_update_sql() -> String {
    format!(
        "WITH matched AS (SELECT id FROM orders WHERE {REFERENCE_EXPR} = $3), \
         updated AS ( \
             UPDATE orders SET payment_status = $1, status = COALESCE($2, status) \
             WHERE id IN (SELECT id FROM matched) AND (SELECT count(*) FROM matched) = 1 \
             RETURNING 1 \
         ) \
         SELECT (SELECT count(*) FROM matched) AS matched, (SELECT count(*) FROM updated) AS updated"
    )
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn update_status(&self, reference: &Reference, update: &StatusUpdate) -> Result<u64> {
        let (matched, updated): (i64, i64) = sqlx::query_as(&guarded_update_sql())
            .bind(update.payment_status.as_str())
            .bind(update.status.map(|s| s.as_str()))
            .bind(reference.as_str())
            .fetch_one(&self.pool)
            .await?;

        if matched > 1 {
            return Err(StoreError::AmbiguousReference {
                reference: reference.to_string(),
                matches: matched.unsigned_abs(),
            });
        }

        Ok(updated.unsigned_abs())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
