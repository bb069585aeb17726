//! Order store backends for Monetico payments.
//!
//! The payment flow never owns orders: the storefront creates them and the
//! back office manages them. The only write this crate performs is setting
//! the payment and fulfillment status of the orders matching a gateway
//! reference.
//!
//! # Backends
//!
//! - `MemoryOrderStore`: in-process map, for tests and local runs
//! - `PgOrderStore`: direct PostgreSQL access via `sqlx` (feature `postgres`)
//! - `SupabaseOrderStore`: Supabase REST RPC via `reqwest` (feature `supabase`)
//!
//! # Example
//!
//! ```
//! use monetico_pay_core::{Order, StatusUpdate};
//! use monetico_pay_store::{MemoryOrderStore, OrderStore};
//!
//! # tokio_test_block(async {
//! let store = MemoryOrderStore::new();
//! let order = Order::pending("5f0c1a2b-9d3e-4f5a-8b7c-6d5e4f3a2b1c");
//! store.insert(order.clone()).await;
//!
//! let updated = store
//!     .update_status(&order.reference(), &StatusUpdate::paid())
//!     .await
//!     .unwrap();
//! assert_eq!(updated, 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "supabase")]
pub mod supabase;

pub use error::{Result, StoreError};
pub use memory::MemoryOrderStore;
#[cfg(feature = "postgres")]
pub use postgres::PgOrderStore;
#[cfg(feature = "supabase")]
pub use supabase::SupabaseOrderStore;

use async_trait::async_trait;
use monetico_pay_core::{Reference, StatusUpdate};

/// The order operations the payment flow needs.
///
/// Implementations must only touch the payment and fulfillment status
/// fields.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Apply `update` to the order whose gateway reference is `reference`.
    ///
    /// Returns the number of orders updated: one, or zero when no order
    /// matched, which is not an error. References are truncated ids, so two
    /// orders can share one; in that case nothing is written.
    ///
    /// # Errors
    ///
    /// - `StoreError::AmbiguousReference` if more than one order matches.
    /// - Any other variant if the backend cannot be reached or rejects the write.
    async fn update_status(&self, reference: &Reference, update: &StatusUpdate) -> Result<u64>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
