//! In-memory order store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use monetico_pay_core::{Order, Reference, StatusUpdate};

use crate::error::{Result, StoreError};
use crate::OrderStore;

/// Order store backed by a map, keyed by order id.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order.
    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.id.clone(), order);
    }

    /// Get an order by id.
    pub async fn get(&self, id: &str) -> Option<Order> {
        self.orders.read().await.get(id).cloned()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn update_status(&self, reference: &Reference, update: &StatusUpdate) -> Result<u64> {
        let mut orders = self.orders.write().await;
        let mut matching = orders.values_mut().filter(|o| o.reference() == *reference);

        let Some(order) = matching.next() else {
            return Ok(0);
        };
        let extra = matching.count() as u64;
        if extra > 0 {
            return Err(StoreError::AmbiguousReference {
                reference: reference.to_string(),
                matches: extra + 1,
            });
        }

        order.apply(update);
        Ok(1)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
