//! Common test utilities for monetico-pay integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;

use monetico_pay_core::{Order, SigningKey, WebhookNotification};
use monetico_pay_service::{create_router, AppState, ServiceConfig, StaticKeyProvider};
use monetico_pay_store::{MemoryOrderStore, OrderStore};

/// 80-hex-digit merchant secret used by all tests.
pub const TEST_SECRET: &str =
    "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff0011223344556677";

/// Order seeded in the store by [`TestHarness::with_order`].
pub const ORDER_ID: &str = "abcd1234-ef56-4a7b-9c8d-0e1f2a3b4c5d";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The order store behind the server.
    pub store: Arc<MemoryOrderStore>,
    /// The signing key the server uses, if any.
    pub key: Option<SigningKey>,
}

impl TestHarness {
    /// Create a harness with the test secret and an empty store.
    pub fn new() -> Self {
        Self::build(Some(SigningKey::from_secret(TEST_SECRET)), |_| {})
    }

    /// Create a harness with no signing key configured.
    pub fn without_key() -> Self {
        Self::build(None, |_| {})
    }

    /// Create a harness with adjusted configuration.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        Self::build(Some(SigningKey::from_secret(TEST_SECRET)), adjust)
    }

    /// Create a harness with one pending order in the store.
    pub async fn with_order() -> Self {
        let harness = Self::new();
        harness.store.insert(Order::pending(ORDER_ID)).await;
        harness
    }

    fn build(key: Option<SigningKey>, adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let store = Arc::new(MemoryOrderStore::new());
        let mut config = test_config();
        adjust(&mut config);

        let server = server_with_store(config, store.clone(), key.clone());

        Self { server, store, key }
    }

    /// A notification for [`ORDER_ID`] signed with the harness key.
    pub fn notification(&self, return_code: &str) -> WebhookNotification {
        let key = self
            .key
            .as_ref()
            .cloned()
            .unwrap_or_else(|| SigningKey::from_secret(TEST_SECRET));

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
            brand: Some("MC".into()),
            status3ds: Some("1".into()),
            authorization_number: Some("123456".into()),
            card_origin: Some("FRA".into()),
            client_ip: Some("203.0.113.7".into()),
            transaction_origin: Some("FRA".into()),
            ..WebhookNotification::default()
        }
        .signed(&key)
    }
}

/// Configuration used by every harness unless adjusted.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        secret_key: None,
        cors_origins: vec!["*".into()],
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 30,
        ..ServiceConfig::default()
    }
}

/// Serve the router over an arbitrary order store.
pub fn server_with_store(
    config: ServiceConfig,
    store: Arc<dyn OrderStore>,
    key: Option<SigningKey>,
) -> TestServer {
    let state = AppState::new(config, store, Arc::new(StaticKeyProvider::new(key)));
    let router: Router = create_router(state);

    TestServer::new(router).expect("Failed to create test server")
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
