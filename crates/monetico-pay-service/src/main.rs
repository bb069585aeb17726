//! Monetico Pay Service - payment signing and notification verification
//!
//! This is the main entry point for the monetico-pay service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monetico_pay_service::{
    create_router, AppState, OrderStoreConfig, ServiceConfig, StaticKeyProvider,
};
use monetico_pay_store::{MemoryOrderStore, OrderStore, PgOrderStore, SupabaseOrderStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,monetico_pay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Monetico Pay Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        tpe = %config.gateway.tpe,
        action_url = %config.gateway.action_url,
        secret_configured = %config.secret_key.is_some(),
        strict_key = %config.strict_key,
        order_store = config.order_store.backend_name(),
        "Service configuration loaded"
    );

    // Normalize the signing key (fails here on a bad secret in strict mode)
    let keys = Arc::new(StaticKeyProvider::from_config(&config)?);

    let store = open_order_store(&config.order_store).await?;

    // Build app state
    let state = AppState::new(config.clone(), store, keys);

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_order_store(
    config: &OrderStoreConfig,
) -> Result<Arc<dyn OrderStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn OrderStore> = match config {
        OrderStoreConfig::Memory => {
            tracing::warn!("Using in-memory order store - updates are lost on restart");
            Arc::new(MemoryOrderStore::new())
        }
        OrderStoreConfig::Postgres { database_url } => {
            tracing::info!("Connecting to PostgreSQL order store");
            Arc::new(PgOrderStore::connect(database_url).await?)
        }
        OrderStoreConfig::Supabase {
            url,
            service_role_key,
            rpc_function,
        } => {
            tracing::info!(supabase_url = %url, rpc = %rpc_function, "Using Supabase order store");
            Arc::new(SupabaseOrderStore::new(
                url.clone(),
                service_role_key.clone(),
                rpc_function.clone(),
            )?)
        }
    };
    Ok(store)
}
