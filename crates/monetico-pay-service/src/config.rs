//! Service configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration problems that stop the service at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A backend was requested without the settings it needs.
    #[error("ORDER_STORE={backend} requires {missing}")]
    MissingStoreSettings {
        /// Requested backend.
        backend: &'static str,
        /// Variables that must be set.
        missing: &'static str,
    },

    /// `ORDER_STORE` names no known backend.
    #[error("unknown ORDER_STORE {0:?} (expected memory, postgres or supabase)")]
    UnknownStore(String),

    /// No backend requested and no credentials to detect one from.
    #[error("no order store configured: set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY, DATABASE_URL, or ORDER_STORE=memory")]
    NoStore,
}

/// Default terminal identifier.
pub const DEFAULT_TPE: &str = "7675540";

/// Default merchant code.
pub const DEFAULT_MERCHANT_CODE: &str = "boucheries";

/// Default protocol version.
pub const DEFAULT_PROTOCOL_VERSION: &str = "3.0";

/// Default currency.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Default language code shown on the payment page.
pub const DEFAULT_LANGUAGE: &str = "FR";

/// Default gateway form target (sandbox).
pub const DEFAULT_ACTION_URL: &str = "https://p.monetico-services.com/test/paiement.cgi";

/// Default storefront origin.
pub const DEFAULT_STOREFRONT_ORIGIN: &str = "https://boucherie-sidi-boucif.fr";

/// Default Supabase RPC function for status updates.
pub const DEFAULT_SUPABASE_RPC: &str = "mark_order_payment";

/// Gateway protocol constants.
///
/// Fixed per merchant contract, but configurable so the same build can
/// target the sandbox and production gateways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Terminal identifier (`TPE`).
    pub tpe: String,
    /// Merchant code (`societe`).
    pub merchant_code: String,
    /// Protocol version (`version`).
    pub version: String,
    /// Currency suffix of `montant`.
    pub currency: String,
    /// Language code (`lgue`).
    pub language: String,
    /// URL the redirect form posts to.
    pub action_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            tpe: DEFAULT_TPE.into(),
            merchant_code: DEFAULT_MERCHANT_CODE.into(),
            version: DEFAULT_PROTOCOL_VERSION.into(),
            currency: DEFAULT_CURRENCY.into(),
            language: DEFAULT_LANGUAGE.into(),
            action_url: DEFAULT_ACTION_URL.into(),
        }
    }
}

/// Which order store backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStoreConfig {
    /// In-process store (development only, state is lost on restart).
    Memory,
    /// Direct PostgreSQL connection.
    Postgres {
        /// Connection URL.
        database_url: String,
    },
    /// Supabase REST API.
    Supabase {
        /// Project URL.
        url: String,
        /// Service role key.
        service_role_key: String,
        /// Status update RPC function.
        rpc_function: String,
    },
}

/// Service configuration loaded from environment variables.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Gateway protocol constants.
    pub gateway: GatewayConfig,

    /// Merchant signing secret (optional; initiation fails without it).
    pub secret_key: Option<String>,

    /// Refuse to start with a malformed or unsupported secret (default: true).
    pub strict_key: bool,

    /// Storefront origin used when a request does not carry one.
    pub storefront_origin: String,

    /// Order store backend.
    pub order_store: OrderStoreConfig,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("listen_addr", &self.listen_addr)
            .field("gateway", &self.gateway)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("strict_key", &self.strict_key)
            .field("storefront_origin", &self.storefront_origin)
            .field("order_store", &self.order_store.backend_name())
            .field("cors_origins", &self.cors_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl OrderStoreConfig {
    /// Short backend name for logs.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
            Self::Supabase { .. } => "supabase",
        }
    }
}

/// Monetico secrets file structure.
#[derive(Debug, Deserialize)]
struct MoneticoSecrets {
    secret_key: String,
    #[serde(default)]
    tpe: Option<String>,
    #[serde(default)]
    societe: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the order store cannot be determined.
    /// Falling back to the in-memory store would acknowledge every
    /// notification without recording it, so it must be asked for.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = GatewayConfig::default();
        let (secret_key, tpe, merchant_code) = load_monetico_secrets();

        let gateway = GatewayConfig {
            tpe: tpe.unwrap_or(defaults.tpe),
            merchant_code: merchant_code.unwrap_or(defaults.merchant_code),
            version: env_or("MONETICO_VERSION", defaults.version),
            currency: env_or("MONETICO_CURRENCY", defaults.currency),
            language: env_or("MONETICO_LANGUAGE", defaults.language),
            action_url: env_or("MONETICO_ACTION_URL", defaults.action_url),
        };

        Ok(Self {
            listen_addr: env_or("LISTEN_ADDR", "0.0.0.0:8080".into()),
            gateway,
            secret_key,
            strict_key: std::env::var("MONETICO_STRICT_KEY")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
            storefront_origin: env_or("STOREFRONT_ORIGIN", DEFAULT_STOREFRONT_ORIGIN.into()),
            order_store: order_store_from(|name| std::env::var(name).ok())?,
            cors_origins: env_or("CORS_ORIGINS", "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024), // 64KB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            gateway: GatewayConfig::default(),
            secret_key: None,
            strict_key: true,
            storefront_origin: DEFAULT_STOREFRONT_ORIGIN.into(),
            order_store: OrderStoreConfig::Memory,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Pick the order store: explicit `ORDER_STORE`, else whichever credentials
/// are present. The memory store is only used when asked for by name.
fn order_store_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<OrderStoreConfig, ConfigError> {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let supabase = || {
        var("SUPABASE_URL")
            .zip(var("SUPABASE_SERVICE_ROLE_KEY"))
            .map(|(url, service_role_key)| OrderStoreConfig::Supabase {
                url,
                service_role_key,
                rpc_function: var("SUPABASE_ORDER_RPC").unwrap_or_else(|| DEFAULT_SUPABASE_RPC.into()),
            })
    };
    let postgres = || var("DATABASE_URL").map(|database_url| OrderStoreConfig::Postgres { database_url });

    let requested = var("ORDER_STORE").map(|s| s.trim().to_ascii_lowercase());

    match requested.as_deref() {
        Some("memory") => {
            tracing::warn!("ORDER_STORE=memory - order updates are not persisted");
            Ok(OrderStoreConfig::Memory)
        }
        Some("supabase") => supabase().ok_or(ConfigError::MissingStoreSettings {
            backend: "supabase",
            missing: "SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY",
        }),
        Some("postgres") => postgres().ok_or(ConfigError::MissingStoreSettings {
            backend: "postgres",
            missing: "DATABASE_URL",
        }),
        Some(other) => Err(ConfigError::UnknownStore(other.to_string())),
        None => supabase().or_else(postgres).ok_or(ConfigError::NoStore),
    }
}

/// Load Monetico secrets from file or environment.
///
/// Returns `(secret_key, tpe, merchant_code)`.
fn load_monetico_secrets() -> (Option<String>, Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/monetico.json",
        "monetico-pay/.secrets/monetico.json",
        "../.secrets/monetico.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<MoneticoSecrets>(path) {
            tracing::info!(path = %path, "Loaded Monetico secrets from file");
            return (
                Some(secrets.secret_key),
                secrets.tpe.or_else(|| std::env::var("MONETICO_TPE").ok()),
                secrets
                    .societe
                    .or_else(|| std::env::var("MONETICO_SOCIETE").ok()),
            );
        }
    }

    // Fall back to environment variables
    tracing::debug!("Monetico secrets file not found, using environment variables");
    (
        std::env::var("MONETICO_SECRET_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty()),
        std::env::var("MONETICO_TPE").ok(),
        std::env::var("MONETICO_SOCIETE").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_gateway_matches_merchant_contract() {
        let gateway = GatewayConfig::default();
        assert_eq!(gateway.tpe, "7675540");
        assert_eq!(gateway.merchant_code, "boucheries");
        assert_eq!(gateway.version, "3.0");
        assert_eq!(gateway.currency, "EUR");
        assert_eq!(gateway.language, "FR");
        assert!(gateway.action_url.ends_with("/paiement.cgi"));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ServiceConfig {
            secret_key: Some("0102030405060708090a0b0c0d0e0f1011121314".into()),
            ..ServiceConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("0102030405"));
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn requested_store_without_credentials_is_an_error() {
        assert_eq!(
            order_store_from(env(&[("ORDER_STORE", "postgres")])),
            Err(ConfigError::MissingStoreSettings {
                backend: "postgres",
                missing: "DATABASE_URL",
            })
        );
        assert!(matches!(
            order_store_from(env(&[
                ("ORDER_STORE", "supabase"),
                ("SUPABASE_URL", "https://xyz.supabase.co"),
            ])),
            Err(ConfigError::MissingStoreSettings { backend: "supabase", .. })
        ));
        assert_eq!(
            order_store_from(env(&[("ORDER_STORE", "sqlite")])),
            Err(ConfigError::UnknownStore("sqlite".into()))
        );
    }

    #[test]
    fn memory_store_must_be_requested() {
        assert_eq!(order_store_from(env(&[])), Err(ConfigError::NoStore));
        assert_eq!(
            order_store_from(env(&[("ORDER_STORE", " Memory ")])),
            Ok(OrderStoreConfig::Memory)
        );
    }

    #[test]
    fn store_is_detected_from_credentials() {
        assert_eq!(
            order_store_from(env(&[("DATABASE_URL", "postgres://localhost/shop")])),
            Ok(OrderStoreConfig::Postgres {
                database_url: "postgres://localhost/shop".into()
            })
        );
        assert_eq!(
            order_store_from(env(&[
                ("DATABASE_URL", "postgres://localhost/shop"),
                ("SUPABASE_URL", "https://xyz.supabase.co"),
                ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ])),
            Ok(OrderStoreConfig::Supabase {
                url: "https://xyz.supabase.co".into(),
                service_role_key: "service-key".into(),
                rpc_function: DEFAULT_SUPABASE_RPC.into(),
            })
        );
    }

    #[test]
    fn missing_secrets_file_is_not_found() {
        let err = load_secrets_file::<MoneticoSecrets>("/nonexistent/monetico.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
