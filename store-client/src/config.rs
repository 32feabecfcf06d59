//! Store endpoint configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | PRODUCT_STORE_URL | http://localhost:3001 | Product collection base URL |
//! | ORDER_STORE_URL | (unset) | Order collection base URL; unset = offline mode |
//! | USER_STORE_URL | http://localhost:3001 | User collection base URL |
//! | REQUEST_TIMEOUT_MS | 10000 | Per-request timeout |

/// Remote store endpoints. The order store is optional: when it is
/// not configured, created orders go to the offline queue instead.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub product_store_url: String,
    pub order_store_url: Option<String>,
    pub user_store_url: String,
    pub request_timeout_ms: u64,
}

impl StoreConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            product_store_url: std::env::var("PRODUCT_STORE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".into()),
            order_store_url: std::env::var("ORDER_STORE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            user_store_url: std::env::var("USER_STORE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            product_store_url: "http://localhost:3001".into(),
            order_store_url: None,
            user_store_url: "http://localhost:3001".into(),
            request_timeout_ms: 10_000,
        }
    }
}
