//! Engine configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | STOCK_CONCURRENCY | 4 | Max in-flight stock updates per batch |
//! | STOCK_RETRY_ATTEMPTS | 3 | Tries per stock update |
//! | STOCK_RETRY_BASE_MS | 200 | Base backoff delay (doubles per retry) |
//! | WORK_DIR | ./data | Directory for the offline queue database |

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Max in-flight stock updates per reconciliation batch.
    pub concurrency_limit: usize,
    /// Total tries per stock update.
    pub retry_attempts: u32,
    /// Wait before retry `i` (1-based) is `base × 2^(i-1)`.
    pub retry_base_delay_ms: u64,
    /// Directory for edge-local state (offline order queue).
    pub work_dir: String,
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            concurrency_limit: std::env::var("STOCK_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            retry_attempts: std::env::var("STOCK_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            retry_base_delay_ms: std::env::var("STOCK_RETRY_BASE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
        }
    }

    /// Path of the offline queue database file.
    pub fn queue_db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("offline-orders.redb")
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            retry_attempts: 3,
            retry_base_delay_ms: 200,
            work_dir: "./data".into(),
        }
    }
}
