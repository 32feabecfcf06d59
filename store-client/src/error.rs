//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the remote store
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client misconfiguration (bad base URL, missing setting)
    #[error("configuration error: {0}")]
    Config(String),

    /// Injected or simulated unavailability (in-memory stores)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
