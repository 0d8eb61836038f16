//! Error types for the gateway adapter.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to a messaging provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON-RPC error response from the provider.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Non-success HTTP status from the provider.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider could not be reached; nothing was sent.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// The provider did not answer in time.
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider does not know the requested object.
    #[error("{entity} not found at provider: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Http(e) => e.is_timeout() || e.is_connect(),
            GatewayError::Status { status, .. } => *status >= 500 || *status == 429,
            GatewayError::Unreachable(_) | GatewayError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Whether the request certainly never reached the provider.
    ///
    /// Only these failures are safe to retry for non-idempotent calls.
    pub fn is_unsent(&self) -> bool {
        match self {
            GatewayError::Http(e) => e.is_connect(),
            GatewayError::Unreachable(_) => true,
            _ => false,
        }
    }
}
