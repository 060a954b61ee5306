//! SDK-wide error types using thiserror
//!
//! Every fallible operation in the crate returns `ParadexResult<T>`, so
//! callers deal with a single error enum whether the failure came from
//! signing, HTTP, or the WebSocket transport.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParadexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Typed data error: {0}")]
    TypedData(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Operation not allowed for this account type (e.g. onboarding with a subkey)
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Account not initialized")]
    AccountNotInitialized,

    #[error("Rate limit exceeded")]
    RateLimited,

    /// Non-2xx response from the REST API
    #[error("API error ({status}): {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// JSON-RPC error returned over the WebSocket
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ParadexError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ParadexError::WebSocket(Box::new(err))
    }
}

/// Result type alias using ParadexError
pub type ParadexResult<T> = std::result::Result<T, ParadexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_error_converts() {
        let serde_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ParadexError = serde_err.into();
        assert!(err.to_string().contains("Serialization error"), "Got: {}", err);
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ParadexError = io_err.into();
        let msg = err.to_string();
        assert!(msg.contains("IO error"), "Got: {}", msg);
        assert!(msg.contains("file missing"), "Got: {}", msg);
    }

    #[test]
    fn test_api_error_display() {
        let err = ParadexError::Api {
            status: 400,
            code: "VALIDATION_ERROR".into(),
            message: "size too small".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error (400): VALIDATION_ERROR - size too small"
        );
    }

    #[test]
    fn test_network_timeout_display() {
        let err = ParadexError::NetworkTimeout(5000);
        assert_eq!(err.to_string(), "Network timeout after 5000ms");
    }

    #[test]
    fn test_unsupported_display() {
        let err = ParadexError::Unsupported("onboarding with subkey".into());
        assert_eq!(err.to_string(), "Unsupported operation: onboarding with subkey");
    }
}
