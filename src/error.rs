//! Error types for the API client and cache layers
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Api Error Enum ==
/// Errors surfaced by the API client and the resilient fetcher.
///
/// Cloneable so that a single deduplicated request can hand the same
/// failure to every caller awaiting it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connectivity failure, retried before being surfaced
    #[error("Network error: {0}")]
    Network(String),

    /// Completed exchange with a non-success status
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Request could not be built (bad URL, unserializable body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response body was not the expected JSON
    #[error("Decode error: {0}")]
    Decode(String),

    /// A shared in-flight request ended without publishing a result
    #[error("Request interrupted: {0}")]
    Interrupted(String),
}

impl ApiError {
    // == Retry Classification ==
    /// Returns true for transient failures: connectivity, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status of the failure, if the exchange completed.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// == Transport Error Enum ==
/// Failures reported by a [`Transport`](crate::fetch::Transport) before any
/// HTTP status is available.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never reached the server or the connection dropped
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request itself is malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect(msg) => ApiError::Network(msg),
            TransportError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
        }
    }
}

// == Storage Error Enum ==
/// Durable store failures. Never escapes the cache layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying I/O failed
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Network("offline".to_string()).is_retryable());
        for status in [429, 500, 502, 503] {
            let err = ApiError::Http {
                status,
                message: String::new(),
            };
            assert!(err.is_retryable(), "status {} should retry", status);
        }
        for status in [400, 401, 403, 404, 422] {
            let err = ApiError::Http {
                status,
                message: String::new(),
            };
            assert!(!err.is_retryable(), "status {} should not retry", status);
        }
        assert!(!ApiError::InvalidRequest("bad url".to_string()).is_retryable());
        assert!(!ApiError::Decode("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_transport_error_conversion() {
        let err: ApiError = TransportError::Connect("refused".to_string()).into();
        assert_eq!(err, ApiError::Network("refused".to_string()));

        let err: ApiError = TransportError::InvalidRequest("no scheme".to_string()).into();
        assert_eq!(err, ApiError::InvalidRequest("no scheme".to_string()));
    }

    #[test]
    fn test_http_error_displays_message() {
        let err = ApiError::Http {
            status: 404,
            message: "Class not found".to_string(),
        };
        assert_eq!(err.to_string(), "Class not found");
        assert_eq!(err.status(), Some(404));
    }
}
