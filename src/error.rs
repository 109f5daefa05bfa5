//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer and its store bindings.
///
/// Absent keys are never reported through this type; reads return `None`
/// and bulk deletes record `false` per key instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found (HTTP facade only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A physical key fell outside this instance's namespace
    #[error("Malformed key '{key}': expected namespace prefix '{namespace}'")]
    MalformedKey { key: String, namespace: String },

    /// The backing store could not be reached or the connection broke
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store call did not answer within the configured timeout
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// The store answered with an error or an unexpected reply
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Value encoding failed
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Transport faults become `StoreUnavailable`; everything the server or the
/// reply decoding rejected becomes `Protocol`.
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            CacheError::StoreUnavailable(err.to_string())
        } else {
            CacheError::Protocol(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Protocol(_) => StatusCode::BAD_GATEWAY,
            CacheError::MalformedKey { .. } | CacheError::Codec(_) | CacheError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
