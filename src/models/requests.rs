//! Request DTOs for the cache HTTP facade
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Longest logical key accepted over HTTP
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the PUT operation (PUT /set)
///
/// The TTL is fixed by the cache layer and cannot be chosen per call.
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The logical cache key
    pub key: String,
    /// The value to store
    pub value: String,
}

impl PutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for the bulk read (POST /get)
#[derive(Debug, Clone, Deserialize)]
pub struct GetMultipleRequest {
    /// Logical keys, answered in the same order
    pub keys: Vec<String>,
}

impl GetMultipleRequest {
    pub fn validate(&self) -> Option<String> {
        self.keys.iter().find_map(|key| validate_key(key))
    }
}

fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}
