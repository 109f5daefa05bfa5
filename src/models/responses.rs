//! Response DTOs for the cache HTTP facade
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for a single read (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// Logical key as the caller sent it
    pub key: String,
    pub value: String,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for bulk reads (POST /get, GET /all)
///
/// Bulk reads keep `null` for missing keys; GET /all never contains `null`.
#[derive(Debug, Clone, Serialize)]
pub struct ValuesResponse<T> {
    pub values: Vec<T>,
}

impl<T> ValuesResponse<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }
}

/// Response body for the PUT operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    pub message: String,
    /// Logical key that was written
    pub key: String,
}

impl PutResponse {
    /// Creates a new PutResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored for 24h", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was targeted
    pub key: String,
    /// Whether a key existed and was removed
    pub deleted: bool,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            key: key.into(),
            deleted,
        }
    }
}

/// Response body for pattern deletion (DELETE /pattern/:fragment)
#[derive(Debug, Clone, Serialize)]
pub struct PatternDeleteResponse {
    /// The fragment the caller supplied
    pub pattern: String,
    /// Outcome per matched key
    pub results: HashMap<String, bool>,
}

impl PatternDeleteResponse {
    pub fn new(pattern: impl Into<String>, results: HashMap<String, bool>) -> Self {
        Self {
            pattern: pattern.into(),
            results,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Namespace the counters belong to
    pub namespace: String,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a counter snapshot
    pub fn new(namespace: impl Into<String>, stats: StatsSnapshot) -> Self {
        Self {
            namespace: namespace.into(),
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            deletes: stats.deletes,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 time the health check was answered
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "test_value");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("test_value"));
    }

    #[test]
    fn test_values_response_keeps_nulls() {
        let resp = ValuesResponse::new(vec![Some("1".to_string()), None]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, serde_json::json!({"values": ["1", null]}));
    }

    #[test]
    fn test_put_response_serialize() {
        let resp = PutResponse::new("my_key");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["key"], "my_key");
        assert_eq!(json["message"], "Key 'my_key' stored for 24h");
    }

    #[test]
    fn test_pattern_delete_response_serialize() {
        let results = HashMap::from([("T_a".to_string(), true)]);
        let json = serde_json::to_value(PatternDeleteResponse::new("a", results)).unwrap();
        assert_eq!(json["pattern"], "a");
        assert_eq!(json["results"]["T_a"], true);
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = StatsSnapshot {
            hits: 80,
            misses: 20,
            writes: 5,
            deletes: 1,
        };
        let resp = StatsResponse::new("T_", stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.namespace, "T_");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
