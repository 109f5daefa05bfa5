//! Stored Entry Module
//!
//! A value held by the in-memory store together with its expiry deadline.

use std::time::Duration;

use chrono::Utc;

// == Stored Entry ==
/// A single value with an absolute expiry deadline.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The stored value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl StoredEntry {
    /// Creates an entry that expires `ttl` from now.
    pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            value: value.into(),
            expires_at: current_timestamp_ms().saturating_add(ttl_ms),
        }
    }

    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against a supplied clock reading.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    /// Returns remaining TTL, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        let remaining = self.expires_at - current_timestamp_ms();
        Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
    }
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
