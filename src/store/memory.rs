//! In-Memory Store Module
//!
//! Process-local implementation of the store capability with TTL expiry and
//! glob scans. Backs the `LOCAL` environment and the test suite.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;

use super::entry::{current_timestamp_ms, StoredEntry};
use super::pattern::glob_matches;
use super::{KeyStream, KeyValueStore};
use crate::error::Result;

// == Memory Store ==
/// Key-value storage shared by every cache instance pointed at it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all expired entries, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    /// Returns the number of stored entries, including not yet purged ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remaining TTL of a live key.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(StoredEntry::ttl_remaining)
    }

    async fn matching_keys(&self, pattern: &str) -> Vec<String> {
        let now = current_timestamp_ms();
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && glob_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it lazily, unless it was rewritten meanwhile
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(StoredEntry::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = StoredEntry::new(value, ttl);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|entry| !entry.is_expired()))
    }

    fn scan_by_pattern(&self, pattern: &str) -> KeyStream<'_> {
        let pattern = pattern.to_string();
        stream::once(async move { self.matching_keys(&pattern).await })
            .flat_map(|keys| stream::iter(keys.into_iter().map(Ok)))
            .boxed()
    }
}
