//! Store Capability Module
//!
//! The narrow interface the cache layer needs from a backing key-value store,
//! plus the bindings that implement it.

mod entry;
mod memory;
mod pattern;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

pub use entry::StoredEntry;
pub use memory::MemoryStore;
pub use pattern::{escape_glob, glob_matches};
pub use redis::{parse_node_address, RedisOptions, RedisStore, ValueCodec};

/// Lazy, one-shot sequence of physical keys produced by a pattern scan.
///
/// Scanning again re-issues the query against the store.
pub type KeyStream<'a> = BoxStream<'a, Result<String>>;

/// Store handle shared by every operation of a cache instance.
pub type SharedStore = Arc<dyn KeyValueStore>;

// == Key Value Store ==
/// Capability interface over a distributed key-value store.
///
/// Implementations never retry: a connection fault is returned to the caller
/// as-is.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Fetches the value under a physical key, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value that expires after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Removes a key. Returns true only if a key existed and was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Enumerates physical keys matching a Redis-style glob pattern.
    fn scan_by_pattern(&self, pattern: &str) -> KeyStream<'_>;

    /// Releases connections held by the binding.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
