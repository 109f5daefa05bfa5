//! Namespaced Cache - A cache access layer over a shared key-value store
//!
//! Isolates logical keyspaces by prefix and provides single and bulk reads,
//! TTL-bound writes, and bulk deletion by wildcard pattern with per-key
//! outcomes.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{DeleteKeyMode, NamespacedCache};
pub use config::{Config, Environment, StoreBackend};
pub use error::{CacheError, Result};
pub use store::{KeyValueStore, MemoryStore, RedisStore, SharedStore};
pub use tasks::spawn_purge_task;
