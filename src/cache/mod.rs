//! Cache Module
//!
//! Namespaced cache access layer over a shared key-value store.

mod layer;
mod namespace;
mod stats;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

// Re-export public types
pub use layer::{DeleteKeyMode, NamespacedCache};
pub use namespace::{Namespace, WILDCARD};
pub use stats::{CacheStats, StatsSnapshot};

// == Public Constants ==
/// Expiry applied to every write
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of per-key store calls a bulk operation keeps in flight
pub const DEFAULT_CONCURRENCY: usize = 16;
