//! Namespaced Cache Module
//!
//! Read, write and pattern-delete operations over one namespace of a shared
//! store. Bulk operations fan out per key through a bounded worker pool.

use std::collections::HashMap;
use std::str::FromStr;

use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, Namespace, StatsSnapshot, DEFAULT_CONCURRENCY, DEFAULT_TTL};
use crate::error::{CacheError, Result};
use crate::store::SharedStore;

// == Delete Key Mode ==
/// Which key form `delete_by_pattern` reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteKeyMode {
    /// Prefixed store keys, e.g. `T_a`
    #[default]
    Physical,
    /// Keys with the namespace stripped, e.g. `a`
    Logical,
}

impl FromStr for DeleteKeyMode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "physical" => Ok(DeleteKeyMode::Physical),
            "logical" => Ok(DeleteKeyMode::Logical),
            other => Err(CacheError::Config(format!("unknown delete key mode: {}", other))),
        }
    }
}

// == Namespaced Cache ==
/// Cache access layer bound to one namespace of a shared store.
///
/// Instances with different namespaces can share one store without ever
/// observing each other's keys.
pub struct NamespacedCache {
    namespace: Namespace,
    store: SharedStore,
    concurrency: usize,
    delete_key_mode: DeleteKeyMode,
    stats: CacheStats,
}

impl std::fmt::Debug for NamespacedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedCache")
            .field("namespace", &self.namespace.prefix())
            .field("concurrency", &self.concurrency)
            .field("delete_key_mode", &self.delete_key_mode)
            .finish()
    }
}

impl NamespacedCache {
    // == Constructor ==
    /// Creates a cache over `store` scoped to `namespace`.
    pub fn new(namespace: impl Into<String>, store: SharedStore) -> Result<Self> {
        let namespace = Namespace::new(namespace)?;
        info!(namespace = namespace.prefix(), "Instantiating namespaced cache");
        Ok(Self {
            namespace,
            store,
            concurrency: DEFAULT_CONCURRENCY,
            delete_key_mode: DeleteKeyMode::default(),
            stats: CacheStats::new(),
        })
    }

    /// Sets how many per-key store calls a bulk operation keeps in flight.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_delete_key_mode(mut self, mode: DeleteKeyMode) -> Self {
        self.delete_key_mode = mode;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == Read Path ==
    /// Fetches the value of a logical key, `None` when absent.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let physical = self.namespace.to_physical(key);
        info!(key = %physical, "Cache get");
        self.fetch(&physical).await
    }

    /// Fetches several logical keys at once.
    ///
    /// The result has one slot per input key in input order; a missing key
    /// leaves `None` in its slot. Keys are resolved independently, so the
    /// batch is not a consistent snapshot.
    pub async fn get_multiple<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<Option<String>>> {
        info!(
            namespace = self.namespace.prefix(),
            count = keys.len(),
            "Cache get multiple"
        );

        let physical: Vec<String> = keys
            .iter()
            .map(|key| self.namespace.to_physical(key.as_ref()))
            .collect();

        stream::iter(physical)
            .map(|key| async move { self.fetch(&key).await })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    /// Fetches every value currently in the namespace.
    ///
    /// Keys that vanish between the scan and their fetch are skipped, so the
    /// result only holds present values.
    pub async fn get_all(&self) -> Result<Vec<String>> {
        let pattern = self.namespace.all_keys_pattern();
        info!(pattern = %pattern, "Cache get all");

        self.scan_checked(&pattern)
            .map_ok(|physical| async move { self.fetch(&physical).await })
            .try_buffered(self.concurrency)
            .try_filter_map(|value| future::ready(Ok(value)))
            .try_collect()
            .await
    }

    // == Write Path ==
    /// Stores a value under a logical key with the fixed TTL. Last writer wins.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        let physical = self.namespace.to_physical(key);
        info!(key = %physical, "Cache put");

        self.store.set_with_ttl(&physical, value, DEFAULT_TTL).await?;
        self.stats.record_write();
        Ok(())
    }

    // == Delete Path ==
    /// Deletes a logical key. True only if it existed and was removed.
    pub async fn delete_one(&self, key: &str) -> Result<bool> {
        let physical = self.namespace.to_physical(key);
        info!(key = %physical, "Cache delete");

        let removed = self.store.delete(&physical).await?;
        self.stats.record_delete(removed);
        Ok(removed)
    }

    /// Deletes every key of the namespace starting with `fragment`.
    ///
    /// `fragment` is a prefix; the trailing wildcard is appended here. Each
    /// matched key is deleted on its own and the returned map records its
    /// outcome. A failed delete is recorded as `false` and never undoes the
    /// others. Only a failing scan fails the call.
    pub async fn delete_by_pattern(&self, fragment: &str) -> Result<HashMap<String, bool>> {
        let pattern = self.namespace.scan_pattern(fragment);
        info!(pattern = %pattern, "Cache delete by pattern");

        let results: HashMap<String, bool> = self
            .scan_checked(&pattern)
            .map_ok(|physical| async move {
                let removed = match self.store.delete(&physical).await {
                    Ok(removed) => removed,
                    Err(err) => {
                        warn!(key = %physical, error = %err, "Delete failed; recording as not deleted");
                        false
                    }
                };
                self.stats.record_delete(removed);
                Ok::<_, CacheError>((self.report_key(physical), removed))
            })
            .try_buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        debug!(
            pattern = %pattern,
            matched = results.len(),
            deleted = results.values().filter(|removed| **removed).count(),
            "Delete by pattern finished"
        );
        Ok(results)
    }

    // == Helpers ==
    async fn fetch(&self, physical: &str) -> Result<Option<String>> {
        let value = self.store.get(physical).await?;
        self.stats.record_read(value.is_some());
        Ok(value)
    }

    /// Scans `pattern`, failing fast on any key outside the namespace.
    fn scan_checked<'a>(
        &'a self,
        pattern: &str,
    ) -> impl futures::Stream<Item = Result<String>> + Send + 'a {
        self.store.scan_by_pattern(pattern).map(move |scanned| {
            let physical = scanned?;
            self.namespace.to_logical(&physical)?;
            Ok(physical)
        })
    }

    fn report_key(&self, physical: String) -> String {
        match self.delete_key_mode {
            DeleteKeyMode::Physical => physical,
            DeleteKeyMode::Logical => match self.namespace.to_logical(&physical) {
                Ok(logical) => logical.to_string(),
                Err(_) => physical,
            },
        }
    }
}
