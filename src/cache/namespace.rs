//! Namespace Module
//!
//! Maps logical keys into one instance's slice of the shared keyspace.

use crate::error::{CacheError, Result};
use crate::store::escape_glob;

/// Wildcard appended to every scan pattern.
pub const WILDCARD: &str = "*";

// == Namespace ==
/// Immutable key prefix owned by one cache instance.
///
/// Every physical key the instance touches is `prefix + logical_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
    /// Prefix with glob metacharacters escaped, for scan patterns
    pattern_prefix: String,
}

impl Namespace {
    /// Creates a namespace. The prefix must not be empty.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(CacheError::Config("namespace prefix cannot be empty".into()));
        }
        let pattern_prefix = escape_glob(&prefix);
        Ok(Self {
            prefix,
            pattern_prefix,
        })
    }

    /// The raw prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Logical key to physical key.
    pub fn to_physical(&self, logical_key: &str) -> String {
        format!("{}{}", self.prefix, logical_key)
    }

    /// Physical key back to logical key.
    ///
    /// Fails with [`CacheError::MalformedKey`] when the key lies outside this
    /// namespace; a correctly scoped scan never produces one.
    pub fn to_logical<'a>(&self, physical_key: &'a str) -> Result<&'a str> {
        physical_key
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| CacheError::MalformedKey {
                key: physical_key.to_string(),
                namespace: self.prefix.clone(),
            })
    }

    /// Scan pattern for keys starting with `fragment` inside this namespace.
    ///
    /// The fragment is passed through as a glob; only the prefix is escaped.
    pub fn scan_pattern(&self, fragment: &str) -> String {
        format!("{}{}{}", self.pattern_prefix, fragment, WILDCARD)
    }

    /// Scan pattern covering the whole namespace.
    pub fn all_keys_pattern(&self) -> String {
        self.scan_pattern("")
    }
}
