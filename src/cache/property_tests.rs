//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the read, write and delete contracts of
//! `NamespacedCache` against a plain model of the shared store.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::cache::NamespacedCache;
use crate::store::MemoryStore;

// == Strategies ==
/// Generates logical keys (glob-free so they can double as literal prefixes)
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_:]{1,12}".prop_map(|s| s)
}

/// Generates values, including the empty string
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}".prop_map(|s| s)
}

fn entries_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..30)
}

fn cache(namespace: &str, store: &Arc<MemoryStore>) -> NamespacedCache {
    NamespacedCache::new(namespace, store.clone()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Round trip: put(k, v) followed by get(k) returns v.
    #[test]
    fn prop_put_then_get(key in key_strategy(), value in value_strategy()) {
        let store = Arc::new(MemoryStore::new());
        let cache = cache("P_", &store);

        let fetched = tokio_test::block_on(async {
            cache.put(&key, &value).await.unwrap();
            cache.get(&key).await.unwrap()
        });
        prop_assert_eq!(fetched, Some(value));
    }

    // Writes through one namespace are never visible through another.
    #[test]
    fn prop_namespace_isolation(entries in entries_strategy(), lookup in key_strategy()) {
        let store = Arc::new(MemoryStore::new());
        let a = cache("A_", &store);
        let b = cache("B_", &store);

        tokio_test::block_on(async {
            for (key, value) in &entries {
                a.put(key, value).await.unwrap();
            }

            prop_assert_eq!(b.get(&lookup).await.unwrap(), None);
            prop_assert!(b.get_all().await.unwrap().is_empty());
            prop_assert!(b.delete_by_pattern("").await.unwrap().is_empty());
            prop_assert_eq!(a.get_all().await.unwrap().len(), entries.len());
            Ok::<(), TestCaseError>(())
        })?;
    }

    // get_multiple has one slot per key, absent exactly where get is absent.
    #[test]
    fn prop_get_multiple_matches_get(
        entries in entries_strategy(),
        lookups in prop::collection::vec(key_strategy(), 0..20)
    ) {
        let store = Arc::new(MemoryStore::new());
        let cache = cache("M_", &store).with_concurrency(4);

        tokio_test::block_on(async {
            for (key, value) in &entries {
                cache.put(key, value).await.unwrap();
            }

            let values = cache.get_multiple(&lookups).await.unwrap();
            prop_assert_eq!(values.len(), lookups.len());
            for (lookup, value) in lookups.iter().zip(&values) {
                prop_assert_eq!(value, &cache.get(lookup).await.unwrap());
                prop_assert_eq!(value.as_ref(), entries.get(lookup));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    // get_all returns exactly the stored values.
    #[test]
    fn prop_get_all_returns_present_values(entries in entries_strategy()) {
        let store = Arc::new(MemoryStore::new());
        let cache = cache("G_", &store);

        let mut values = tokio_test::block_on(async {
            for (key, value) in &entries {
                cache.put(key, value).await.unwrap();
            }
            cache.get_all().await.unwrap()
        });

        let mut expected: Vec<String> = entries.values().cloned().collect();
        values.sort();
        expected.sort();
        prop_assert_eq!(values, expected);
    }

    // delete_by_pattern reports exactly the keys sharing the prefix, all deleted,
    // and leaves every other key in place.
    #[test]
    fn prop_delete_by_pattern_matches_prefix(
        entries in entries_strategy(),
        fragment in "[a-z0-9_:]{0,2}"
    ) {
        let store = Arc::new(MemoryStore::new());
        let cache = cache("D_", &store);

        let (deleted, survivors) = tokio_test::block_on(async {
            for (key, value) in &entries {
                cache.put(key, value).await.unwrap();
            }
            let deleted = cache.delete_by_pattern(&fragment).await.unwrap();
            let mut survivors = cache.get_all().await.unwrap();
            survivors.sort();
            (deleted, survivors)
        });

        let expected: HashMap<String, bool> = entries
            .keys()
            .filter(|key| key.starts_with(fragment.as_str()))
            .map(|key| (format!("D_{}", key), true))
            .collect();
        prop_assert_eq!(deleted, expected);

        let mut expected_survivors: Vec<String> = entries
            .iter()
            .filter(|(key, _)| !key.starts_with(fragment.as_str()))
            .map(|(_, value)| value.clone())
            .collect();
        expected_survivors.sort();
        prop_assert_eq!(survivors, expected_survivors);
    }

    // delete_one is true exactly for live keys, after which they read as absent.
    #[test]
    fn prop_delete_one(
        stored in prop::collection::btree_set(key_strategy(), 0..10),
        lookup in key_strategy()
    ) {
        let store = Arc::new(MemoryStore::new());
        let cache = cache("X_", &store);

        tokio_test::block_on(async {
            for key in &stored {
                cache.put(key, "v").await.unwrap();
            }

            let removed = cache.delete_one(&lookup).await.unwrap();
            prop_assert_eq!(removed, stored.contains(&lookup));
            prop_assert_eq!(cache.get(&lookup).await.unwrap(), None);
            prop_assert!(!cache.delete_one(&lookup).await.unwrap());

            let remaining: BTreeSet<&String> = stored.iter().filter(|key| **key != lookup).collect();
            prop_assert_eq!(cache.get_all().await.unwrap().len(), remaining.len());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
