//! Category Caches
//!
//! Derived category data (navigation menus, effective discounts) is cached per tree revision.
//! An entry is served only while it is younger than the TTL *and* was computed against the
//! current revision, so any write to the tree invalidates everything derived from it.

use std::{collections::hash_map::Entry, hash::Hash};

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;

use crate::categories::{CategoryTree, NavigationNode};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Timestamp,
    revision: u64,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: SignedDuration, now: Timestamp, revision: u64) -> bool {
        self.revision == revision && now.duration_since(self.stored_at) < ttl
    }
}

/// Key/value cache with a time-to-live and revision-based invalidation.
///
/// Storing a value for a new revision evicts everything computed against older ones.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: SignedDuration,
    revision: Option<u64>,
    entries: FxHashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    /// Create an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: SignedDuration) -> Self {
        Self {
            ttl,
            revision: None,
            entries: FxHashMap::default(),
        }
    }

    fn prune_stale(&mut self, revision: u64) {
        if self.revision != Some(revision) {
            self.entries.retain(|_, entry| entry.revision == revision);
            self.revision = Some(revision);
        }
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K, now: Timestamp, revision: u64) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl, now, revision))
            .map(|entry| &entry.value)
    }

    /// Store a value computed against `revision`.
    pub fn insert(&mut self, key: K, value: V, now: Timestamp, revision: u64) {
        self.prune_stale(revision);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                revision,
            },
        );
    }

    /// Fresh value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with(
        &mut self,
        key: K,
        now: Timestamp,
        revision: u64,
        compute: impl FnOnce() -> V,
    ) -> &V {
        let ttl = self.ttl;

        self.prune_stale(revision);

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_fresh(ttl, now, revision) {
                    occupied.insert(CacheEntry {
                        value: compute(),
                        stored_at: now,
                        revision,
                    });
                }

                &occupied.into_mut().value
            }
            Entry::Vacant(vacant) => {
                &vacant
                    .insert(CacheEntry {
                        value: compute(),
                        stored_at: now,
                        revision,
                    })
                    .value
            }
        }
    }

    /// Drop a single entry.
    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Navigation menu cache, owned by whoever serves the menu.
#[derive(Debug, Clone)]
pub struct NavigationCache {
    cache: TtlCache<(), Vec<NavigationNode>>,
}

impl NavigationCache {
    /// Create an empty cache whose menu lives for `ttl`.
    #[must_use]
    pub fn new(ttl: SignedDuration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    /// The navigation menu for `tree`, rebuilt when stale.
    pub fn navigation(&mut self, tree: &CategoryTree, now: Timestamp) -> &[NavigationNode] {
        self.cache
            .get_or_insert_with((), now, tree.revision(), || tree.navigation())
    }

    /// Forget the cached menu.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}
