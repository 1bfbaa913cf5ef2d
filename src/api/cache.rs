//! In-process response cache with a maximum entry age.
//!
//! Entries older than the caller's `max_age` are treated as misses so the
//! next lookup goes back to the network. Bounded by an LRU so a long session
//! browsing thousands of articles does not grow without limit.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;

/// Thread-safe LRU with per-entry insertion timestamps.
///
/// Uses `tokio::time::Instant` so tests running on a paused clock can age
/// entries with `tokio::time::advance`.
pub struct RevalidatingCache<K: Hash + Eq, V: Clone> {
    entries: Mutex<LruCache<K, (V, Instant)>>,
}

impl<K: Hash + Eq, V: Clone> RevalidatingCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns a clone of the cached value if it is younger than `max_age`.
    ///
    /// Stale entries are evicted on lookup.
    pub fn get(&self, key: &K, max_age: Duration) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let fresh = match entries.get(key) {
            Some((value, stored_at)) if stored_at.elapsed() < max_age => Some(value.clone()),
            Some(_) => None,
            None => return None,
        };
        if fresh.is_none() {
            entries.pop(key);
        }
        fresh
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(key, (value, Instant::now()));
    }

    /// Drops every entry. Used by explicit refresh.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
