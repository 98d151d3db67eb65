//! In-memory response cache keyed by query parameters.
//!
//! Entries go stale after a fixed age (one hour by default) and are then
//! refetched on next use.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub const DEFAULT_STALE_MINUTES: u64 = 60;
pub const PURGE_THRESHOLD: usize = 64;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct QueryCache<K, V> {
    stale_after: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_STALE_MINUTES * 60))
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// The cached value, if present and still fresh.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.stale_after)
            .map(|entry| entry.value.clone())
    }

    /// Store `value`. Once the map reaches [`PURGE_THRESHOLD`] entries,
    /// stale ones are dropped first.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock();
        if entries.len() >= PURGE_THRESHOLD {
            let before = entries.len();
            entries.retain(|_, entry| entry.stored_at.elapsed() < self.stale_after);
            tracing::debug!("Purged {} stale cache entries", before - entries.len());
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    /// Drop every stale entry; returns how many were removed.
    pub fn purge_stale(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.stale_after);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
