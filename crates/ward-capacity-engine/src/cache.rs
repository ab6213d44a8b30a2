//! History baseline caching.
//!
//! A key's baseline depends only on its history samples, which change at
//! snapshot frequency rather than per event. The cache keeps the computed
//! [`Baseline`] per key together with the store's history version, so hot
//! wards do not re-read and re-sort their whole history on every ingestion.
//! An entry is served only while the version still matches and the TTL has
//! not run out.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use ward_capacity::CapacityKey;

use crate::baseline::Baseline;
use crate::config::BaselineCacheConfig;

#[derive(Debug, Clone)]
struct CacheEntry {
    baseline: Baseline,
    version: u64,
    created_at: Instant,
}

impl CacheEntry {
    fn new(baseline: Baseline, version: u64) -> Self {
        Self {
            baseline,
            version,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Thread-safe LRU cache with TTL expiration for history baselines.
pub struct BaselineCache {
    inner: Mutex<LruCache<CapacityKey, CacheEntry>>,
    ttl: Duration,
}

impl BaselineCache {
    /// Creates a cache from its configuration.
    pub fn new(config: BaselineCacheConfig) -> Self {
        Self::with_capacity(config.max_entries, config.ttl)
    }

    /// Creates a cache with custom capacity and TTL.
    pub fn with_capacity(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Gets the cached baseline for `key`.
    ///
    /// Returns `None` if:
    /// - The key is not in the cache
    /// - The entry was computed from a different history version
    /// - The entry has expired (TTL exceeded)
    ///
    /// Stale entries are dropped on access.
    ///
    /// # Arguments
    ///
    /// * `key` - The ward whose baseline is wanted.
    /// * `version` - The store's current history version for `key`.
    pub fn get(&self, key: &CapacityKey, version: u64) -> Option<Baseline> {
        let mut cache = self.inner.lock();
        let stale = match cache.get(key) {
            Some(entry) if entry.version == version && !entry.is_expired(self.ttl) => {
                return Some(entry.baseline)
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            cache.pop(key);
        }
        None
    }

    /// Stores a baseline computed at history `version`, evicting the least
    /// recently used key if full.
    pub fn set(&self, key: CapacityKey, version: u64, baseline: Baseline) {
        self.inner.lock().put(key, CacheEntry::new(baseline, version));
    }

    /// Drops the entry for `key`.
    pub fn invalidate(&self, key: &CapacityKey) {
        self.inner.lock().pop(key);
    }

    /// Number of entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Removes expired entries.
    pub fn cleanup_expired(&self) {
        let mut cache = self.inner.lock();
        let ttl = self.ttl;
        let expired: Vec<CapacityKey> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            cache.pop(&key);
        }
    }
}

impl std::fmt::Debug for BaselineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaselineCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
