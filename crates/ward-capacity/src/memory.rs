//! In-process [`EventStore`] backed by ordered sets.
//!
//! Each key owns a `BTreeSet<(timestamp, unique_value)>`, which gives the
//! same member/score semantics as a sorted-set service: a member is stored
//! once, and counting a timestamp range is a range scan.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::{CapacityKey, EventStore, StoreResult, Timestamp};

#[derive(Debug, Default)]
struct Series {
    events: BTreeSet<(Timestamp, String)>,
    history: Vec<(Timestamp, u64)>,
    history_version: u64,
}

/// Thread-safe in-memory event store.
///
/// Suitable for a single process and for tests. Appends take a write lock on
/// the whole map for the duration of one insert, which makes each append
/// atomic.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use ward_capacity::{CapacityKey, EventStore, InMemoryEventStore};
///
/// let store = InMemoryEventStore::new();
/// let key = CapacityKey::new("f1", "pharmacy");
/// store.append_history_sample(&key, Utc::now(), 42).unwrap();
/// assert_eq!(store.history_values(&key).unwrap(), vec![42]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    series: RwLock<HashMap<CapacityKey, Series>>,
    // Store-wide so versions never repeat, even across `clear`.
    last_version: AtomicU64,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with any stored data.
    pub fn key_count(&self) -> usize {
        self.series.read().len()
    }

    /// Total number of events currently held under `key`, ignoring time.
    pub fn event_len(&self, key: &CapacityKey) -> usize {
        self.series
            .read()
            .get(key)
            .map(|s| s.events.len())
            .unwrap_or(0)
    }

    /// Drops all data.
    pub fn clear(&self) {
        self.series.write().clear();
    }

    fn next_version(&self) -> u64 {
        self.last_version.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, key: &CapacityKey, at: Timestamp, unique_value: &str) -> StoreResult<()> {
        self.series
            .write()
            .entry(key.clone())
            .or_default()
            .events
            .insert((at, unique_value.to_string()));
        Ok(())
    }

    fn range_count(&self, key: &CapacityKey, min: Timestamp, max: Timestamp) -> StoreResult<u64> {
        if min > max {
            return Ok(0);
        }
        let series = self.series.read();
        let Some(s) = series.get(key) else {
            return Ok(0);
        };
        // Empty string is the smallest member, so the lower bound is inclusive.
        let count = s
            .events
            .range((min, String::new())..)
            .take_while(|(at, _)| *at <= max)
            .count();
        Ok(count as u64)
    }

    fn append_history_sample(
        &self,
        key: &CapacityKey,
        at: Timestamp,
        value: u64,
    ) -> StoreResult<()> {
        let mut series = self.series.write();
        let s = series.entry(key.clone()).or_default();
        s.history.push((at, value));
        s.history_version = self.next_version();
        Ok(())
    }

    fn history_values(&self, key: &CapacityKey) -> StoreResult<Vec<u64>> {
        Ok(self
            .series
            .read()
            .get(key)
            .map(|s| s.history.iter().map(|(_, v)| *v).collect())
            .unwrap_or_default())
    }

    fn evict_events_before(&self, key: &CapacityKey, cutoff: Timestamp) -> StoreResult<usize> {
        let mut series = self.series.write();
        let Some(s) = series.get_mut(key) else {
            return Ok(0);
        };
        let kept = s.events.split_off(&(cutoff, String::new()));
        let removed = s.events.len();
        s.events = kept;
        Ok(removed)
    }

    fn prune_history_before(&self, key: &CapacityKey, cutoff: Timestamp) -> StoreResult<usize> {
        let mut series = self.series.write();
        let Some(s) = series.get_mut(key) else {
            return Ok(0);
        };
        let before = s.history.len();
        s.history.retain(|(at, _)| *at >= cutoff);
        let removed = before - s.history.len();
        if removed > 0 {
            s.history_version = self.next_version();
        }
        Ok(removed)
    }

    fn history_version(&self, key: &CapacityKey) -> StoreResult<Option<u64>> {
        Ok(Some(
            self.series
                .read()
                .get(key)
                .map(|s| s.history_version)
                .unwrap_or(0),
        ))
    }
}
