//! The event store abstraction.
//!
//! All mutable capacity state lives behind [`EventStore`]. The engine keeps no
//! counters of its own, so any number of ingestion workers can share one
//! store without a distributed lock, as long as `append` is atomic per call.
//!
//! # Implementing EventStore
//!
//! Any backend offering atomic append and count-by-timestamp-range works: a
//! sorted-set service, a time-series table, or a relational table indexed on
//! `(facility_id, ward_id, occurred_at)`.
//!
//! ```ignore
//! use ward_capacity::{CapacityKey, EventStore, StoreError, StoreResult, Timestamp};
//!
//! impl EventStore for PgEventStore {
//!     fn append(&self, key: &CapacityKey, at: Timestamp, unique: &str) -> StoreResult<()> {
//!         self.execute(
//!             "INSERT INTO ward_events (facility_id, ward_id, occurred_at, unique_id)
//!              VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
//!             &[&key.facility_id, &key.ward_id, &at, &unique],
//!         )
//!         .map_err(|e| StoreError::Unavailable(e.to_string()))
//!     }
//!     // ...
//! }
//! ```

use crate::{CapacityKey, StoreResult, Timestamp};

/// Time-indexed store of per-key events and history samples.
///
/// # Required Methods
///
/// - [`append`](Self::append) - Add an event member at a timestamp
/// - [`range_count`](Self::range_count) - Count events in an inclusive range
/// - [`append_history_sample`](Self::append_history_sample) - Add a window snapshot
/// - [`history_values`](Self::history_values) - All snapshot values for a key
///
/// # Optional Methods (with defaults)
///
/// Eviction is a storage optimisation only; counts never depend on it. The
/// defaults remove nothing.
///
/// [`history_version`](Self::history_version) lets callers reuse values
/// derived from a key's history until that history changes. The default
/// reports no version, which disables such reuse.
pub trait EventStore: Send + Sync {
    /// Appends an event member under `key` scored by `at`.
    ///
    /// Must be atomic per call. Appending the same `unique_value` twice at the
    /// same key stores one member; distinct values always count separately.
    fn append(&self, key: &CapacityKey, at: Timestamp, unique_value: &str) -> StoreResult<()>;

    /// Counts events under `key` with `min <= occurred_at <= max`.
    ///
    /// Returns 0 when `min > max`.
    fn range_count(&self, key: &CapacityKey, min: Timestamp, max: Timestamp) -> StoreResult<u64>;

    /// Appends a history sample under `key`.
    fn append_history_sample(&self, key: &CapacityKey, at: Timestamp, value: u64)
        -> StoreResult<()>;

    /// Returns every history sample value under `key`, in no particular order.
    fn history_values(&self, key: &CapacityKey) -> StoreResult<Vec<u64>>;

    /// Removes events under `key` with `occurred_at < cutoff`.
    ///
    /// Returns the number of events removed.
    fn evict_events_before(&self, key: &CapacityKey, cutoff: Timestamp) -> StoreResult<usize> {
        let _ = (key, cutoff);
        Ok(0)
    }

    /// Removes history samples under `key` with `recorded_at < cutoff`.
    ///
    /// Returns the number of samples removed.
    fn prune_history_before(&self, key: &CapacityKey, cutoff: Timestamp) -> StoreResult<usize> {
        let _ = (key, cutoff);
        Ok(0)
    }

    /// Version of the history under `key`.
    ///
    /// Must change whenever a sample is appended or pruned under `key`, by
    /// any writer. `None` means the store cannot tell.
    fn history_version(&self, key: &CapacityKey) -> StoreResult<Option<u64>> {
        let _ = key;
        Ok(None)
    }
}

impl<S: EventStore + ?Sized> EventStore for std::sync::Arc<S> {
    fn append(&self, key: &CapacityKey, at: Timestamp, unique_value: &str) -> StoreResult<()> {
        (**self).append(key, at, unique_value)
    }

    fn range_count(&self, key: &CapacityKey, min: Timestamp, max: Timestamp) -> StoreResult<u64> {
        (**self).range_count(key, min, max)
    }

    fn append_history_sample(
        &self,
        key: &CapacityKey,
        at: Timestamp,
        value: u64,
    ) -> StoreResult<()> {
        (**self).append_history_sample(key, at, value)
    }

    fn history_values(&self, key: &CapacityKey) -> StoreResult<Vec<u64>> {
        (**self).history_values(key)
    }

    fn evict_events_before(&self, key: &CapacityKey, cutoff: Timestamp) -> StoreResult<usize> {
        (**self).evict_events_before(key, cutoff)
    }

    fn prune_history_before(&self, key: &CapacityKey, cutoff: Timestamp) -> StoreResult<usize> {
        (**self).prune_history_before(key, cutoff)
    }

    fn history_version(&self, key: &CapacityKey) -> StoreResult<Option<u64>> {
        (**self).history_version(key)
    }
}
