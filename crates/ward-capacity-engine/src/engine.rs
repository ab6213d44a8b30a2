//! Capacity engine implementation.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;
use uuid::Uuid;
use ward_capacity::{
    CapacityAnalysis, CapacityKey, CapacityStatus, Clock, Event, EventStore, HistorySample,
    SystemClock, Thresholds, Timestamp, Trend,
};

use crate::baseline::Baseline;
use crate::cache::BaselineCache;
use crate::config::EngineConfig;
use crate::error::CapacityResult;
use crate::percentile::percentile_of;
use crate::profile::{resolve_profile, WardProfile};

/// Multiple of the historical average above which load is `increasing`.
pub const TREND_INCREASE_FACTOR: f64 = 1.5;

/// Ward-level capacity estimation engine.
///
/// The engine is stateless apart from an optional baseline cache: every
/// count and history value is read from the [`EventStore`] at call time, so
/// any number of engines in any number of processes can share one store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use ward_capacity::{CapacityKey, CapacityStatus, InMemoryEventStore};
/// use ward_capacity_engine::CapacityEngine;
///
/// let engine = CapacityEngine::new(Arc::new(InMemoryEventStore::new()));
/// let key = CapacityKey::new("st-marys", "emergency");
///
/// for _ in 0..10 {
///     engine.record_event(&key).unwrap();
/// }
///
/// let analysis = engine.analyze(&key).unwrap();
/// assert_eq!(analysis.count, 10);
/// assert_eq!(analysis.status, CapacityStatus::Available);
/// assert_eq!(analysis.estimated_wait_minutes, 33);
/// ```
pub struct CapacityEngine {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    cache: Option<BaselineCache>,
}

impl CapacityEngine {
    /// Creates an engine with default configuration and the system clock.
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::build(store, EngineConfig::default())
    }

    /// Creates an engine with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns `CapacityError::InvalidConfig` if `config` fails
    /// [`EngineConfig::validate`].
    pub fn with_config(store: Arc<dyn EventStore>, config: EngineConfig) -> CapacityResult<Self> {
        config.validate()?;
        Ok(Self::build(store, config))
    }

    fn build(store: Arc<dyn EventStore>, config: EngineConfig) -> Self {
        let cache = config.baseline_cache.clone().map(BaselineCache::new);
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
            cache,
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns a reference to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the baseline cache if enabled.
    pub fn cache(&self) -> Option<&BaselineCache> {
        self.cache.as_ref()
    }

    /// Appends an event for `key` at the current time.
    ///
    /// Each call gets a fresh unique id, so concurrent calls for the same key
    /// never collapse into one member.
    pub fn record_event(&self, key: &CapacityKey) -> CapacityResult<Event> {
        let event = Event {
            key: key.clone(),
            occurred_at: self.clock.now(),
            unique_id: Uuid::new_v4().to_string(),
        };
        self.store
            .append(&event.key, event.occurred_at, &event.unique_id)?;
        debug!(
            facility_id = %key.facility_id,
            ward_id = %key.ward_id,
            unique_id = %event.unique_id,
            "recorded capacity event"
        );
        Ok(event)
    }

    /// Counts events for `key` within the last `window_minutes`.
    ///
    /// An event at `t` is counted at `now` iff `now - window <= t <= now`.
    /// Out-of-window events are excluded by the range query itself, whether or
    /// not they have been evicted yet.
    pub fn window_count(&self, key: &CapacityKey, window_minutes: u32) -> CapacityResult<u64> {
        let now = self.clock.now();
        let since = now - Duration::minutes(i64::from(window_minutes));
        Ok(self.store.range_count(key, since, now)?)
    }

    /// Counts events for `key` within the configured window.
    pub fn current_count(&self, key: &CapacityKey) -> CapacityResult<u64> {
        self.window_count(key, self.config.window_minutes)
    }

    /// Nearest-rank percentile of the history samples of `key`.
    ///
    /// Returns `0.0` when the key has no history.
    pub fn percentile_threshold(&self, key: &CapacityKey, percentile: f64) -> CapacityResult<f64> {
        let values = self.store.history_values(key)?;
        percentile_of(&values, percentile)
    }

    /// History baseline for `key`.
    ///
    /// With the cache enabled, a cached baseline is served only while the
    /// store reports the same history version it was computed at, so samples
    /// written by any producer are seen on the next call. Stores that report
    /// no version are always read directly.
    pub fn baseline(&self, key: &CapacityKey) -> CapacityResult<Baseline> {
        let Some(cache) = &self.cache else {
            return self.load_baseline(key);
        };
        let Some(version) = self.store.history_version(key)? else {
            return self.load_baseline(key);
        };
        if let Some(cached) = cache.get(key, version) {
            return Ok(cached);
        }
        // A sample landing after the version read only makes the entry
        // mismatch on the next call.
        let baseline = self.load_baseline(key)?;
        cache.set(key.clone(), version, baseline);
        Ok(baseline)
    }

    fn load_baseline(&self, key: &CapacityKey) -> CapacityResult<Baseline> {
        let values = self.store.history_values(key)?;
        Ok(Baseline::from_samples(&values))
    }

    /// Thresholds for a baseline, and whether the baseline is mature.
    ///
    /// Immature keys use the configured defaults; mature keys use the 75th
    /// and 95th percentiles. A configured `capacity_threshold` replaces the
    /// busy value in both cases.
    pub fn thresholds_for(&self, baseline: &Baseline) -> (Thresholds, bool) {
        let mature = baseline.sample_count >= self.config.maturity_sample_count;
        let mut thresholds = if mature {
            Thresholds::new(baseline.busy_percentile, baseline.full_percentile)
        } else {
            self.config.default_thresholds
        };
        if let Some(fixed) = self.config.capacity_threshold {
            thresholds.busy = fixed;
        }
        (thresholds, mature)
    }

    /// Wait-time profile for a ward id.
    pub fn ward_profile(&self, ward_id: &str) -> &WardProfile {
        resolve_profile(
            &self.config.ward_profiles,
            &self.config.default_ward_profile,
            ward_id,
        )
    }

    /// Computes the live capacity picture for `key`.
    ///
    /// Reads the window count and the history baseline from the store, then
    /// derives thresholds, status, trend and wait time from them.
    ///
    /// # Arguments
    ///
    /// * `key` - The `(facility, ward)` pair to analyse.
    ///
    /// # Returns
    ///
    /// A [`CapacityAnalysis`] whose `estimated_wait_minutes` is the wait-time
    /// formula rounded to the nearest whole minute.
    ///
    /// # Errors
    ///
    /// Returns `CapacityError::StoreUnavailable` if any store read fails.
    pub fn analyze(&self, key: &CapacityKey) -> CapacityResult<CapacityAnalysis> {
        let baseline = self.baseline(key)?;
        let (thresholds, mature) = self.thresholds_for(&baseline);
        let count = self.current_count(key)?;

        let status = CapacityStatus::classify(count, &thresholds);
        let trend = trend_of(count, baseline.average);
        let estimated_wait_minutes = self.ward_profile(&key.ward_id).estimate_wait(
            count,
            thresholds.busy,
            self.config.max_congestion_ratio,
        );

        debug!(
            facility_id = %key.facility_id,
            ward_id = %key.ward_id,
            count,
            status = %status,
            trend = %trend,
            busy = thresholds.busy,
            full = thresholds.full,
            mature,
            samples = baseline.sample_count,
            "analyzed ward capacity"
        );

        Ok(CapacityAnalysis {
            count,
            status,
            thresholds,
            trend,
            estimated_wait_minutes,
            mature,
        })
    }

    /// Snapshots the current window count of `key` as a history sample.
    ///
    /// Samples older than the history retention are pruned afterwards and the
    /// key's cached baseline is dropped. Meant to be driven by an external
    /// scheduler at a fixed cadence.
    pub fn record_history_sample(&self, key: &CapacityKey) -> CapacityResult<HistorySample> {
        let now = self.clock.now();
        let window_count = self.current_count(key)?;
        self.store.append_history_sample(key, now, window_count)?;

        let cutoff = horizon(now, Duration::days(i64::from(self.config.history_retention_days)));
        let pruned = self.store.prune_history_before(key, cutoff)?;
        if let Some(cache) = &self.cache {
            cache.invalidate(key);
        }

        debug!(
            facility_id = %key.facility_id,
            ward_id = %key.ward_id,
            window_count,
            pruned,
            "recorded history sample"
        );

        Ok(HistorySample {
            key: key.clone(),
            recorded_at: now,
            window_count,
        })
    }

    /// Physically removes events of `key` past the retention horizon.
    ///
    /// Counts never depend on this; it only bounds storage.
    pub fn evict_expired(&self, key: &CapacityKey) -> CapacityResult<usize> {
        let retention = Duration::minutes(i64::from(self.config.event_retention()));
        let cutoff = horizon(self.clock.now(), retention);
        Ok(self.store.evict_events_before(key, cutoff)?)
    }
}

impl std::fmt::Debug for CapacityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapacityEngine")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

/// `now - age`, saturating at the earliest representable time.
fn horizon(now: Timestamp, age: Duration) -> Timestamp {
    now.checked_sub_signed(age)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC)
}

/// `Increasing` iff the average is positive and `count > 1.5 * average`.
pub fn trend_of(count: u64, average: f64) -> Trend {
    if average > 0.0 && count as f64 > TREND_INCREASE_FACTOR * average {
        Trend::Increasing
    } else {
        Trend::Stable
    }
}
