//! # ward-capacity-engine
//!
//! Ward-level capacity estimation over a shared [`EventStore`].
//!
//! For a `(facility, ward)` key the engine answers: how many events fell in
//! the live window, how that compares with the key's own history, whether
//! load is rising, and how long a walk-in should expect to wait.
//!
//! ## Key Features
//!
//! - **Sliding window** - counts are range queries over event timestamps
//! - **Adaptive thresholds** - 75th/95th nearest-rank percentiles of history
//!   samples once a key is mature, fixed defaults before that
//! - **Trend detection** - current count against the historical mean
//! - **Wait estimation** - per-ward-type base wait plus a congestion term
//! - **Optional caching** - LRU + TTL cache for history baselines
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use ward_capacity::{CapacityKey, InMemoryEventStore};
//! use ward_capacity_engine::{CapacityEngine, EngineConfig};
//!
//! let store = Arc::new(InMemoryEventStore::new());
//! let config = EngineConfig::builder().with_window_minutes(120).build();
//! let engine = CapacityEngine::with_config(store, config).unwrap();
//!
//! let key = CapacityKey::new("st-marys", "emergency");
//! engine.record_event(&key).unwrap();
//!
//! let analysis = engine.analyze(&key).unwrap();
//! println!("{} events, {} ({})", analysis.count, analysis.status, analysis.trend);
//! ```
//!
//! ## Analysis Rules
//!
//! | Step | Rule |
//! |------|------|
//! | Maturity | `samples >= maturity_sample_count` (5) |
//! | Thresholds | immature: `{50, 100}`; mature: `{p75, p95}`; `capacity_threshold` overrides busy |
//! | Status | `full` if `count >= full`, else `busy` if `count >= busy`, else `available` |
//! | Trend | `increasing` iff `avg > 0 && count > 1.5 * avg`, else `stable` |
//! | Wait | `base_wait + min(count / busy, max_ratio) * congestion_factor` |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  ward-capacity-engine                    │
//! │                                                          │
//! │  CapacityEngine                                          │
//! │  ├── record_event ──────────► EventStore::append         │
//! │  ├── window_count ──────────► EventStore::range_count    │
//! │  ├── baseline ──────────────► EventStore::history_values │
//! │  ├── thresholds_for / trend_of / WardProfile             │
//! │  └── analyze → CapacityAnalysis                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod baseline;
mod cache;
mod config;
mod engine;
mod error;
mod percentile;
mod profile;

// Public re-exports
pub use baseline::{Baseline, BUSY_PERCENTILE, FULL_PERCENTILE};
pub use cache::BaselineCache;
pub use config::{
    BaselineCacheConfig, EngineConfig, EngineConfigBuilder, DEFAULT_HISTORY_RETENTION_DAYS,
    DEFAULT_MATURITY_SAMPLE_COUNT, DEFAULT_MAX_CONGESTION_RATIO, DEFAULT_WINDOW_MINUTES,
};
pub use engine::{trend_of, CapacityEngine, TREND_INCREASE_FACTOR};
pub use error::{CapacityError, CapacityResult};
pub use percentile::{mean, nearest_rank, percentile_of};
pub use profile::{congestion_ratio, default_ward_profiles, resolve_profile, WardProfile};

// Re-export commonly used types from dependencies for convenience
pub use ward_capacity::{
    CapacityAnalysis, CapacityKey, CapacityStatus, EventStore, Thresholds, Trend,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _: Option<EngineConfig> = None;
        let _: Option<BaselineCacheConfig> = None;
        let _: Option<CapacityEngine> = None;
        let _: Option<CapacityResult<()>> = None;
        let _: Option<WardProfile> = None;
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CapacityEngine>();
        assert_send_sync::<BaselineCache>();
    }
}
