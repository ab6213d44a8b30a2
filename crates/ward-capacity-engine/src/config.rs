//! Configuration types for the capacity engine.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ward_capacity::Thresholds;

use crate::error::{CapacityError, CapacityResult};
use crate::profile::{default_ward_profiles, WardProfile};

/// Default live-count window.
pub const DEFAULT_WINDOW_MINUTES: u32 = 240;

/// Samples required before percentile thresholds replace the defaults.
pub const DEFAULT_MATURITY_SAMPLE_COUNT: usize = 5;

/// Upper bound on `count / busy` in the wait-time formula.
pub const DEFAULT_MAX_CONGESTION_RATIO: f64 = 2.0;

/// Age after which history samples are pruned.
pub const DEFAULT_HISTORY_RETENTION_DAYS: u32 = 30;

/// Configuration for the capacity engine.
///
/// Every field has a default, so a JSON file only needs the fields it
/// overrides.
///
/// # Example
///
/// ```rust
/// use ward_capacity_engine::{EngineConfig, WardProfile};
///
/// let config = EngineConfig::builder()
///     .with_window_minutes(120)
///     .with_ward_profile("maternity", WardProfile::new(20.0, 45.0))
///     .with_capacity_threshold(30.0)
///     .build();
///
/// assert_eq!(config.window_minutes, 120);
/// assert_eq!(config.capacity_threshold, Some(30.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Live-count window in minutes.
    pub window_minutes: u32,
    /// Minimum history samples for percentile thresholds.
    pub maturity_sample_count: usize,
    /// Thresholds used while a key is immature.
    pub default_thresholds: Thresholds,
    /// Fixed busy threshold replacing both the default and the percentile.
    pub capacity_threshold: Option<f64>,
    /// Ward type to wait-time profile.
    pub ward_profiles: BTreeMap<String, WardProfile>,
    /// Profile for ward types missing from `ward_profiles`.
    pub default_ward_profile: WardProfile,
    /// Cap on the congestion ratio in the wait-time formula.
    pub max_congestion_ratio: f64,
    /// Events older than this many minutes may be evicted (None = window).
    pub event_retention_minutes: Option<u32>,
    /// History samples older than this many days are pruned.
    pub history_retention_days: u32,
    /// History baseline cache (None = compute on every call).
    pub baseline_cache: Option<BaselineCacheConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
            maturity_sample_count: DEFAULT_MATURITY_SAMPLE_COUNT,
            default_thresholds: Thresholds::default(),
            capacity_threshold: None,
            ward_profiles: default_ward_profiles(),
            default_ward_profile: WardProfile::default(),
            max_congestion_ratio: DEFAULT_MAX_CONGESTION_RATIO,
            event_retention_minutes: None,
            history_retention_days: DEFAULT_HISTORY_RETENTION_DAYS,
            baseline_cache: None,
        }
    }
}

impl EngineConfig {
    /// Creates a new builder for EngineConfig.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Effective event retention in minutes.
    pub fn event_retention(&self) -> u32 {
        self.event_retention_minutes
            .unwrap_or(self.window_minutes)
            .max(self.window_minutes)
    }

    /// Checks the configuration for values the engine cannot work with.
    pub fn validate(&self) -> CapacityResult<()> {
        if self.window_minutes == 0 {
            return Err(CapacityError::InvalidConfig(
                "windowMinutes must be greater than zero".to_string(),
            ));
        }
        if self.maturity_sample_count == 0 {
            return Err(CapacityError::InvalidConfig(
                "maturitySampleCount must be at least 1".to_string(),
            ));
        }
        let t = &self.default_thresholds;
        if !(t.busy.is_finite() && t.full.is_finite()) || t.busy < 0.0 || t.busy > t.full {
            return Err(CapacityError::InvalidConfig(format!(
                "defaultThresholds must satisfy 0 <= busy <= full, got busy={} full={}",
                t.busy, t.full
            )));
        }
        if let Some(fixed) = self.capacity_threshold {
            if !fixed.is_finite() || fixed < 0.0 {
                return Err(CapacityError::InvalidConfig(format!(
                    "capacityThreshold must be a non-negative number, got {fixed}"
                )));
            }
        }
        if !self.max_congestion_ratio.is_finite() || self.max_congestion_ratio < 0.0 {
            return Err(CapacityError::InvalidConfig(format!(
                "maxCongestionRatio must be a non-negative number, got {}",
                self.max_congestion_ratio
            )));
        }
        Ok(())
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> CapacityResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CapacityError::config_io(path, e))?;
        let reader = BufReader::new(file);
        let config: Self =
            serde_json::from_reader(reader).map_err(|e| CapacityError::ConfigFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CapacityResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| CapacityError::config_io(path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| CapacityError::ConfigFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Builder for EngineConfig.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Sets the live-count window.
    pub fn with_window_minutes(mut self, minutes: u32) -> Self {
        self.config.window_minutes = minutes;
        self
    }

    /// Sets how many history samples make a key mature.
    pub fn with_maturity_sample_count(mut self, count: usize) -> Self {
        self.config.maturity_sample_count = count;
        self
    }

    /// Sets the thresholds used while a key is immature.
    pub fn with_default_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.default_thresholds = thresholds;
        self
    }

    /// Fixes the busy threshold, bypassing percentile computation.
    pub fn with_capacity_threshold(mut self, busy: f64) -> Self {
        self.config.capacity_threshold = Some(busy);
        self
    }

    /// Adds or replaces the profile for a ward type.
    pub fn with_ward_profile(mut self, ward_type: &str, profile: WardProfile) -> Self {
        self.config
            .ward_profiles
            .insert(ward_type.trim().to_ascii_lowercase(), profile);
        self
    }

    /// Sets the profile used for unlisted ward types.
    pub fn with_default_ward_profile(mut self, profile: WardProfile) -> Self {
        self.config.default_ward_profile = profile;
        self
    }

    /// Sets the congestion ratio cap.
    pub fn with_max_congestion_ratio(mut self, ratio: f64) -> Self {
        self.config.max_congestion_ratio = ratio;
        self
    }

    /// Sets the event retention horizon.
    pub fn with_event_retention_minutes(mut self, minutes: u32) -> Self {
        self.config.event_retention_minutes = Some(minutes);
        self
    }

    /// Sets the history sample retention horizon.
    pub fn with_history_retention_days(mut self, days: u32) -> Self {
        self.config.history_retention_days = days;
        self
    }

    /// Enables the history baseline cache.
    pub fn with_baseline_cache(mut self, cache: BaselineCacheConfig) -> Self {
        self.config.baseline_cache = Some(cache);
        self
    }

    /// Builds the EngineConfig.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// Configuration for the history baseline cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BaselineCacheConfig {
    /// Maximum number of cached keys.
    pub max_entries: usize,
    /// Time-to-live for cached baselines.
    pub ttl: Duration,
}

impl Default for BaselineCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(60),
        }
    }
}
