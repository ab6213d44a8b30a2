//! Summary of a key's history sample population.

use crate::percentile::{mean, value_at_percentile};

/// Percentile used for the busy threshold once a key is mature.
pub const BUSY_PERCENTILE: f64 = 0.75;

/// Percentile used for the full threshold once a key is mature.
pub const FULL_PERCENTILE: f64 = 0.95;

/// Everything the analysis needs from the history samples of one key.
///
/// Built from a single read of the population so maturity, thresholds and
/// the trend average agree with each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Number of history samples.
    pub sample_count: usize,
    /// 75th-percentile window count (nearest rank).
    pub busy_percentile: f64,
    /// 95th-percentile window count (nearest rank).
    pub full_percentile: f64,
    /// Mean window count, 0 when there are no samples.
    pub average: f64,
}

impl Baseline {
    /// Computes the baseline of a sample population.
    pub fn from_samples(values: &[u64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        Self {
            sample_count: sorted.len(),
            busy_percentile: value_at_percentile(&sorted, BUSY_PERCENTILE),
            full_percentile: value_at_percentile(&sorted, FULL_PERCENTILE),
            average: mean(&sorted),
        }
    }

    /// Baseline of a key with no history.
    pub fn empty() -> Self {
        Self::from_samples(&[])
    }
}
