//! Nearest-rank percentile and mean over history sample populations.

use crate::error::{CapacityError, CapacityResult};

/// Slack subtracted before `ceil` so that products like `0.07 * 100`
/// (which evaluates to `7.000000000000001`) land on rank 7.
const RANK_EPSILON: f64 = 1e-9;

/// Returns the 1-indexed nearest rank `ceil(p * n)`, clamped to `[1, n]`.
///
/// `n` must be non-zero.
pub fn nearest_rank(percentile: f64, n: usize) -> usize {
    let raw = (percentile * n as f64 - RANK_EPSILON).ceil();
    (raw.max(1.0) as usize).min(n)
}

/// Value at the nearest rank of `percentile` in the ascending population.
///
/// Not interpolated: the result is always one of the input values. An empty
/// population yields `0.0`.
///
/// # Example
///
/// ```rust
/// use ward_capacity_engine::percentile_of;
///
/// let samples: Vec<u64> = (1..=10).map(|i| i * 10).collect();
/// assert_eq!(percentile_of(&samples, 0.75).unwrap(), 80.0);
/// assert_eq!(percentile_of(&samples, 0.95).unwrap(), 100.0);
/// ```
pub fn percentile_of(values: &[u64], percentile: f64) -> CapacityResult<f64> {
    if !(0.0..=1.0).contains(&percentile) {
        return Err(CapacityError::InvalidPercentile(percentile));
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Ok(value_at_percentile(&sorted, percentile))
}

/// Nearest-rank lookup on an already ascending slice.
pub(crate) fn value_at_percentile(sorted: &[u64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = nearest_rank(percentile, sorted.len());
    sorted[rank - 1] as f64
}

/// Arithmetic mean, `0.0` for an empty population.
pub fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: u128 = values.iter().map(|v| *v as u128).sum();
    sum as f64 / values.len() as f64
}
