//! Capacity status, trend and the analysis produced per query.

use std::fmt;

/// Congestion level of a ward.
///
/// Variants are ordered: `Available < Busy < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CapacityStatus {
    /// Below the busy threshold.
    Available,
    /// At or above the busy threshold, below full.
    Busy,
    /// At or above the full threshold.
    Full,
}

impl CapacityStatus {
    /// Classifies a window count against a pair of thresholds.
    pub fn classify(count: u64, thresholds: &Thresholds) -> Self {
        let count = count as f64;
        if count >= thresholds.full {
            CapacityStatus::Full
        } else if count >= thresholds.busy {
            CapacityStatus::Busy
        } else {
            CapacityStatus::Available
        }
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityStatus::Available => "available",
            CapacityStatus::Busy => "busy",
            CapacityStatus::Full => "full",
        }
    }
}

impl fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short-term direction of load compared with the historical average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Trend {
    /// Current count is well above the historical average.
    Increasing,
    /// No significant movement.
    Stable,
    /// Current count is well below the historical average.
    ///
    /// Part of the wire enum; the analysis does not currently emit it.
    Decreasing,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Increasing => f.write_str("increasing"),
            Trend::Stable => f.write_str("stable"),
            Trend::Decreasing => f.write_str("decreasing"),
        }
    }
}

/// Busy and full congestion boundaries for a key.
///
/// Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thresholds {
    /// Count at which the ward becomes busy.
    pub busy: f64,
    /// Count at which the ward becomes full.
    pub full: f64,
}

impl Thresholds {
    /// Creates a threshold pair.
    pub const fn new(busy: f64, full: f64) -> Self {
        Self { busy, full }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(50.0, 100.0)
    }
}

/// Result of analysing a key at one point in time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CapacityAnalysis {
    /// Events in the live window.
    pub count: u64,
    /// Congestion level.
    pub status: CapacityStatus,
    /// Thresholds the status was classified against.
    pub thresholds: Thresholds,
    /// Load direction.
    pub trend: Trend,
    /// Estimated walk-in wait, rounded to the nearest whole minute.
    pub estimated_wait_minutes: u32,
    /// Whether the key had enough history for percentile thresholds.
    pub mature: bool,
}
