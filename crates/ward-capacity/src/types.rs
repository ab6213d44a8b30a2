//! Keys, events and history samples.

use std::fmt;

use crate::Timestamp;

/// Scope of every count, threshold and history series: a ward within a facility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CapacityKey {
    /// Facility identifier.
    pub facility_id: String,
    /// Ward identifier within the facility (e.g. `emergency`, `maternity`).
    pub ward_id: String,
}

impl CapacityKey {
    /// Creates a key for the given facility and ward.
    pub fn new(facility_id: impl Into<String>, ward_id: impl Into<String>) -> Self {
        Self {
            facility_id: facility_id.into(),
            ward_id: ward_id.into(),
        }
    }
}

impl fmt::Display for CapacityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.facility_id, self.ward_id)
    }
}

/// A single ingested event under a [`CapacityKey`].
///
/// Events are append-only. They are never updated and only leave the store
/// once they fall behind the retention horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Event {
    /// Facility and ward the event belongs to.
    pub key: CapacityKey,
    /// When the event was recorded.
    pub occurred_at: Timestamp,
    /// Unique member value; two appends with distinct values count twice.
    pub unique_id: String,
}

/// Snapshot of a completed window's event count.
///
/// The population of samples for a key forms the baseline for percentile
/// thresholds and the trend average.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HistorySample {
    /// Facility and ward the sample belongs to.
    pub key: CapacityKey,
    /// When the snapshot was taken.
    pub recorded_at: Timestamp,
    /// Events counted in the window at snapshot time.
    pub window_count: u64,
}
