//! Ward-type profiles and wait-time estimation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Wait-time parameters for one ward type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardProfile {
    /// Minutes of wait with an empty ward.
    pub base_wait: f64,
    /// Minutes added at a congestion ratio of 1.0.
    pub congestion_factor: f64,
}

impl WardProfile {
    /// Emergency department profile.
    pub const EMERGENCY: WardProfile = WardProfile::new(15.0, 90.0);

    /// Profile used for ward types without an entry of their own.
    pub const FALLBACK: WardProfile = WardProfile::new(15.0, 60.0);

    /// Creates a profile.
    pub const fn new(base_wait: f64, congestion_factor: f64) -> Self {
        Self {
            base_wait,
            congestion_factor,
        }
    }

    /// Estimated wait in whole minutes for `count` events against `busy`.
    ///
    /// `base_wait + ratio * congestion_factor`, where the ratio is
    /// [`congestion_ratio`] capped at `max_ratio`. Never negative.
    pub fn estimate_wait(&self, count: u64, busy: f64, max_ratio: f64) -> u32 {
        let ratio = congestion_ratio(count, busy, max_ratio);
        let minutes = self.base_wait + ratio * self.congestion_factor;
        if minutes.is_finite() && minutes > 0.0 {
            minutes.round().min(u32::MAX as f64) as u32
        } else {
            0
        }
    }
}

impl Default for WardProfile {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// `count / busy`, clamped to `[0, max_ratio]`.
///
/// A non-positive busy threshold means any load saturates the ward: the ratio
/// is `0` for an empty window and `max_ratio` otherwise.
pub fn congestion_ratio(count: u64, busy: f64, max_ratio: f64) -> f64 {
    let max_ratio = max_ratio.max(0.0);
    if busy <= 0.0 || !busy.is_finite() {
        return if count == 0 { 0.0 } else { max_ratio };
    }
    (count as f64 / busy).clamp(0.0, max_ratio)
}

/// Built-in ward-type table.
pub fn default_ward_profiles() -> BTreeMap<String, WardProfile> {
    let mut profiles = BTreeMap::new();
    profiles.insert("emergency".to_string(), WardProfile::EMERGENCY);
    profiles
}

/// Looks up the profile for `ward_id`, matching ward types case-insensitively.
pub fn resolve_profile<'a>(
    profiles: &'a BTreeMap<String, WardProfile>,
    fallback: &'a WardProfile,
    ward_id: &str,
) -> &'a WardProfile {
    let ward = ward_id.trim();
    profiles
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(ward))
        .map(|(_, profile)| profile)
        .unwrap_or(fallback)
}
