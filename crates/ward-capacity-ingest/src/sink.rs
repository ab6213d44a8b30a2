//! Facility profile sink interface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ward_capacity::{CapacityAnalysis, CapacityStatus, Thresholds, Timestamp, Trend};

use crate::error::SinkError;

/// Receives ward status changes for a facility's public profile.
///
/// Calls are fire-and-forget from the orchestrator's point of view: an error
/// is logged and counted, never returned to the ingesting caller.
pub trait FacilityProfileSink: Send + Sync {
    /// Pushes a ward update for `facility_id`.
    fn update_status(
        &self,
        facility_id: &str,
        update: &FacilityStatusUpdate,
    ) -> Result<(), SinkError>;
}

impl<S: FacilityProfileSink + ?Sized> FacilityProfileSink for Arc<S> {
    fn update_status(
        &self,
        facility_id: &str,
        update: &FacilityStatusUpdate,
    ) -> Result<(), SinkError> {
        (**self).update_status(facility_id, update)
    }
}

/// Payload sent to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityStatusUpdate {
    /// The ward whose status changed.
    pub ward_update: WardUpdate,
}

/// Status of one ward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardUpdate {
    /// Ward id.
    pub ward_name: String,
    /// New congestion level.
    pub status: CapacityStatus,
    /// Events in the live window.
    pub count: u64,
    /// Thresholds the status was classified against.
    pub thresholds: Thresholds,
    /// Load direction.
    pub trend: Trend,
    /// Estimated walk-in wait, rounded to whole minutes.
    pub estimated_wait_minutes: u32,
    /// Timestamp of the event that caused the change.
    pub observed_at: Timestamp,
}

impl FacilityStatusUpdate {
    /// Builds the update for a ward from its latest analysis.
    pub fn from_analysis(
        ward_name: impl Into<String>,
        analysis: &CapacityAnalysis,
        observed_at: Timestamp,
    ) -> Self {
        Self {
            ward_update: WardUpdate {
                ward_name: ward_name.into(),
                status: analysis.status,
                count: analysis.count,
                thresholds: analysis.thresholds,
                trend: analysis.trend,
                estimated_wait_minutes: analysis.estimated_wait_minutes,
                observed_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_update_json_shape() {
        let analysis = CapacityAnalysis {
            count: 60,
            status: CapacityStatus::Busy,
            thresholds: Thresholds::new(50.0, 100.0),
            trend: Trend::Stable,
            estimated_wait_minutes: 123,
            mature: false,
        };
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let update = FacilityStatusUpdate::from_analysis("emergency", &analysis, at);

        let json = serde_json::to_value(&update).unwrap();
        let ward = &json["wardUpdate"];
        assert_eq!(ward["wardName"], "emergency");
        assert_eq!(ward["status"], "busy");
        assert_eq!(ward["count"], 60);
        assert_eq!(ward["thresholds"]["busy"], 50.0);
        assert_eq!(ward["estimatedWaitMinutes"], 123);
    }
}
