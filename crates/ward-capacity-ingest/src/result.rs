//! Ingestion result types.

use serde::{Deserialize, Serialize};
use ward_capacity::{CapacityAnalysis, CapacityStatus, Thresholds, Trend};

use crate::ledger::LedgerStatus;

/// What happened to the ledger side of an ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum LedgerOutcome {
    /// The ledger accepted the transaction.
    Recorded {
        /// Ledger-assigned id.
        #[serde(rename = "transactionId")]
        transaction_id: String,
        /// Posting state reported by the ledger.
        status: LedgerStatus,
    },
    /// The event carried no accounts.
    NotRequested,
    /// Only one of the two accounts was present.
    Skipped {
        /// Why the ledger was not called.
        reason: String,
    },
    /// The ledger call failed.
    Failed {
        /// Error reported by the ledger client.
        reason: String,
    },
}

impl LedgerOutcome {
    /// Ledger transaction id, if one was recorded.
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            LedgerOutcome::Recorded { transaction_id, .. } => Some(transaction_id),
            _ => None,
        }
    }

    /// Non-fatal warning to surface to the caller, if any.
    pub fn warning(&self) -> Option<&str> {
        match self {
            LedgerOutcome::Skipped { reason } | LedgerOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Returns true if the ledger call was attempted and failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, LedgerOutcome::Failed { .. })
    }
}

/// Consolidated outcome of one ingested event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResult {
    /// Events in the live window, this one included.
    pub capacity_count: u64,
    /// Congestion level after recording.
    pub status: CapacityStatus,
    /// Thresholds used for the status.
    pub thresholds: Thresholds,
    /// Load direction.
    pub trend: Trend,
    /// Estimated walk-in wait, `base_wait + ratio * congestion_factor`
    /// rounded to the nearest whole minute.
    pub estimated_wait_minutes: u32,
    /// Ledger transaction id, absent unless the ledger recorded the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_transaction_id: Option<String>,
    /// The event's idempotency key, unchanged.
    pub reference: String,
    /// Ledger outcome in detail.
    pub ledger: LedgerOutcome,
    /// Whether this call pushed a status change to the facility profile.
    pub status_published: bool,
}

impl IngestionResult {
    pub(crate) fn new(
        analysis: CapacityAnalysis,
        ledger: LedgerOutcome,
        reference: String,
        status_published: bool,
    ) -> Self {
        Self {
            capacity_count: analysis.count,
            status: analysis.status,
            thresholds: analysis.thresholds,
            trend: analysis.trend,
            estimated_wait_minutes: analysis.estimated_wait_minutes,
            ledger_transaction_id: ledger.transaction_id().map(str::to_string),
            reference,
            ledger,
            status_published,
        }
    }

    /// Ledger warning attached to this result, if any.
    pub fn warning(&self) -> Option<&str> {
        self.ledger.warning()
    }
}
