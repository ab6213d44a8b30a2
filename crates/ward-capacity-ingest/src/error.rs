//! Error types for ingestion and its collaborators.

use thiserror::Error;
use ward_capacity_engine::CapacityError;

/// Errors that escape [`IngestOrchestrator::ingest`](crate::IngestOrchestrator::ingest).
///
/// Ledger and sink failures never appear here; they are attached to the
/// result or logged.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The capacity path failed. Fatal to the call.
    #[error("capacity update failed: {0}")]
    Capacity(#[from] CapacityError),

    /// The event was rejected before any side effect ran.
    #[error("invalid ingestion event: {0}")]
    InvalidEvent(String),
}

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Failure reported by a [`LedgerClient`](crate::LedgerClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The ledger could not be reached or timed out.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger refused the transaction.
    #[error("ledger rejected transaction {reference}: {reason}")]
    Rejected {
        /// Idempotency key of the rejected transaction.
        reference: String,
        /// Reason given by the ledger.
        reason: String,
    },
}

/// Failure reported by a [`FacilityProfileSink`](crate::FacilityProfileSink).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink could not be reached.
    #[error("facility profile sink unavailable: {0}")]
    Unavailable(String),

    /// The sink has no profile for the facility.
    #[error("unknown facility: {0}")]
    UnknownFacility(String),
}
