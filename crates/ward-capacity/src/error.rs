//! Error types for event store access.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by an [`EventStore`](crate::EventStore) backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or rejected the call.
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within its client timeout.
    #[error("event store timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for event store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
