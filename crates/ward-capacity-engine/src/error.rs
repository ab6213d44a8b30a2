//! Error types for capacity analysis.

use std::path::PathBuf;

use thiserror::Error;
use ward_capacity::StoreError;

/// Errors that can occur while recording or analysing capacity.
#[derive(Error, Debug)]
pub enum CapacityError {
    /// The event store failed; the call is not retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Percentile outside `0.0..=1.0`.
    #[error("invalid percentile {0}: expected a value in 0.0..=1.0")]
    InvalidPercentile(f64),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    ConfigIo {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`EngineConfig`](crate::EngineConfig).
    #[error("invalid configuration file {path}: {message}")]
    ConfigFormat {
        /// File that was being parsed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

impl CapacityError {
    /// Creates an I/O error with path context.
    pub fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type for capacity engine operations.
pub type CapacityResult<T> = std::result::Result<T, CapacityError>;
