//! # ward-capacity
//!
//! Core types for ward-level capacity signalling in healthcare facilities.
//!
//! This crate provides:
//! - **Data model**: [`CapacityKey`], [`Event`], [`HistorySample`],
//!   [`Thresholds`], [`CapacityAnalysis`]
//! - **Event store abstraction**: the [`EventStore`] trait, implemented by any
//!   backend offering atomic append and range-count-by-timestamp
//! - **In-process store**: [`InMemoryEventStore`] for single-node deployments
//!   and tests
//! - **Clocks**: [`SystemClock`] and a settable [`ManualClock`]
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use ward_capacity::{CapacityKey, EventStore, InMemoryEventStore};
//!
//! let store = InMemoryEventStore::new();
//! let key = CapacityKey::new("st-marys", "emergency");
//! let now = Utc::now();
//!
//! store.append(&key, now, "evt-1").unwrap();
//! store.append(&key, now, "evt-2").unwrap();
//!
//! let count = store
//!     .range_count(&key, now - Duration::minutes(240), now)
//!     .unwrap();
//! assert_eq!(count, 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default) - Serialize/Deserialize for all data model types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod clock;
mod error;
mod memory;
mod status;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryEventStore;
pub use status::{CapacityAnalysis, CapacityStatus, Thresholds, Trend};
pub use store::EventStore;
pub use types::{CapacityKey, Event, HistorySample};

/// Timestamp type used throughout the capacity model.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
