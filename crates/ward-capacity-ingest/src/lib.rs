//! # ward-capacity-ingest
//!
//! Ingestion pipeline that turns an external transaction into a ledger
//! record and a ward capacity update.
//!
//! ## Flow
//!
//! ```text
//! IngestOrchestrator::ingest(event)
//!   ├── LedgerClient::record_transaction     (if both accounts present)
//!   ├── CapacityEngine::record_event
//!   ├── CapacityEngine::analyze
//!   ├── FacilityProfileSink::update_status   (on status transition)
//!   └── IngestionResult
//! ```
//!
//! The ledger step and the capacity path are independent side effects. A
//! ledger failure becomes [`LedgerOutcome::Failed`] on the result; a capacity
//! failure is returned as [`IngestError::Capacity`]. Sink failures are only
//! logged.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ward_capacity::InMemoryEventStore;
//! use ward_capacity_engine::CapacityEngine;
//! use ward_capacity_ingest::{IngestOrchestrator, IngestionEvent};
//!
//! let engine = Arc::new(CapacityEngine::new(Arc::new(InMemoryEventStore::new())));
//! let orchestrator = IngestOrchestrator::new(engine, ledger, profile_sink);
//!
//! let event = IngestionEvent::new("st-marys", "emergency", amount, "USD", "txn-001", now)
//!     .with_accounts("acct-patient", "acct-facility");
//! let result = orchestrator.ingest(&event)?;
//! println!("{} -> {} ({:?})", result.reference, result.status, result.ledger_transaction_id);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Runs the ledger call and the capacity path concurrently
//!   using rayon

#![warn(missing_docs)]

mod config;
mod error;
mod event;
mod ledger;
mod orchestrator;
mod result;
mod sink;
mod stats;

pub use config::{IngestConfig, IngestConfigBuilder, PublishTrigger};
pub use error::{IngestError, IngestResult, LedgerError, SinkError};
pub use event::IngestionEvent;
pub use ledger::{LedgerClient, LedgerReceipt, LedgerStatus, LedgerTransactionRequest};
pub use orchestrator::IngestOrchestrator;
pub use result::{IngestionResult, LedgerOutcome};
pub use sink::{FacilityProfileSink, FacilityStatusUpdate, WardUpdate};
pub use stats::IngestStats;
