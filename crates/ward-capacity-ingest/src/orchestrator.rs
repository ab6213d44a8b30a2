//! Ingestion orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};
use ward_capacity::{CapacityAnalysis, CapacityKey, CapacityStatus};
use ward_capacity_engine::{CapacityEngine, CapacityResult};

use crate::config::IngestConfig;
use crate::error::IngestResult;
use crate::event::IngestionEvent;
use crate::ledger::{LedgerClient, LedgerTransactionRequest};
use crate::result::{IngestionResult, LedgerOutcome};
use crate::sink::{FacilityProfileSink, FacilityStatusUpdate};
use crate::stats::IngestStats;

/// Couples each ingested transaction to a ledger record and a capacity update.
///
/// Per event the orchestrator submits the ledger transaction (when both
/// accounts are present), records the event with the capacity engine,
/// analyses the ward and, when its status changed, notifies the facility
/// profile sink. The ledger and the capacity path are independent: a ledger
/// failure is attached to the result, a capacity failure fails the call.
///
/// The only in-process state is the last observed status per key, used to
/// detect transitions, and the statistics counters.
pub struct IngestOrchestrator {
    engine: Arc<CapacityEngine>,
    ledger: Arc<dyn LedgerClient>,
    sink: Arc<dyn FacilityProfileSink>,
    config: IngestConfig,
    last_status: RwLock<HashMap<CapacityKey, CapacityStatus>>,
    stats: RwLock<IngestStats>,
}

impl IngestOrchestrator {
    /// Creates an orchestrator with default configuration.
    pub fn new(
        engine: Arc<CapacityEngine>,
        ledger: Arc<dyn LedgerClient>,
        sink: Arc<dyn FacilityProfileSink>,
    ) -> Self {
        Self::with_config(engine, ledger, sink, IngestConfig::default())
    }

    /// Creates an orchestrator with custom configuration.
    pub fn with_config(
        engine: Arc<CapacityEngine>,
        ledger: Arc<dyn LedgerClient>,
        sink: Arc<dyn FacilityProfileSink>,
        config: IngestConfig,
    ) -> Self {
        Self {
            engine,
            ledger,
            sink,
            config,
            last_status: RwLock::new(HashMap::new()),
            stats: RwLock::new(IngestStats::default()),
        }
    }

    /// Returns the capacity engine.
    pub fn engine(&self) -> &CapacityEngine {
        &self.engine
    }

    /// Returns a reference to the orchestrator configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Last status observed for `key` by this orchestrator.
    pub fn last_status(&self, key: &CapacityKey) -> Option<CapacityStatus> {
        self.last_status.read().get(key).copied()
    }

    /// Ingests one event.
    ///
    /// Records the event with the capacity engine, analyses the ward,
    /// submits the ledger transaction when both accounts are present, and
    /// publishes the ward status if the trigger policy asks for it.
    ///
    /// # Arguments
    ///
    /// * `event` - The incoming transaction. Its `reference` is passed to the
    ///   ledger unchanged, so replays are deduplicated by the ledger.
    ///
    /// # Returns
    ///
    /// The consolidated [`IngestionResult`]. A ledger failure or a skipped
    /// ledger step shows up as a warning on it, not as an error.
    ///
    /// # Errors
    ///
    /// `IngestError::InvalidEvent` if an identifier is blank (nothing is
    /// recorded), `IngestError::Capacity` if the capacity path failed. Ledger
    /// and sink failures never produce an error.
    pub fn ingest(&self, event: &IngestionEvent) -> IngestResult<IngestionResult> {
        if let Err(err) = event.validate() {
            self.stats.write().invalid_events += 1;
            return Err(err);
        }

        let key = event.key();
        let (ledger, capacity) = self.run_side_effects(event, &key);

        let analysis = match capacity {
            Ok(analysis) => analysis,
            Err(err) => {
                error!(
                    facility_id = %key.facility_id,
                    ward_id = %key.ward_id,
                    reference = %event.reference,
                    error = %err,
                    "capacity update failed"
                );
                self.stats.write().capacity_failures += 1;
                return Err(err.into());
            }
        };

        let published = self.publish_if_changed(&key, event, &analysis);
        self.stats.write().events_ingested += 1;

        Ok(IngestionResult::new(
            analysis,
            ledger,
            event.reference.clone(),
            published,
        ))
    }

    /// Runs the ledger step and the capacity path; both always run.
    #[cfg(feature = "parallel")]
    fn run_side_effects(
        &self,
        event: &IngestionEvent,
        key: &CapacityKey,
    ) -> (LedgerOutcome, CapacityResult<CapacityAnalysis>) {
        rayon::join(|| self.submit_ledger(event), || self.record_and_analyze(key))
    }

    /// Runs the capacity path, then the ledger step; both always run.
    ///
    /// The capacity event is recorded before the ledger is contacted, so a
    /// slow or queued ledger never delays it.
    #[cfg(not(feature = "parallel"))]
    fn run_side_effects(
        &self,
        event: &IngestionEvent,
        key: &CapacityKey,
    ) -> (LedgerOutcome, CapacityResult<CapacityAnalysis>) {
        let capacity = self.record_and_analyze(key);
        (self.submit_ledger(event), capacity)
    }

    fn record_and_analyze(&self, key: &CapacityKey) -> CapacityResult<CapacityAnalysis> {
        self.engine.record_event(key)?;
        self.engine.analyze(key)
    }

    fn submit_ledger(&self, event: &IngestionEvent) -> LedgerOutcome {
        let request = match LedgerTransactionRequest::from_event(event) {
            Some(request) => request,
            None if event.source().is_none() && event.destination().is_none() => {
                return LedgerOutcome::NotRequested;
            }
            None => {
                let missing = if event.source().is_none() {
                    "source"
                } else {
                    "destination"
                };
                warn!(
                    facility_id = %event.facility_id,
                    reference = %event.reference,
                    missing,
                    "ledger skipped: partial account data"
                );
                self.stats.write().ledger_skips += 1;
                return LedgerOutcome::Skipped {
                    reason: format!("{missing} account missing"),
                };
            }
        };

        self.stats.write().ledger_submissions += 1;
        match self.ledger.record_transaction(&request) {
            Ok(receipt) => {
                debug!(
                    reference = %request.reference,
                    transaction_id = %receipt.transaction_id,
                    status = ?receipt.status,
                    "ledger transaction recorded"
                );
                LedgerOutcome::Recorded {
                    transaction_id: receipt.transaction_id,
                    status: receipt.status,
                }
            }
            Err(err) => {
                warn!(
                    reference = %request.reference,
                    error = %err,
                    "ledger transaction failed"
                );
                self.stats.write().ledger_failures += 1;
                LedgerOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Pushes the ward status to the sink if the trigger policy says so.
    ///
    /// On sink failure the previous status is restored so the next event for
    /// the key tries again.
    ///
    /// Ordering is eventually consistent. Two concurrent ingests for the same
    /// key record their statuses here in one order but their sink calls can
    /// complete in the other, so the sink may end up holding an older status
    /// (`available` after `busy`) than the one recorded for the key. It is
    /// corrected by the next publish for the key, which happens as soon as
    /// the analysed status differs from the recorded one.
    fn publish_if_changed(
        &self,
        key: &CapacityKey,
        event: &IngestionEvent,
        analysis: &CapacityAnalysis,
    ) -> bool {
        let previous = self.last_status.write().insert(key.clone(), analysis.status);
        if !self
            .config
            .publish_trigger
            .should_publish(previous, analysis.status)
        {
            return false;
        }

        let update = FacilityStatusUpdate::from_analysis(&key.ward_id, analysis, event.timestamp);
        match self.sink.update_status(&key.facility_id, &update) {
            Ok(()) => {
                info!(
                    facility_id = %key.facility_id,
                    ward_id = %key.ward_id,
                    previous = ?previous,
                    status = %analysis.status,
                    count = analysis.count,
                    "published ward status"
                );
                self.stats.write().status_publishes += 1;
                true
            }
            Err(err) => {
                warn!(
                    facility_id = %key.facility_id,
                    ward_id = %key.ward_id,
                    error = %err,
                    "facility profile update failed"
                );
                self.stats.write().sink_failures += 1;
                let mut last = self.last_status.write();
                if last.get(key) == Some(&analysis.status) {
                    match previous {
                        Some(prev) => {
                            last.insert(key.clone(), prev);
                        }
                        None => {
                            last.remove(key);
                        }
                    }
                }
                false
            }
        }
    }

    /// Returns ingestion statistics.
    pub fn stats(&self) -> IngestStats {
        self.stats.read().clone()
    }

    /// Resets statistics.
    pub fn reset_stats(&self) {
        *self.stats.write() = IngestStats::default();
    }
}

impl std::fmt::Debug for IngestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestOrchestrator")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("tracked_keys", &self.last_status.read().len())
            .finish()
    }
}
