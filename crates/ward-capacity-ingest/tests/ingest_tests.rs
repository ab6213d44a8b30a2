//! Integration tests for the ingestion orchestrator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use ward_capacity::{
    CapacityKey, CapacityStatus, EventStore, InMemoryEventStore, ManualClock, StoreError,
    StoreResult, Thresholds, Timestamp,
};
use ward_capacity_engine::{CapacityEngine, EngineConfig};
use ward_capacity_ingest::{
    FacilityProfileSink, FacilityStatusUpdate, IngestConfig, IngestError, IngestOrchestrator,
    IngestionEvent, LedgerClient, LedgerError, LedgerOutcome, LedgerReceipt, LedgerStatus,
    LedgerTransactionRequest, PublishTrigger, SinkError,
};

fn start() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

// =============================================================================
// Collaborators
// =============================================================================

/// Ledger that records each reference once and remembers every request.
#[derive(Default)]
struct DedupLedger {
    recorded: Mutex<HashMap<String, LedgerReceipt>>,
    requests: Mutex<Vec<LedgerTransactionRequest>>,
}

impl LedgerClient for DedupLedger {
    fn record_transaction(
        &self,
        request: &LedgerTransactionRequest,
    ) -> Result<LedgerReceipt, LedgerError> {
        self.requests.lock().push(request.clone());
        let mut recorded = self.recorded.lock();
        let next_id = format!("ltx-{}", recorded.len() + 1);
        let receipt = recorded
            .entry(request.reference.clone())
            .or_insert_with(|| LedgerReceipt {
                transaction_id: next_id,
                status: LedgerStatus::Queued,
            });
        Ok(receipt.clone())
    }
}

/// Ledger that is always down.
#[derive(Default)]
struct DownLedger {
    calls: Mutex<usize>,
}

impl LedgerClient for DownLedger {
    fn record_transaction(
        &self,
        _request: &LedgerTransactionRequest,
    ) -> Result<LedgerReceipt, LedgerError> {
        *self.calls.lock() += 1;
        Err(LedgerError::Unavailable("connection reset".to_string()))
    }
}

/// Sink that records updates and can be switched to failing.
#[derive(Default)]
struct RecordingSink {
    updates: Mutex<Vec<(String, FacilityStatusUpdate)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    fn statuses(&self) -> Vec<CapacityStatus> {
        self.updates
            .lock()
            .iter()
            .map(|(_, u)| u.ward_update.status)
            .collect()
    }
}

impl FacilityProfileSink for RecordingSink {
    fn update_status(
        &self,
        facility_id: &str,
        update: &FacilityStatusUpdate,
    ) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("503".to_string()));
        }
        self.updates
            .lock()
            .push((facility_id.to_string(), update.clone()));
        Ok(())
    }
}

/// Ledger that notes how many capacity events the store held when it was
/// called.
#[cfg(not(feature = "parallel"))]
struct StoreWatchingLedger {
    store: Arc<InMemoryEventStore>,
    seen: Mutex<Vec<usize>>,
}

#[cfg(not(feature = "parallel"))]
impl LedgerClient for StoreWatchingLedger {
    fn record_transaction(
        &self,
        request: &LedgerTransactionRequest,
    ) -> Result<LedgerReceipt, LedgerError> {
        self.seen.lock().push(self.store.event_len(&key()));
        Ok(LedgerReceipt {
            transaction_id: format!("ltx-{}", request.reference),
            status: LedgerStatus::Posted,
        })
    }
}

/// Sink that, on its first call, ingests one more event before recording
/// the update it was handed. Reproduces two overlapping ingests whose sink
/// calls land in the opposite order to their counts.
#[derive(Default)]
struct OverlappingSink {
    inner: RecordingSink,
    pending: Mutex<Option<(Arc<IngestOrchestrator>, IngestionEvent)>>,
}

impl FacilityProfileSink for OverlappingSink {
    fn update_status(
        &self,
        facility_id: &str,
        update: &FacilityStatusUpdate,
    ) -> Result<(), SinkError> {
        let pending = self.pending.lock().take();
        if let Some((orchestrator, event)) = pending {
            orchestrator.ingest(&event).unwrap();
        }
        self.inner.update_status(facility_id, update)
    }
}

struct UnreachableStore;

impl EventStore for UnreachableStore {
    fn append(&self, _: &CapacityKey, _: Timestamp, _: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn range_count(&self, _: &CapacityKey, _: Timestamp, _: Timestamp) -> StoreResult<u64> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn append_history_sample(&self, _: &CapacityKey, _: Timestamp, _: u64) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn history_values(&self, _: &CapacityKey) -> StoreResult<Vec<u64>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    clock: Arc<ManualClock>,
    ledger: Arc<DedupLedger>,
    sink: Arc<RecordingSink>,
    orchestrator: IngestOrchestrator,
}

/// Low default thresholds (busy 2, full 4) so transitions happen quickly.
fn fixture_with(config: IngestConfig) -> Fixture {
    let clock = Arc::new(ManualClock::new(start()));
    let engine_config = EngineConfig::builder()
        .with_default_thresholds(Thresholds::new(2.0, 4.0))
        .build();
    let engine = CapacityEngine::with_config(Arc::new(InMemoryEventStore::new()), engine_config)
        .unwrap()
        .with_clock(clock.clone());
    let ledger = Arc::new(DedupLedger::default());
    let sink = Arc::new(RecordingSink::default());
    let orchestrator =
        IngestOrchestrator::with_config(Arc::new(engine), ledger.clone(), sink.clone(), config);
    Fixture {
        clock,
        ledger,
        sink,
        orchestrator,
    }
}

fn fixture() -> Fixture {
    fixture_with(IngestConfig::default())
}

fn payment(reference: &str) -> IngestionEvent {
    IngestionEvent::new(
        "st-marys",
        "emergency",
        Decimal::new(12_550, 2),
        "USD",
        reference,
        start(),
    )
    .with_accounts("acct-patient", "acct-facility")
}

fn key() -> CapacityKey {
    CapacityKey::new("st-marys", "emergency")
}

// =============================================================================
// Ledger coupling
// =============================================================================

#[test]
fn test_ingest_records_ledger_and_capacity() {
    let f = fixture();
    let result = f.orchestrator.ingest(&payment("txn-001")).unwrap();

    assert_eq!(result.capacity_count, 1);
    assert_eq!(result.status, CapacityStatus::Available);
    assert_eq!(result.thresholds, Thresholds::new(2.0, 4.0));
    assert_eq!(result.reference, "txn-001");
    assert_eq!(result.ledger_transaction_id.as_deref(), Some("ltx-1"));
    assert!(matches!(
        result.ledger,
        LedgerOutcome::Recorded {
            status: LedgerStatus::Queued,
            ..
        }
    ));
    assert!(result.warning().is_none());

    let requests = f.ledger.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, Decimal::new(12_550, 2));
    assert_eq!(requests[0].source, "acct-patient");
    assert_eq!(requests[0].destination, "acct-facility");
}

#[test]
fn test_ledger_failure_still_counts() {
    let clock = Arc::new(ManualClock::new(start()));
    let engine = CapacityEngine::new(Arc::new(InMemoryEventStore::new())).with_clock(clock);
    let ledger = Arc::new(DownLedger::default());
    let orchestrator = IngestOrchestrator::new(
        Arc::new(engine),
        ledger.clone(),
        Arc::new(RecordingSink::default()),
    );

    let first = orchestrator.ingest(&payment("txn-001")).unwrap();
    let second = orchestrator.ingest(&payment("txn-002")).unwrap();

    assert_eq!(first.capacity_count, 1);
    assert_eq!(second.capacity_count, 2);
    assert!(second.ledger.is_failure());
    assert!(second.ledger_transaction_id.is_none());
    assert_eq!(second.warning(), Some("ledger unavailable: connection reset"));

    let stats = orchestrator.stats();
    assert_eq!(*ledger.calls.lock(), 2);
    assert_eq!(stats.ledger_submissions, 2);
    assert_eq!(stats.ledger_failures, 2);
    assert_eq!(stats.events_ingested, 2);
}

#[test]
fn test_replay_passes_reference_unchanged() {
    let f = fixture();
    let event = payment("txn-replayed");

    let first = f.orchestrator.ingest(&event).unwrap();
    let second = f.orchestrator.ingest(&event).unwrap();

    // The ledger deduplicates; capacity counting is at-least-once.
    assert_eq!(first.ledger_transaction_id, second.ledger_transaction_id);
    assert_eq!(f.ledger.recorded.lock().len(), 1);
    assert_eq!(second.capacity_count, 2);

    let requests = f.ledger.requests.lock();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.reference == "txn-replayed"));
    assert_eq!(requests[0], requests[1]);
}

#[test]
fn test_no_accounts_skips_ledger_silently() {
    let f = fixture();
    let event = IngestionEvent::new(
        "st-marys",
        "emergency",
        Decimal::ZERO,
        "USD",
        "walk-in-1",
        start(),
    );

    let result = f.orchestrator.ingest(&event).unwrap();
    assert_eq!(result.ledger, LedgerOutcome::NotRequested);
    assert!(result.warning().is_none());
    assert_eq!(result.capacity_count, 1);
    assert!(f.ledger.requests.lock().is_empty());
}

#[test]
fn test_one_account_skips_ledger_with_warning() {
    let f = fixture();
    let mut event = payment("txn-half");
    event.destination_account = None;

    let result = f.orchestrator.ingest(&event).unwrap();
    assert_eq!(
        result.ledger,
        LedgerOutcome::Skipped {
            reason: "destination account missing".to_string()
        }
    );
    assert_eq!(result.warning(), Some("destination account missing"));
    assert_eq!(result.capacity_count, 1);
    assert!(f.ledger.requests.lock().is_empty());
    assert_eq!(f.orchestrator.stats().ledger_skips, 1);
}

#[cfg(not(feature = "parallel"))]
#[test]
fn test_capacity_recorded_before_ledger_call() {
    let store = Arc::new(InMemoryEventStore::new());
    let engine = CapacityEngine::new(store.clone())
        .with_clock(Arc::new(ManualClock::new(start())));
    let ledger = Arc::new(StoreWatchingLedger {
        store: store.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let orchestrator = IngestOrchestrator::new(
        Arc::new(engine),
        ledger.clone(),
        Arc::new(RecordingSink::default()),
    );

    orchestrator.ingest(&payment("txn-001")).unwrap();
    orchestrator.ingest(&payment("txn-002")).unwrap();

    assert_eq!(*ledger.seen.lock(), vec![1, 2]);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_ledger_failure_still_counts() {
    let clock = Arc::new(ManualClock::new(start()));
    let engine = CapacityEngine::new(Arc::new(InMemoryEventStore::new())).with_clock(clock);
    let ledger = Arc::new(DownLedger::default());
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = IngestOrchestrator::new(Arc::new(engine), ledger.clone(), sink.clone());

    let results: Vec<_> = (0..3)
        .map(|i| orchestrator.ingest(&payment(&format!("txn-{i}"))).unwrap())
        .collect();

    let counts: Vec<u64> = results.iter().map(|r| r.capacity_count).collect();
    assert_eq!(counts, vec![1, 2, 3]);
    assert!(results.iter().all(|r| r.ledger.is_failure()));
    assert!(results.iter().all(|r| r.ledger_transaction_id.is_none()));
    assert_eq!(*ledger.calls.lock(), 3);
    assert_eq!(sink.statuses(), vec![CapacityStatus::Available]);

    let stats = orchestrator.stats();
    assert_eq!(stats.ledger_failures, 3);
    assert_eq!(stats.events_ingested, 3);
    assert_eq!(stats.capacity_failures, 0);
}

// =============================================================================
// Status publishing
// =============================================================================

fn drive_up_and_down(f: &Fixture) -> Vec<bool> {
    let mut published = Vec::new();
    for i in 0..4 {
        let result = f.orchestrator.ingest(&payment(&format!("txn-{i}"))).unwrap();
        published.push(result.status_published);
    }
    // Everything falls out of the window.
    f.clock.advance(Duration::minutes(241));
    let result = f.orchestrator.ingest(&payment("txn-late")).unwrap();
    assert_eq!(result.capacity_count, 1);
    published.push(result.status_published);
    published
}

#[test]
fn test_publishes_on_any_transition() {
    let f = fixture();
    let published = drive_up_and_down(&f);

    assert_eq!(published, vec![true, true, false, true, true]);
    assert_eq!(
        f.sink.statuses(),
        vec![
            CapacityStatus::Available,
            CapacityStatus::Busy,
            CapacityStatus::Full,
            CapacityStatus::Available,
        ]
    );
    assert_eq!(f.orchestrator.stats().status_publishes, 4);
    assert_eq!(f.orchestrator.last_status(&key()), Some(CapacityStatus::Available));
}

#[test]
fn test_escalation_only_skips_de_escalation() {
    let f = fixture_with(
        IngestConfig::builder()
            .with_publish_trigger(PublishTrigger::EscalationOnly)
            .build(),
    );
    let published = drive_up_and_down(&f);

    assert_eq!(published, vec![true, true, false, true, false]);
    assert_eq!(
        f.sink.statuses(),
        vec![
            CapacityStatus::Available,
            CapacityStatus::Busy,
            CapacityStatus::Full,
        ]
    );
    // The de-escalation is still tracked.
    assert_eq!(f.orchestrator.last_status(&key()), Some(CapacityStatus::Available));
}

#[test]
fn test_update_payload() {
    let f = fixture();
    f.orchestrator.ingest(&payment("txn-1")).unwrap();

    let updates = f.sink.updates.lock();
    let (facility_id, update) = &updates[0];
    assert_eq!(facility_id, "st-marys");
    assert_eq!(update.ward_update.ward_name, "emergency");
    assert_eq!(update.ward_update.count, 1);
    assert_eq!(update.ward_update.thresholds, Thresholds::new(2.0, 4.0));
    assert_eq!(update.ward_update.observed_at, start());
}

#[test]
fn test_sink_failure_is_not_propagated_and_retried() {
    let f = fixture();
    f.sink.failing.store(true, Ordering::SeqCst);

    let result = f.orchestrator.ingest(&payment("txn-1")).unwrap();
    assert!(!result.status_published);
    assert_eq!(result.capacity_count, 1);
    assert_eq!(f.orchestrator.stats().sink_failures, 1);
    assert_eq!(f.orchestrator.last_status(&key()), None);

    f.sink.failing.store(false, Ordering::SeqCst);
    f.clock.advance(Duration::minutes(241));

    // Same status as the failed publish, so only a retry can explain this.
    let result = f.orchestrator.ingest(&payment("txn-2")).unwrap();
    assert_eq!(result.status, CapacityStatus::Available);
    assert!(result.status_published);
    assert_eq!(f.sink.statuses(), vec![CapacityStatus::Available]);
}

#[test]
fn test_out_of_order_publish_converges_on_next_transition() {
    let clock = Arc::new(ManualClock::new(start()));
    let engine_config = EngineConfig::builder()
        .with_default_thresholds(Thresholds::new(2.0, 4.0))
        .build();
    let engine = CapacityEngine::with_config(Arc::new(InMemoryEventStore::new()), engine_config)
        .unwrap()
        .with_clock(clock);
    let sink = Arc::new(OverlappingSink::default());
    let orchestrator = Arc::new(IngestOrchestrator::new(
        Arc::new(engine),
        Arc::new(DedupLedger::default()),
        sink.clone(),
    ));
    *sink.pending.lock() = Some((Arc::clone(&orchestrator), payment("txn-2")));

    // Count 2 (busy) reaches the sink before count 1 (available).
    orchestrator.ingest(&payment("txn-1")).unwrap();
    assert_eq!(
        sink.inner.statuses(),
        vec![CapacityStatus::Busy, CapacityStatus::Available]
    );
    assert_eq!(orchestrator.last_status(&key()), Some(CapacityStatus::Busy));

    // Still busy: nothing to publish, the sink stays stale.
    let third = orchestrator.ingest(&payment("txn-3")).unwrap();
    assert_eq!(third.status, CapacityStatus::Busy);
    assert!(!third.status_published);

    let fourth = orchestrator.ingest(&payment("txn-4")).unwrap();
    assert_eq!(fourth.status, CapacityStatus::Full);
    assert!(fourth.status_published);
    assert_eq!(sink.inner.statuses().last(), Some(&CapacityStatus::Full));
}

#[test]
fn test_wards_track_status_separately() {
    let f = fixture();
    f.orchestrator.ingest(&payment("txn-1")).unwrap();

    let mut maternity = payment("txn-2");
    maternity.ward_id = "maternity".to_string();
    let result = f.orchestrator.ingest(&maternity).unwrap();

    assert_eq!(result.capacity_count, 1);
    assert!(result.status_published);
    assert_eq!(f.sink.statuses().len(), 2);
}

// =============================================================================
// Failures and validation
// =============================================================================

#[test]
fn test_capacity_failure_is_fatal_but_ledger_attempted() {
    let ledger = Arc::new(DedupLedger::default());
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = IngestOrchestrator::new(
        Arc::new(CapacityEngine::new(Arc::new(UnreachableStore))),
        ledger.clone(),
        sink.clone(),
    );

    let err = orchestrator.ingest(&payment("txn-1")).unwrap_err();
    assert!(matches!(err, IngestError::Capacity(_)));
    assert_eq!(ledger.requests.lock().len(), 1);
    assert!(sink.updates.lock().is_empty());

    let stats = orchestrator.stats();
    assert_eq!(stats.capacity_failures, 1);
    assert_eq!(stats.events_ingested, 0);
}

#[test]
fn test_invalid_event_has_no_side_effects() {
    let f = fixture();
    let mut event = payment("txn-1");
    event.facility_id = String::new();

    let err = f.orchestrator.ingest(&event).unwrap_err();
    assert!(matches!(err, IngestError::InvalidEvent(_)));
    assert!(f.ledger.requests.lock().is_empty());
    assert!(f.sink.updates.lock().is_empty());
    assert_eq!(f.orchestrator.engine().current_count(&key()).unwrap(), 0);
    assert_eq!(f.orchestrator.stats().invalid_events, 1);
}

// =============================================================================
// Concurrency and stats
// =============================================================================

#[test]
fn test_concurrent_ingestion_same_ward() {
    let f = fixture();
    let orchestrator = Arc::new(f.orchestrator);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let orchestrator = Arc::clone(&orchestrator);
            std::thread::spawn(move || {
                for i in 0..25 {
                    orchestrator
                        .ingest(&payment(&format!("txn-{t}-{i}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(orchestrator.engine().current_count(&key()).unwrap(), 200);
    assert_eq!(orchestrator.stats().events_ingested, 200);
    assert_eq!(f.ledger.recorded.lock().len(), 200);
}

#[test]
fn test_reset_stats() {
    let f = fixture();
    f.orchestrator.ingest(&payment("txn-1")).unwrap();
    assert!(f.orchestrator.stats().to_string().contains("Events:          1"));

    f.orchestrator.reset_stats();
    assert_eq!(f.orchestrator.stats().events_ingested, 0);
}
