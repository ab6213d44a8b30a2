//! Ingestion statistics.

/// Counters kept by an [`IngestOrchestrator`](crate::IngestOrchestrator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Events that completed the capacity path.
    pub events_ingested: u64,
    /// Events rejected by validation.
    pub invalid_events: u64,
    /// Events whose capacity path failed.
    pub capacity_failures: u64,
    /// Ledger calls made.
    pub ledger_submissions: u64,
    /// Ledger calls that failed.
    pub ledger_failures: u64,
    /// Events with only one of the two accounts.
    pub ledger_skips: u64,
    /// Status changes pushed to the sink.
    pub status_publishes: u64,
    /// Sink calls that failed.
    pub sink_failures: u64,
}

impl IngestStats {
    /// Share of ledger calls that failed, as a percentage.
    pub fn ledger_failure_rate(&self) -> f64 {
        if self.ledger_submissions == 0 {
            0.0
        } else {
            (self.ledger_failures as f64 / self.ledger_submissions as f64) * 100.0
        }
    }
}

impl std::fmt::Display for IngestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ingestion Statistics:")?;
        writeln!(f, "  Events:          {}", self.events_ingested)?;
        writeln!(f, "  Invalid:         {}", self.invalid_events)?;
        writeln!(f, "  Capacity errors: {}", self.capacity_failures)?;
        writeln!(f, "  Ledger calls:    {}", self.ledger_submissions)?;
        writeln!(f, "  Ledger failures: {}", self.ledger_failures)?;
        writeln!(f, "  Failure rate:    {:.1}%", self.ledger_failure_rate())?;
        writeln!(f, "  Ledger skipped:  {}", self.ledger_skips)?;
        writeln!(f, "  Publishes:       {}", self.status_publishes)?;
        writeln!(f, "  Sink failures:   {}", self.sink_failures)?;
        Ok(())
    }
}
