//! Ledger collaborator interface.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::event::IngestionEvent;

/// External financial-transaction system.
///
/// `reference` is the idempotency key: submitting the same reference twice
/// must not record the transaction twice. Implementations may queue the
/// transaction and answer before it is final.
pub trait LedgerClient: Send + Sync {
    /// Submits a transaction.
    fn record_transaction(
        &self,
        request: &LedgerTransactionRequest,
    ) -> Result<LedgerReceipt, LedgerError>;
}

impl<L: LedgerClient + ?Sized> LedgerClient for Arc<L> {
    fn record_transaction(
        &self,
        request: &LedgerTransactionRequest,
    ) -> Result<LedgerReceipt, LedgerError> {
        (**self).record_transaction(request)
    }
}

/// Transaction submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransactionRequest {
    /// Amount moved.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Debited account.
    pub source: String,
    /// Credited account.
    pub destination: String,
    /// Idempotency key.
    pub reference: String,
    /// Free-text description.
    pub description: String,
}

impl LedgerTransactionRequest {
    /// Builds the request for an event, or `None` unless both accounts are set.
    pub fn from_event(event: &IngestionEvent) -> Option<Self> {
        let source = event.source()?;
        let destination = event.destination()?;
        let description = event.description.clone().unwrap_or_else(|| {
            format!("ward capacity event {}/{}", event.facility_id, event.ward_id)
        });
        Some(Self {
            amount: event.transaction_amount,
            currency: event.currency.clone(),
            source: source.to_string(),
            destination: destination.to_string(),
            reference: event.reference.clone(),
            description,
        })
    }
}

/// Ledger acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    /// Ledger-assigned transaction id.
    pub transaction_id: String,
    /// Posting state at the time of the answer.
    pub status: LedgerStatus,
}

/// Posting state of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    /// Accepted, not yet final.
    Queued,
    /// Final.
    Posted,
}
