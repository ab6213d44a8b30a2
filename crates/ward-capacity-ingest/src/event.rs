//! Incoming ingestion events.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ward_capacity::{CapacityKey, Timestamp};

use crate::error::{IngestError, IngestResult};

/// An external transaction that both moves money and signals ward load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionEvent {
    /// Facility the transaction belongs to.
    pub facility_id: String,
    /// Ward within the facility.
    pub ward_id: String,
    /// Monetary amount.
    pub transaction_amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Idempotency key, passed to the ledger unchanged.
    pub reference: String,
    /// Debited account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,
    /// Credited account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account: Option<String>,
    /// When the transaction happened upstream.
    pub timestamp: Timestamp,
    /// Free-text ledger description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IngestionEvent {
    /// Creates an event with no ledger accounts.
    pub fn new(
        facility_id: impl Into<String>,
        ward_id: impl Into<String>,
        transaction_amount: Decimal,
        currency: impl Into<String>,
        reference: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            facility_id: facility_id.into(),
            ward_id: ward_id.into(),
            transaction_amount,
            currency: currency.into(),
            reference: reference.into(),
            source_account: None,
            destination_account: None,
            timestamp,
            description: None,
        }
    }

    /// Sets both ledger accounts.
    pub fn with_accounts(
        mut self,
        source_account: impl Into<String>,
        destination_account: impl Into<String>,
    ) -> Self {
        self.source_account = Some(source_account.into());
        self.destination_account = Some(destination_account.into());
        self
    }

    /// Sets the ledger description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Capacity key of the event.
    pub fn key(&self) -> CapacityKey {
        CapacityKey::new(self.facility_id.clone(), self.ward_id.clone())
    }

    /// Source account, treating blank values as absent.
    pub fn source(&self) -> Option<&str> {
        non_blank(self.source_account.as_deref())
    }

    /// Destination account, treating blank values as absent.
    pub fn destination(&self) -> Option<&str> {
        non_blank(self.destination_account.as_deref())
    }

    /// Rejects events whose identifiers are blank.
    pub fn validate(&self) -> IngestResult<()> {
        for (field, value) in [
            ("facilityId", &self.facility_id),
            ("wardId", &self.ward_id),
            ("reference", &self.reference),
        ] {
            if value.trim().is_empty() {
                return Err(IngestError::InvalidEvent(format!("{field} is empty")));
            }
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event() -> IngestionEvent {
        IngestionEvent::new(
            "st-marys",
            "emergency",
            Decimal::new(12_550, 2),
            "USD",
            "txn-001",
            Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_key() {
        assert_eq!(event().key(), CapacityKey::new("st-marys", "emergency"));
    }

    #[test]
    fn test_validate() {
        assert!(event().validate().is_ok());

        let mut missing_ward = event();
        missing_ward.ward_id = "  ".to_string();
        match missing_ward.validate() {
            Err(IngestError::InvalidEvent(msg)) => assert_eq!(msg, "wardId is empty"),
            other => panic!("unexpected: {other:?}"),
        }

        let mut missing_reference = event();
        missing_reference.reference.clear();
        assert!(missing_reference.validate().is_err());
    }

    #[test]
    fn test_blank_accounts_are_absent() {
        let e = event().with_accounts("acct-patient", " ");
        assert_eq!(e.source(), Some("acct-patient"));
        assert_eq!(e.destination(), None);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "facilityId": "st-marys",
            "wardId": "emergency",
            "transactionAmount": "125.50",
            "currency": "USD",
            "reference": "txn-001",
            "sourceAccount": "acct-patient",
            "destinationAccount": "acct-facility",
            "timestamp": "2024-06-03T09:00:00Z"
        }"#;
        let parsed: IngestionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            event().with_accounts("acct-patient", "acct-facility")
        );
    }
}
