//! Configuration types for the ingestion orchestrator.

use serde::{Deserialize, Serialize};
use ward_capacity::CapacityStatus;

/// Configuration for the ingestion orchestrator.
///
/// # Example
///
/// ```rust
/// use ward_capacity_ingest::{IngestConfig, PublishTrigger};
///
/// let config = IngestConfig::builder()
///     .with_publish_trigger(PublishTrigger::EscalationOnly)
///     .build();
/// assert_eq!(config.publish_trigger, PublishTrigger::EscalationOnly);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestConfig {
    /// Which status changes are pushed to the facility profile sink.
    pub publish_trigger: PublishTrigger,
}

impl IngestConfig {
    /// Creates a new builder for IngestConfig.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }
}

/// Builder for IngestConfig.
#[derive(Debug, Clone, Default)]
pub struct IngestConfigBuilder {
    publish_trigger: PublishTrigger,
}

impl IngestConfigBuilder {
    /// Sets the publish trigger.
    pub fn with_publish_trigger(mut self, trigger: PublishTrigger) -> Self {
        self.publish_trigger = trigger;
        self
    }

    /// Builds the IngestConfig.
    pub fn build(self) -> IngestConfig {
        IngestConfig {
            publish_trigger: self.publish_trigger,
        }
    }
}

/// When a ward status change is published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PublishTrigger {
    /// Every change, including de-escalation.
    #[default]
    AnyTransition,
    /// Only moves to a more congested status.
    EscalationOnly,
}

impl PublishTrigger {
    /// Decides whether moving from `previous` to `current` is published.
    ///
    /// `None` means the key has not been observed yet; the first observation
    /// always counts as a transition.
    pub fn should_publish(&self, previous: Option<CapacityStatus>, current: CapacityStatus) -> bool {
        match previous {
            None => true,
            Some(prev) if prev == current => false,
            Some(prev) => match self {
                PublishTrigger::AnyTransition => true,
                PublishTrigger::EscalationOnly => current > prev,
            },
        }
    }
}
