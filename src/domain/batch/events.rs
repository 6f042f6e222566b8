use serde::{Deserialize, Serialize};

use crate::domain::validation::Verdict;
use crate::event_sourcing::core::DomainEvent;
use super::value_objects::{CollectionEvent, ProcessingStep, QualityTest};

// ============================================================================
// Batch Events - Domain Events for Batch Aggregate
// ============================================================================
//
// Each event carries the verdict the Validation Engine returned when it was
// admitted, so a replayed stream shows why every flag has the value it has.
//
// ============================================================================

/// Batch Event - Union type for all batch events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BatchEvent {
    Collected(BatchCollected),
    QualityTested(QualityTestRecorded),
    ProcessingRecorded(ProcessingStepRecorded),
}

impl DomainEvent for BatchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BatchEvent::Collected(_) => "BatchCollected",
            BatchEvent::QualityTested(_) => "QualityTestRecorded",
            BatchEvent::ProcessingRecorded(_) => "ProcessingStepRecorded",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Batch Collected - first event of a stream, or a re-collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCollected {
    pub collection: CollectionEvent,
    pub sustainability_score: u8,
    pub verdict: Verdict,
}

/// Quality Test Recorded - lab result attached to the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityTestRecorded {
    pub test: QualityTest,
    pub verdict: Verdict,
}

/// Processing Step Recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStepRecorded {
    pub step: ProcessingStep,
    pub verdict: Verdict,
}
