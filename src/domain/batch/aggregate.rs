use serde::{Deserialize, Serialize};
use chrono::{DateTime, Datelike, Utc};

use crate::event_sourcing::core::{Aggregate, EventEnvelope};
use super::value_objects::{BatchStatus, CollectionEvent, ProcessingStep, QualityTest};
use super::events::*;
use super::commands::{BatchCommand, RecollectionPolicy, RejectedQualityPolicy};
use super::errors::BatchError;

// ============================================================================
// Batch Aggregate - Domain Logic
// ============================================================================
//
// Lifecycle: collected → tested → processed (→ manufactured → shipped)
//
// `manufactured` is never stored; it is how a processed batch with a
// certified test is displayed. Nothing transitions into `shipped`.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAggregate {
    // Identity
    pub id: String,
    pub version: i64,
    pub species: String,

    // Current State (derived from events)
    pub status: BatchStatus,
    pub current_location: String,
    pub sustainability_score: u8,
    pub qr_code: String,

    pub collection_event: Option<CollectionEvent>,
    pub quality_tests: Vec<QualityTest>,
    pub processing_steps: Vec<ProcessingStep>,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The batch as seen through the query interface
pub type Batch = BatchAggregate;

impl BatchAggregate {
    pub fn has_certified_test(&self) -> bool {
        self.quality_tests.iter().any(|t| t.certified)
    }

    pub fn display_status(&self) -> BatchStatus {
        match self.status {
            BatchStatus::Processed if self.has_certified_test() => BatchStatus::Manufactured,
            status => status,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.collection_event.as_ref().is_some_and(|c| c.verified)
    }

    fn collect(state: Option<&Self>, collected: BatchCollected, policy: RecollectionPolicy) -> Result<Vec<BatchEvent>, BatchError> {
        if let Some(batch) = state {
            if batch.species != collected.collection.species {
                return Err(BatchError::malformed(format!(
                    "batch {} is {}, cannot re-collect as {}",
                    batch.id, batch.species, collected.collection.species
                )));
            }
            if policy == RecollectionPolicy::Reject {
                return Err(BatchError::AlreadyCollected(batch.id.clone()));
            }
        }
        Ok(vec![BatchEvent::Collected(collected)])
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for BatchAggregate {
    type Event = BatchEvent;
    type Command = BatchCommand;
    type Error = BatchError;

    fn apply_first_event(envelope: &EventEnvelope<Self::Event>) -> Result<Self, Self::Error> {
        match &envelope.event_data {
            BatchEvent::Collected(e) => Ok(Self {
                id: envelope.aggregate_id.clone(),
                version: envelope.sequence_number,
                species: e.collection.species.clone(),
                status: BatchStatus::Collected,
                current_location: e.collection.location.clone(),
                sustainability_score: e.sustainability_score,
                qr_code: format!("QR-{}-{}", envelope.aggregate_id, e.collection.timestamp.year()),
                collection_event: Some(e.collection.clone()),
                quality_tests: Vec::new(),
                processing_steps: Vec::new(),
                created_at: envelope.timestamp,
                updated_at: envelope.timestamp,
            }),
            _ => Err(BatchError::NotInitialized),
        }
    }

    fn apply_event(&mut self, envelope: &EventEnvelope<Self::Event>) -> Result<(), Self::Error> {
        match &envelope.event_data {
            BatchEvent::Collected(e) => {
                if e.collection.species != self.species {
                    return Err(BatchError::malformed(format!(
                        "event {} of batch {} collects {}, batch is {}",
                        envelope.sequence_number, self.id, e.collection.species, self.species
                    )));
                }
                // Re-collection: identity, score and QR label stay as created
                self.collection_event = Some(e.collection.clone());
                self.status = BatchStatus::Collected;
            }
            BatchEvent::QualityTested(e) => {
                self.quality_tests.push(e.test.clone());
                self.status = BatchStatus::Tested;
            }
            BatchEvent::ProcessingRecorded(e) => {
                self.current_location = e.step.location.clone();
                self.processing_steps.push(e.step.clone());
                self.status = BatchStatus::Processed;
            }
        }

        self.version = envelope.sequence_number;
        self.updated_at = envelope.timestamp;
        Ok(())
    }

    fn handle_command(state: Option<&Self>, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            BatchCommand::RecordCollection { collection, sustainability_score, verdict, policy } => {
                let mut collection = collection.clone();
                collection.verified = verdict.accepted;

                Self::collect(
                    state,
                    BatchCollected {
                        collection,
                        sustainability_score: *sustainability_score,
                        verdict: verdict.clone(),
                    },
                    *policy,
                )
            }

            BatchCommand::RecordQualityTest { test, verdict, policy } => {
                if state.is_none() {
                    return Err(BatchError::NotInitialized);
                }

                let mut test = test.clone();
                if !verdict.accepted {
                    match (policy, &verdict.reason) {
                        (RejectedQualityPolicy::RecordForAudit, _) => test.certified = false,
                        (RejectedQualityPolicy::Reject, Some(reason)) => {
                            return Err(BatchError::ValidationRejected(reason.clone()))
                        }
                        (RejectedQualityPolicy::Reject, None) => {
                            return Err(BatchError::malformed("rejected verdict without a reason"))
                        }
                    }
                }

                Ok(vec![BatchEvent::QualityTested(QualityTestRecorded {
                    test,
                    verdict: verdict.clone(),
                })])
            }

            BatchCommand::RecordProcessingStep { step, verdict } => {
                if state.is_none() {
                    return Err(BatchError::NotInitialized);
                }

                Ok(vec![BatchEvent::ProcessingRecorded(ProcessingStepRecorded {
                    step: step.clone(),
                    verdict: verdict.clone(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
