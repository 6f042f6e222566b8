use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope};
use crate::event_sourcing::store::EventStore;

use super::aggregate::BatchAggregate;
use super::commands::BatchCommand;
use super::errors::BatchError;
use super::events::BatchEvent;

// ============================================================================
// Batch Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store
//
// The stream lock is held from load to append, so commands on the same
// batch are applied one at a time and always see the latest state.
//
// ============================================================================

pub struct BatchCommandHandler {
    event_store: Arc<EventStore<BatchEvent>>,
}

/// Result of a successful command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub batch: BatchAggregate,
    pub event_types: Vec<&'static str>,
}

impl BatchCommandHandler {
    pub fn new(event_store: Arc<EventStore<BatchEvent>>) -> Self {
        Self { event_store }
    }

    /// Handle a command and persist resulting events
    pub async fn handle(
        &self,
        batch_id: &str,
        command: BatchCommand,
        correlation_id: Uuid,
        actor: &str,
    ) -> Result<CommandOutcome, BatchError> {
        // Only a collection may start a stream
        let mut stream = match &command {
            BatchCommand::RecordCollection { .. } => self.event_store.lock_stream(batch_id).await,
            _ => self
                .event_store
                .lock_existing_stream(batch_id)
                .await
                .ok_or_else(|| BatchError::NotFound(batch_id.to_string()))?,
        };

        let state = stream.load::<BatchAggregate>()?;
        let expected_version = stream.version();

        let domain_events = BatchAggregate::handle_command(state.as_ref(), &command)?;

        // Wrap in envelopes, folding as we go so the returned batch matches the stream
        let mut envelopes = Vec::with_capacity(domain_events.len());
        let mut event_types = Vec::with_capacity(domain_events.len());
        let mut aggregate = state;
        let mut seq = expected_version;

        for domain_event in domain_events {
            seq += 1;
            event_types.push(domain_event.event_type());

            let envelope = EventEnvelope::new(batch_id, seq, domain_event, correlation_id)
                .with_metadata("actor", actor)
                .with_metadata("command", command.name());

            aggregate = Some(BatchAggregate::fold(aggregate, &envelope)?);
            envelopes.push(envelope);
        }

        let batch = aggregate.ok_or(BatchError::NotInitialized)?;
        stream.append(expected_version, envelopes)?;

        tracing::debug!(
            batch_id = %batch_id,
            command = command.name(),
            version = batch.version(),
            "Command applied"
        );

        Ok(CommandOutcome { batch, event_types })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
