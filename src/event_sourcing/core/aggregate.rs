use super::event::{DomainEvent, EventEnvelope};

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Commands are checked against current state before emitting events
// 3. Events represent facts that have already happened
// 4. Aggregates enforce business invariants
//
// ============================================================================

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event: DomainEvent;
    type Command;
    type Error: std::error::Error;

    /// Create new aggregate from the first event of its stream
    fn apply_first_event(envelope: &EventEnvelope<Self::Event>) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, envelope: &EventEnvelope<Self::Event>) -> Result<(), Self::Error>;

    /// Handle command and emit events. `state` is `None` while the stream is empty.
    fn handle_command(
        state: Option<&Self>,
        command: &Self::Command,
    ) -> Result<Vec<Self::Event>, Self::Error>;

    fn aggregate_id(&self) -> &str;

    /// Sequence number of the last applied event
    fn version(&self) -> i64;

    /// Apply one envelope to an optional state.
    fn fold(state: Option<Self>, envelope: &EventEnvelope<Self::Event>) -> Result<Self, Self::Error> {
        match state {
            None => Self::apply_first_event(envelope),
            Some(mut aggregate) => {
                aggregate.apply_event(envelope)?;
                Ok(aggregate)
            }
        }
    }

    /// Load aggregate from event history. An empty history yields `None`.
    fn load_from_events(events: &[EventEnvelope<Self::Event>]) -> Result<Option<Self>, Self::Error> {
        let mut state = None;
        for envelope in events {
            state = Some(Self::fold(state, envelope)?);
        }
        Ok(state)
    }
}
