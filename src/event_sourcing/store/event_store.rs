use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::event_sourcing::core::{serialize_event, Aggregate, DomainEvent, EventEnvelope};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// In-process, append-only event store. Generic over the event type.
//
// Layout:
// - one stream per aggregate id, each behind its own mutex
// - the stream table is behind a RwLock that is only held long enough to
//   find or create a stream
//
// Responsibilities:
// 1. Append events to a stream (append-only, contiguous sequence numbers)
// 2. Load event history for aggregates
// 3. Optimistic concurrency check on every append
// 4. Export/import a stream as a JSON-lines segment for replay
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {current}")]
    ConcurrencyConflict {
        aggregate_id: String,
        expected: i64,
        current: i64,
    },

    #[error("Cannot append empty event list")]
    EmptyAppend,

    #[error("Event for {found} cannot be appended to stream {expected}")]
    ForeignEvent { expected: String, found: String },

    #[error("Sequence gap in stream {aggregate_id}: expected {expected}, found {found}")]
    SequenceGap {
        aggregate_id: String,
        expected: i64,
        found: i64,
    },

    #[error("Segment is empty")]
    EmptySegment,

    #[error("Stream {0} already has events")]
    StreamNotEmpty(String),

    #[error("Malformed segment line {line}: {source}")]
    Segment {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode event: {0}")]
    Encode(String),
}

type Stream<E> = Arc<Mutex<Vec<EventEnvelope<E>>>>;

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<HashMap<String, Stream<E>>>,
    aggregate_type_name: String, // e.g. "Batch"
}

/// Exclusive access to one stream. Held across load → decide → append so that
/// commands against the same aggregate never interleave.
pub struct StreamGuard<E> {
    aggregate_id: String,
    aggregate_type_name: String,
    events: OwnedMutexGuard<Vec<EventEnvelope<E>>>,
}

/// Check that `events` continue `aggregate_id` right after `current_version`.
/// Returns the version the stream would reach.
fn check_contiguous<E>(
    aggregate_id: &str,
    current_version: i64,
    events: &[EventEnvelope<E>],
) -> Result<i64, StoreError> {
    if events.is_empty() {
        return Err(StoreError::EmptyAppend);
    }

    let mut next = current_version;
    for envelope in events {
        next += 1;
        if envelope.aggregate_id != aggregate_id {
            return Err(StoreError::ForeignEvent {
                expected: aggregate_id.to_string(),
                found: envelope.aggregate_id.clone(),
            });
        }
        if envelope.sequence_number != next {
            return Err(StoreError::SequenceGap {
                aggregate_id: aggregate_id.to_string(),
                expected: next,
                found: envelope.sequence_number,
            });
        }
    }
    Ok(next)
}

impl<E: DomainEvent> StreamGuard<E> {
    /// Sequence number of the last event, 0 for an empty stream
    pub fn version(&self) -> i64 {
        self.events.last().map_or(0, |e| e.sequence_number)
    }

    pub fn events(&self) -> &[EventEnvelope<E>] {
        &self.events
    }

    pub fn load<A>(&self) -> Result<Option<A>, A::Error>
    where
        A: Aggregate<Event = E>,
    {
        A::load_from_events(self.events())
    }

    /// Append events to the stream. Returns the new version.
    pub fn append(
        &mut self,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        let current_version = self.version();
        if current_version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id: self.aggregate_id.clone(),
                expected: expected_version,
                current: current_version,
            });
        }

        // Check the whole batch before touching the stream
        let next = check_contiguous(&self.aggregate_id, current_version, &events)?;

        let event_count = events.len();
        self.events.extend(events);

        tracing::info!(
            aggregate_id = %self.aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = next,
            event_count = event_count,
            "✅ Appended events to event store"
        );

        Ok(next)
    }
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            aggregate_type_name: aggregate_type_name.to_string(),
        }
    }

    async fn find_stream(&self, aggregate_id: &str) -> Option<Stream<E>> {
        self.streams.read().await.get(aggregate_id).cloned()
    }

    async fn find_or_create_stream(&self, aggregate_id: &str) -> Stream<E> {
        if let Some(stream) = self.find_stream(aggregate_id).await {
            return stream;
        }

        let mut streams = self.streams.write().await;
        streams
            .entry(aggregate_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    fn guard(&self, aggregate_id: &str, events: OwnedMutexGuard<Vec<EventEnvelope<E>>>) -> StreamGuard<E> {
        StreamGuard {
            aggregate_id: aggregate_id.to_string(),
            aggregate_type_name: self.aggregate_type_name.clone(),
            events,
        }
    }

    /// Lock a stream for writing, creating it if it does not exist yet
    pub async fn lock_stream(&self, aggregate_id: &str) -> StreamGuard<E> {
        let stream = self.find_or_create_stream(aggregate_id).await;
        self.guard(aggregate_id, stream.lock_owned().await)
    }

    /// Lock a stream for writing only if it already has events
    pub async fn lock_existing_stream(&self, aggregate_id: &str) -> Option<StreamGuard<E>> {
        let stream = self.find_stream(aggregate_id).await?;
        let guard = self.guard(aggregate_id, stream.lock_owned().await);
        if guard.version() == 0 {
            return None;
        }
        Some(guard)
    }

    /// Load all events for an aggregate, in sequence order
    pub async fn load_events(&self, aggregate_id: &str) -> Vec<EventEnvelope<E>> {
        let Some(stream) = self.find_stream(aggregate_id).await else {
            return Vec::new();
        };
        let events = stream.lock().await.clone();

        tracing::debug!("Loaded {} events for aggregate {}", events.len(), aggregate_id);
        events
    }

    /// Get current version of aggregate, 0 when it has no events
    pub async fn get_current_version(&self, aggregate_id: &str) -> i64 {
        match self.find_stream(aggregate_id).await {
            Some(stream) => stream.lock().await.last().map_or(0, |e| e.sequence_number),
            None => 0,
        }
    }

    /// Load aggregate from events. `Ok(None)` when the aggregate has no events.
    pub async fn load_aggregate<A>(&self, aggregate_id: &str) -> Result<Option<A>, A::Error>
    where
        A: Aggregate<Event = E>,
    {
        let events = self.load_events(aggregate_id).await;
        A::load_from_events(&events)
    }

    /// Ids of every aggregate with at least one event, sorted
    pub async fn aggregate_ids(&self) -> Vec<String> {
        let streams: Vec<(String, Stream<E>)> = self
            .streams
            .read()
            .await
            .iter()
            .map(|(id, stream)| (id.clone(), stream.clone()))
            .collect();

        let mut ids = Vec::with_capacity(streams.len());
        for (id, stream) in streams {
            if !stream.lock().await.is_empty() {
                ids.push(id);
            }
        }
        ids.sort();
        ids
    }

    /// Export a stream as JSON lines, one envelope per line.
    /// `Ok(None)` when the aggregate has no events.
    pub async fn export_segment(&self, aggregate_id: &str) -> Result<Option<String>, StoreError> {
        let events = self.load_events(aggregate_id).await;
        if events.is_empty() {
            return Ok(None);
        }

        let mut segment = String::new();
        for envelope in &events {
            let line = serialize_event(envelope).map_err(|e| StoreError::Encode(e.to_string()))?;
            segment.push_str(&line);
            segment.push('\n');
        }
        Ok(Some(segment))
    }

    /// Parse a JSON-lines segment without touching any stream
    pub fn parse_segment(segment: &str) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let mut events = Vec::new();
        for (index, line) in segment.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let envelope: EventEnvelope<E> = serde_json::from_str(line)
                .map_err(|source| StoreError::Segment { line: index + 1, source })?;
            events.push(envelope);
        }
        Ok(events)
    }

    /// Import a JSON-lines segment into an empty stream.
    /// Returns the aggregate id and its version after import.
    pub async fn import_segment(&self, segment: &str) -> Result<(String, i64), StoreError> {
        let events = Self::parse_segment(segment)?;
        self.import_events(events).await
    }

    /// Import parsed envelopes into an empty stream
    pub async fn import_events(&self, events: Vec<EventEnvelope<E>>) -> Result<(String, i64), StoreError> {
        let aggregate_id = match events.first() {
            Some(first) => first.aggregate_id.clone(),
            None => return Err(StoreError::EmptySegment),
        };
        // A segment that could never be appended must not leave a stream behind
        check_contiguous(&aggregate_id, 0, &events)?;

        let mut stream = self.lock_stream(&aggregate_id).await;
        if stream.version() != 0 {
            return Err(StoreError::StreamNotEmpty(aggregate_id));
        }
        let version = stream.append(0, events)?;

        Ok((aggregate_id, version))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
