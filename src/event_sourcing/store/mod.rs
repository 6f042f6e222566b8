// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================
//
// Generic append-only storage for event streams. Works with any event type.
//
// ============================================================================

pub mod event_store;

pub use event_store::{EventStore, StoreError, StreamGuard};
