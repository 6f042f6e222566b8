// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - batch: the Batch aggregate, its events, commands and command handler
// - rules: the read-only Rule Catalog
// - validation: stateless rule evaluation over proposed events
//
// This layer is completely separate from the event sourcing infrastructure.
//
// ============================================================================

pub mod batch;
pub mod rules;
pub mod validation;
