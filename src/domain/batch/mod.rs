// ============================================================================
// Batch Domain - Business Logic for Batch Aggregate
// ============================================================================
//
// This module contains ALL Batch-specific code:
// - Value objects (GpsCoordinates, QualityResults, ProcessingStepKind, ...)
// - Events (BatchCollected, QualityTestRecorded, ProcessingStepRecorded)
// - Commands and their policies
// - Errors (BatchError enum)
// - Aggregate (BatchAggregate with the lifecycle state machine)
// - Command Handler (BatchCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
