// ============================================================================
// Rule Catalog - Static Sourcing and Quality Rules
// ============================================================================

pub mod catalog;

pub use catalog::*;
