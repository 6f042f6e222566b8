// ============================================================================
// Herb Provenance - Validated Supply-Chain Ledger
// ============================================================================
//
// Layers, leaf-first:
// - event_sourcing: generic aggregate/envelope traits and the event store
// - domain: rule catalog, validation engine, batch aggregate
// - service: the query/command boundary used by the outer application
//
// ============================================================================

pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod service;

pub use config::{Args, ServiceConfig};
pub use domain::batch::{Batch, BatchError, BatchStatus, ErrorKind};
pub use domain::rules::RuleCatalog;
pub use domain::validation::{Clock, FixedClock, SystemClock, ValidationPayload, Verdict};
pub use metrics::Metrics;
pub use service::{BatchFilter, ProvenanceService};
