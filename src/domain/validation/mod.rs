// ============================================================================
// Validation Engine - Stateless Rule Evaluation
// ============================================================================

pub mod clock;
pub mod engine;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::*;
