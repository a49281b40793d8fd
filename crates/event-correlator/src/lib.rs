//! Temporal Event Correlator
//!
//! Matches two asynchronous event streams (e.g. register transactions
//! and nearby camera detections) within a tolerance window and
//! classifies each anchor event:
//! - Matched: one corroborating event found in the window
//! - Ghost: no counterpart event at all
//! - LowConfidence: best match falls below the confidence floor
//! - MultiCandidate: several independent events crowd the anchor
//!
//! Pure and deterministic: no I/O, testable without a database.

mod correlator;
mod error;
mod event;

pub use correlator::{Correlator, CorrelatorConfig};
pub use error::CorrelatorError;
pub use event::{CorrelationResult, EventKind, EventRecord, MatchClass};
