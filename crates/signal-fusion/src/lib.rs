//! Signal Fusion Engine
//!
//! Combines normalized per-source risk signals for a subject:
//! - Transaction analytics (voids, refunds, discounts)
//! - Presence correlation (till-camera matching)
//! - Communication analysis (opaque inference service)
//! - Behavioral baseline deviation
//! - Predictive trend forecasting
//!
//! Produces one composite score per subject with a correlation bonus
//! when independent sources agree at high risk. A source that could not
//! compute is absent from the input, never present as zero.

mod config;
mod engine;
mod evidence;
mod signal;

pub use config::FusionConfig;
pub use engine::{CompositeScore, FusionEngine};
pub use evidence::{
    Evidence, FlaggedMessage, MetricDeviation, PresenceMismatch, TransactionIndicator,
};
pub use signal::{Signal, SignalSource};

use thiserror::Error;

/// Fusion error types
#[derive(Debug, Clone, Error)]
pub enum FusionError {
    /// Signal score or confidence outside [0, 1]
    #[error("{signal_source} signal {field} {value} is outside [0, 1]")]
    InvalidSignal {
        signal_source: SignalSource,
        field: &'static str,
        value: f64,
    },

    /// Signal weight negative or non-finite
    #[error("{signal_source} signal weight {value} is invalid")]
    InvalidWeight { signal_source: SignalSource, value: f64 },

    /// Configuration rejected at load time
    #[error("invalid fusion config: {0}")]
    InvalidConfig(String),

    /// Signal belongs to a different subject than the fusion call
    #[error("signal subject '{got}' does not match '{expected}'")]
    SubjectMismatch { expected: String, got: String },
}
