//! Analysis Orchestrator
//!
//! The single composed entry point over the fusion core: gathers
//! signals from every provider in parallel, fuses them, gates the
//! alert, and assembles the investigation package when one fires.
//! Per-subject analyses are embarrassingly parallel; the throttle gate
//! is the only shared mutable state and serializes per subject.

mod pipeline;

pub use pipeline::{
    AnalysisConfig, DegradedSource, Orchestrator, SubjectAnalysis, SweepReport,
};

use thiserror::Error;

/// Orchestrator error types
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Fusion rejected the gathered signals
    #[error("fusion failed: {0}")]
    Fusion(#[from] signal_fusion::FusionError),

    /// Throttle gate failure
    #[error("throttle gate failed: {0}")]
    Throttle(#[from] alert_throttle::ThrottleError),

    /// The sweep was cancelled before this subject completed
    #[error("analysis cancelled")]
    Cancelled,
}
