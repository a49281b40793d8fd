//! Correlator Error Types

use thiserror::Error;

/// Errors during event correlation
#[derive(Debug, Clone, Error)]
pub enum CorrelatorError {
    /// Tolerance window must be strictly positive
    #[error("correlation window must be positive, got {0} ms")]
    InvalidWindow(i64),

    /// Confidence values must be finite and within [0, 1]
    #[error("{field} confidence {value} is outside [0, 1]")]
    InvalidConfidence { field: &'static str, value: f64 },

    /// Sub-window fraction must lie in (0, 1]
    #[error("multi-candidate fraction {0} is outside (0, 1]")]
    InvalidFraction(f64),
}
