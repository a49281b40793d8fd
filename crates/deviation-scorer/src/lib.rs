//! Deviation Scorer
//!
//! Expresses how abnormal a current metric value is against its learned
//! baseline, in standard deviations (sigma), banded into severities via
//! the shared threshold ladder. Thin or expired baselines yield typed
//! "signal unavailable" outcomes, never a synthetic zero.

mod baseline;
mod scorer;

pub use baseline::{BaselineProfile, DimensionBaseline};
pub use scorer::{Deviation, DeviationConfig, DeviationScorer};

use thiserror::Error;

/// Errors during deviation scoring
#[derive(Debug, Clone, Error)]
pub enum DeviationError {
    /// Baseline was learned from too few samples
    #[error("baseline has {have} samples, {need} required")]
    InsufficientData { have: u32, need: u32 },

    /// Baseline validity window has passed
    #[error("baseline for '{dimension}' expired at {valid_until}")]
    ExpiredBaseline {
        dimension: String,
        valid_until: chrono::DateTime<chrono::Utc>,
    },

    /// Baseline statistics are malformed (negative stddev, NaN mean)
    #[error("invalid baseline: {0}")]
    InvalidBaseline(String),

    /// Current value is NaN or infinite
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
}
