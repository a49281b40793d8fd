//! Trend Projector
//!
//! Fits an ordinary least-squares line through an ordered (index, value)
//! history and extrapolates forward. An insufficient history is an
//! explicit, typed outcome so callers can never mistake "no data" for a
//! confident zero slope.

mod projector;

pub use projector::{Projection, TrendConfig, TrendProjector};

use thiserror::Error;

/// Errors during trend projection
#[derive(Debug, Clone, Error)]
pub enum TrendError {
    /// Fewer than two history points
    #[error("history has {points} points, at least 2 required")]
    InsufficientHistory { points: usize },

    /// A history value or index is NaN or infinite
    #[error("history contains a non-finite value at index {index}")]
    NonFinite { index: i64 },

    /// History indices must be strictly increasing
    #[error("history indices are not strictly increasing at index {index}")]
    UnorderedHistory { index: i64 },

    /// All indices identical; the slope is undefined
    #[error("history index variance is zero, slope is undefined")]
    DegenerateHistory,

    /// Clamp range is inverted or non-finite
    #[error("invalid clamp range [{min}, {max}]")]
    InvalidClamp { min: f64, max: f64 },
}
