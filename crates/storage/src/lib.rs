//! Storage Layer
//!
//! Persistence sink for the fusion pipeline: composite scores
//! (per-subject last-write-wins), investigation packages, throttle
//! states, and weekly risk history windows. Opaque key-value/row
//! operations; the schema behind them is not a caller concern.

mod repository;

pub use repository::{Repository, RiskSample};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
