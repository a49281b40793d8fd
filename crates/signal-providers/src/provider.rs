//! Provider trait and error types

use async_trait::async_trait;
use signal_fusion::{Signal, SignalSource};
use thiserror::Error;

/// Errors a provider can surface.
///
/// Unavailable and Timeout are signal absences: the orchestrator fuses
/// whatever other sources remain. Validation means the provider itself
/// was fed something malformed and that single computation is fatal.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The source could not compute a score (thin baseline, empty feed)
    #[error("{signal_source:?} signal unavailable: {reason}")]
    Unavailable { signal_source: SignalSource, reason: String },

    /// The source exceeded its deadline
    #[error("{signal_source:?} provider timed out after {deadline_ms} ms")]
    Timeout { signal_source: SignalSource, deadline_ms: u64 },

    /// The analysis run was cancelled mid-flight
    #[error("{signal_source:?} provider cancelled")]
    Cancelled { signal_source: SignalSource },

    /// Malformed input to the provider's computation
    #[error("{signal_source:?} provider validation failed: {reason}")]
    Validation { signal_source: SignalSource, reason: String },
}

impl ProviderError {
    /// Source the error belongs to
    pub fn source(&self) -> SignalSource {
        match self {
            ProviderError::Unavailable { signal_source, .. }
            | ProviderError::Timeout { signal_source, .. }
            | ProviderError::Cancelled { signal_source }
            | ProviderError::Validation { signal_source, .. } => *signal_source,
        }
    }
}

/// An independent fraud-signal source
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Which source this provider feeds
    fn source(&self) -> SignalSource;

    /// Produce a signal for a subject, or a typed absence
    async fn produce(&self, subject_id: &str) -> Result<Signal, ProviderError>;
}
