//! Alert Throttle Gate
//!
//! Decides whether an alert may fire for a subject, using persisted
//! per-subject cooldown state. Every decision is an atomic
//! check-and-set so two concurrent analyses of the same subject can
//! never both fire. Suppressions carry a reason; the caller logs them
//! as throttled, never drops them silently.

mod gate;

pub use gate::{AlertDecision, ThrottleGate, ThrottleOutcome, ThrottlePhase, ThrottleState};

use chrono::Duration;
use score_bands::RiskLevel;
use thiserror::Error;

/// Throttle error types
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// Policy rejected at construction
    #[error("invalid throttle policy: {0}")]
    InvalidPolicy(String),

    /// State map lock poisoned by a panicked writer
    #[error("throttle state lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Throttle policy for alert pacing
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    /// Minimum interval between two alerts for the same subject
    pub window: Duration,

    /// Quiet period after which the burst counter resets
    pub reset_after: Duration,

    /// Maximum alerts inside one burst chain before exhaustion
    pub max_alerts_per_window: u32,

    /// Risk level at or above which alerts are eligible to fire
    pub min_risk_level: RiskLevel,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(30),
            reset_after: Duration::hours(24),
            max_alerts_per_window: 10,
            min_risk_level: RiskLevel::High,
        }
    }
}

impl ThrottlePolicy {
    /// Validate the policy; called at gate construction
    pub fn validate(&self) -> Result<(), ThrottleError> {
        if self.window <= Duration::zero() {
            return Err(ThrottleError::InvalidPolicy(
                "window must be positive".to_string(),
            ));
        }
        if self.reset_after < self.window {
            return Err(ThrottleError::InvalidPolicy(
                "reset_after must be at least the window".to_string(),
            ));
        }
        if self.max_alerts_per_window == 0 {
            return Err(ThrottleError::InvalidPolicy(
                "max_alerts_per_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
