//! Gate implementation

use crate::{ThrottleError, ThrottlePolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signal_fusion::CompositeScore;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Persisted per-subject throttle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleState {
    /// Subject the state belongs to
    pub subject_id: String,

    /// When the last alert fired, if any
    pub last_alert_at: Option<DateTime<Utc>>,

    /// Alerts fired inside the current burst chain
    pub alerts_in_window: u32,
}

impl ThrottleState {
    /// Fresh state for a subject that has never alerted
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            last_alert_at: None,
            alerts_in_window: 0,
        }
    }

    /// Current phase of the state machine
    pub fn phase(&self, policy: &ThrottlePolicy, now: DateTime<Utc>) -> ThrottlePhase {
        match self.last_alert_at {
            Some(last) if now - last < policy.window => ThrottlePhase::CoolingDown,
            _ => ThrottlePhase::Available,
        }
    }
}

/// State machine phase for a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrottlePhase {
    /// An alert may fire
    Available,
    /// Inside the cooldown window; all alerts suppressed
    CoolingDown,
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrottleOutcome {
    /// Alert fired; the subject is now cooling down
    Fired,

    /// Suppressed: still inside the cooldown window
    CoolingDown { until: DateTime<Utc> },

    /// Suppressed: burst cap reached for the current chain
    WindowExhausted { until: DateTime<Utc> },

    /// Composite risk below the alerting floor
    BelowThreshold,
}

/// Result of one gate check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDecision {
    /// Whether the alert may fire
    pub allow: bool,

    /// Reason for the decision
    pub outcome: ThrottleOutcome,

    /// State after the decision was applied
    pub state: ThrottleState,
}

/// Per-subject alert throttle.
///
/// The state map is the only cross-call mutable state in the pipeline;
/// one mutex makes every check-and-transition atomic, so concurrent
/// evaluations of the same subject serialize here and only here.
pub struct ThrottleGate {
    policy: ThrottlePolicy,
    states: Mutex<HashMap<String, ThrottleState>>,
}

impl ThrottleGate {
    /// Create a gate with a validated policy
    pub fn new(policy: ThrottlePolicy) -> Result<Self, ThrottleError> {
        policy.validate()?;
        info!(?policy, "creating alert throttle gate");
        Ok(Self {
            policy,
            states: Mutex::new(HashMap::new()),
        })
    }

    /// The gate's policy
    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    /// Decide whether an alert may fire, transitioning state atomically.
    ///
    /// Even a Critical composite is suppressed during cooldown; alert
    /// storms are worse than a delayed follow-up.
    pub fn check_and_set(
        &self,
        composite: &CompositeScore,
        now: DateTime<Utc>,
    ) -> Result<AlertDecision, ThrottleError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| ThrottleError::LockPoisoned(e.to_string()))?;

        let state = states
            .entry(composite.subject_id.clone())
            .or_insert_with(|| ThrottleState::new(composite.subject_id.clone()));

        if composite.risk_level < self.policy.min_risk_level {
            debug!(
                subject_id = %composite.subject_id,
                risk_level = composite.risk_level.as_str(),
                "alert not eligible, below threshold"
            );
            return Ok(AlertDecision {
                allow: false,
                outcome: ThrottleOutcome::BelowThreshold,
                state: state.clone(),
            });
        }

        if let Some(last) = state.last_alert_at {
            if now - last < self.policy.window {
                warn!(
                    subject_id = %composite.subject_id,
                    risk_level = composite.risk_level.as_str(),
                    "alert throttled: cooling down"
                );
                return Ok(AlertDecision {
                    allow: false,
                    outcome: ThrottleOutcome::CoolingDown {
                        until: last + self.policy.window,
                    },
                    state: state.clone(),
                });
            }

            let chain_active = now - last < self.policy.reset_after;
            if chain_active && state.alerts_in_window >= self.policy.max_alerts_per_window {
                warn!(
                    subject_id = %composite.subject_id,
                    alerts = state.alerts_in_window,
                    "alert throttled: burst cap reached"
                );
                return Ok(AlertDecision {
                    allow: false,
                    outcome: ThrottleOutcome::WindowExhausted {
                        until: last + self.policy.reset_after,
                    },
                    state: state.clone(),
                });
            }

            state.alerts_in_window = if chain_active {
                state.alerts_in_window + 1
            } else {
                1
            };
        } else {
            state.alerts_in_window = 1;
        }

        state.last_alert_at = Some(now);
        info!(
            subject_id = %composite.subject_id,
            risk_level = composite.risk_level.as_str(),
            count = state.alerts_in_window,
            "alert allowed, entering cooldown"
        );

        Ok(AlertDecision {
            allow: true,
            outcome: ThrottleOutcome::Fired,
            state: state.clone(),
        })
    }

    /// Snapshot all states for persistence
    pub fn snapshot(&self) -> Result<Vec<ThrottleState>, ThrottleError> {
        let states = self
            .states
            .lock()
            .map_err(|e| ThrottleError::LockPoisoned(e.to_string()))?;
        Ok(states.values().cloned().collect())
    }

    /// Restore previously persisted states (e.g. at startup)
    pub fn restore(&self, restored: Vec<ThrottleState>) -> Result<(), ThrottleError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| ThrottleError::LockPoisoned(e.to_string()))?;
        for state in restored {
            states.insert(state.subject_id.clone(), state);
        }
        Ok(())
    }
}
