//! Signal sources and the Signal type

use crate::evidence::Evidence;
use crate::FusionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Independent source of a fraud signal.
///
/// A closed enum rather than a string key: an unknown source is a
/// compile error, not a silently zero-weighted contributor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SignalSource {
    /// Register transaction analytics (voids, refunds, discounts)
    TransactionAnalytics,
    /// Till-camera presence correlation
    PresenceCorrelation,
    /// Communication risk from the inference service
    CommunicationAnalysis,
    /// Statistical deviation from the learned behavioral baseline
    BehavioralBaseline,
    /// Projected risk trajectory
    TrendForecast,
}

impl SignalSource {
    /// All sources, in canonical order
    pub const ALL: [SignalSource; 5] = [
        SignalSource::TransactionAnalytics,
        SignalSource::PresenceCorrelation,
        SignalSource::CommunicationAnalysis,
        SignalSource::BehavioralBaseline,
        SignalSource::TrendForecast,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::TransactionAnalytics => "transaction_analytics",
            SignalSource::PresenceCorrelation => "presence_correlation",
            SignalSource::CommunicationAnalysis => "communication_analysis",
            SignalSource::BehavioralBaseline => "behavioral_baseline",
            SignalSource::TrendForecast => "trend_forecast",
        }
    }

    /// Default fusion weight for the source
    pub fn default_weight(&self) -> f64 {
        match self {
            SignalSource::TransactionAnalytics => 0.25,
            SignalSource::PresenceCorrelation => 0.25,
            SignalSource::CommunicationAnalysis => 0.20,
            SignalSource::BehavioralBaseline => 0.15,
            SignalSource::TrendForecast => 0.15,
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source's normalized risk assessment for a subject.
///
/// Immutable once created. Providers that compute sigma deviations or
/// correlation percentages map them into [0, 1] before constructing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Which source produced the signal
    pub source: SignalSource,

    /// Subject the assessment is about
    pub subject_id: String,

    /// Normalized risk score in [0, 1]
    pub score: f64,

    /// Source's confidence in its own score, in [0, 1]
    pub confidence: f64,

    /// Fusion weight for this signal
    pub weight: f64,

    /// Typed evidence backing the score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,

    /// When the source observed the underlying data
    pub observed_at: DateTime<Utc>,
}

impl Signal {
    /// Construct a signal, rejecting out-of-range values
    pub fn new(
        source: SignalSource,
        subject_id: impl Into<String>,
        score: f64,
        confidence: f64,
        weight: f64,
        evidence: Option<Evidence>,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, FusionError> {
        Self::check_unit("score", source, score)?;
        Self::check_unit("confidence", source, confidence)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(FusionError::InvalidWeight {
                signal_source: source,
                value: weight,
            });
        }

        Ok(Self {
            source,
            subject_id: subject_id.into(),
            score,
            confidence,
            weight,
            evidence,
            observed_at,
        })
    }

    /// This signal's contribution to the weighted sum
    pub fn contribution(&self) -> f64 {
        self.score * self.weight
    }

    fn check_unit(field: &'static str, source: SignalSource, value: f64) -> Result<(), FusionError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(FusionError::InvalidSignal {
                signal_source: source,
                field,
                value,
            });
        }
        Ok(())
    }
}
