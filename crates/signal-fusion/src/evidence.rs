//! Typed evidence variants, one per signal source

use crate::signal::SignalSource;
use chrono::{DateTime, Utc};
use event_correlator::MatchClass;
use score_bands::Severity;
use serde::{Deserialize, Serialize};

/// A single anomalous transaction pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionIndicator {
    /// Indicator kind (e.g. "excessive_voids", "after_hours_activity")
    pub kind: String,

    /// Human-readable description
    pub description: String,

    /// Indicator severity in [0, 1]
    pub severity: f64,
}

/// An uncorroborated or suspicious till event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceMismatch {
    /// How the anchor event was classified
    pub classification: MatchClass,

    /// Human-readable description
    pub description: String,

    /// Mismatch severity in [0, 1]
    pub severity: f64,

    /// When the anchor event occurred
    pub occurred_at: DateTime<Utc>,
}

/// A message the inference service flagged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedMessage {
    /// Channel the message came from
    pub channel: String,

    /// Redacted excerpt
    pub excerpt: String,

    /// Message risk score in [0, 1]
    pub risk_score: f64,

    /// When the message was sent
    pub observed_at: DateTime<Utc>,
}

/// One metric's deviation from its baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDeviation {
    /// Metric dimension name
    pub metric: String,

    /// Standard deviations from the baseline mean
    pub sigma: f64,

    /// Banded severity
    pub severity: Severity,

    /// Current value of the metric
    pub current: f64,

    /// Baseline mean the value was compared against
    pub baseline_mean: f64,
}

/// Evidence backing a signal, typed per source.
///
/// A tagged union instead of opaque JSON so the investigation package
/// builder never parses arbitrary shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// Transaction analytics indicators
    Transactions {
        indicators: Vec<TransactionIndicator>,
    },

    /// Presence correlation outcomes
    Presence {
        mismatches: Vec<PresenceMismatch>,
        events_checked: usize,
        events_confirmed: usize,
    },

    /// Flagged communications
    Communications { flagged: Vec<FlaggedMessage> },

    /// Baseline deviations per metric
    Baseline { deviations: Vec<MetricDeviation> },

    /// Trend projection summary
    Forecast {
        slope_per_week: f64,
        projected_risk: f64,
        weeks_to_high_risk: Option<i64>,
        indicators: Vec<String>,
    },
}

impl Evidence {
    /// The source this evidence variant belongs to
    pub fn source(&self) -> SignalSource {
        match self {
            Evidence::Transactions { .. } => SignalSource::TransactionAnalytics,
            Evidence::Presence { .. } => SignalSource::PresenceCorrelation,
            Evidence::Communications { .. } => SignalSource::CommunicationAnalysis,
            Evidence::Baseline { .. } => SignalSource::BehavioralBaseline,
            Evidence::Forecast { .. } => SignalSource::TrendForecast,
        }
    }

    /// Number of discrete evidence items in the variant
    pub fn item_count(&self) -> usize {
        match self {
            Evidence::Transactions { indicators } => indicators.len(),
            Evidence::Presence { mismatches, .. } => mismatches.len(),
            Evidence::Communications { flagged } => flagged.len(),
            Evidence::Baseline { deviations } => deviations.len(),
            Evidence::Forecast { indicators, .. } => indicators.len(),
        }
    }
}
