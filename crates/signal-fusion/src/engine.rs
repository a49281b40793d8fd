//! Composite scoring

use crate::config::FusionConfig;
use crate::signal::{Signal, SignalSource};
use crate::FusionError;
use chrono::{DateTime, Utc};
use score_bands::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Fused risk score for one subject at one point in time.
///
/// One logical instance per (subject, analysis run); later runs
/// supersede earlier ones, never merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Subject the score is about
    pub subject_id: String,

    /// Fused score in [0, 1]
    pub total: f64,

    /// Banded risk level
    pub risk_level: RiskLevel,

    /// Signals that contributed, in canonical source order
    pub contributing: Vec<Signal>,

    /// Whether the cross-source bonus was applied
    pub correlation_bonus_applied: bool,

    /// Sources that scored at or above the high-risk threshold
    pub agreeing_sources: Vec<SignalSource>,

    /// When the fusion ran
    pub computed_at: DateTime<Utc>,
}

impl CompositeScore {
    /// Sum of contributing weights
    pub fn active_weight(&self) -> f64 {
        self.contributing.iter().map(|s| s.weight).sum()
    }
}

/// Combines per-source signals into one composite score
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    /// Create an engine, validating the configuration up front
    pub fn new(config: FusionConfig) -> Result<Self, FusionError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine's configuration
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuse the available signals for a subject.
    ///
    /// Pure given its inputs; the caller persists the result. An empty
    /// signal list is a legitimate "nothing to report" outcome, not an
    /// error. Output is independent of input ordering.
    pub fn fuse(
        &self,
        subject_id: &str,
        signals: &[Signal],
        computed_at: DateTime<Utc>,
    ) -> Result<CompositeScore, FusionError> {
        let mut raw = 0.0;
        let mut active_weight = 0.0;
        let mut agreeing: BTreeSet<SignalSource> = BTreeSet::new();

        for signal in signals {
            Self::validate_signal(subject_id, signal)?;
            raw += signal.contribution();
            active_weight += signal.weight;
            if signal.score >= self.config.high_risk_threshold {
                agreeing.insert(signal.source);
            }
        }

        let normalized = if active_weight > 0.0 {
            raw / active_weight
        } else {
            0.0
        };

        let bonus_applied = agreeing.len() >= self.config.min_agreeing_sources;
        let total = if bonus_applied {
            (normalized + self.config.correlation_bonus).min(1.0)
        } else {
            normalized
        };

        let risk_level = self.config.risk_bands.classify(total);

        // Canonical source order keeps the output permutation-independent
        let mut contributing = signals.to_vec();
        contributing.sort_by_key(|s| s.source);

        debug!(
            subject_id,
            total,
            risk_level = risk_level.as_str(),
            sources = contributing.len(),
            bonus_applied,
            "fused composite score"
        );

        Ok(CompositeScore {
            subject_id: subject_id.to_string(),
            total,
            risk_level,
            contributing,
            correlation_bonus_applied: bonus_applied,
            agreeing_sources: agreeing.into_iter().collect(),
            computed_at,
        })
    }

    fn validate_signal(subject_id: &str, signal: &Signal) -> Result<(), FusionError> {
        if signal.subject_id != subject_id {
            return Err(FusionError::SubjectMismatch {
                expected: subject_id.to_string(),
                got: signal.subject_id.clone(),
            });
        }
        if !signal.score.is_finite() || !(0.0..=1.0).contains(&signal.score) {
            return Err(FusionError::InvalidSignal {
                signal_source: signal.source,
                field: "score",
                value: signal.score,
            });
        }
        if !signal.weight.is_finite() || signal.weight < 0.0 {
            return Err(FusionError::InvalidWeight {
                signal_source: signal.source,
                value: signal.weight,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signal(source: SignalSource, score: f64, weight: f64) -> Signal {
        Signal::new(source, "staff-1", score, 0.9, weight, None, Utc::now()).unwrap()
    }

    fn engine() -> FusionEngine {
        FusionEngine::new(FusionConfig::default()).unwrap()
    }

    #[test]
    fn test_worked_example() {
        // A(0.8, w 0.25), B(0.75, w 0.25), C(0.6, w 0.2), D unavailable
        let signals = vec![
            signal(SignalSource::TransactionAnalytics, 0.8, 0.25),
            signal(SignalSource::PresenceCorrelation, 0.75, 0.25),
            signal(SignalSource::CommunicationAnalysis, 0.6, 0.20),
        ];

        let composite = engine().fuse("staff-1", &signals, Utc::now()).unwrap();

        assert!((composite.active_weight() - 0.70).abs() < 1e-9);
        assert!((composite.total - 0.725).abs() < 1e-3);
        // Only 2 signals at or above 0.70, bonus needs 3
        assert!(!composite.correlation_bonus_applied);
        assert_eq!(composite.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_zero_signals_is_low_not_error() {
        let composite = engine().fuse("staff-1", &[], Utc::now()).unwrap();

        assert_eq!(composite.total, 0.0);
        assert_eq!(composite.risk_level, RiskLevel::Low);
        assert!(!composite.correlation_bonus_applied);
        assert!(composite.contributing.is_empty());
    }

    #[test]
    fn test_correlation_bonus_at_three_agreeing() {
        let signals = vec![
            signal(SignalSource::TransactionAnalytics, 0.8, 0.25),
            signal(SignalSource::PresenceCorrelation, 0.75, 0.25),
            signal(SignalSource::BehavioralBaseline, 0.72, 0.15),
        ];

        let composite = engine().fuse("staff-1", &signals, Utc::now()).unwrap();
        assert!(composite.correlation_bonus_applied);
        assert_eq!(composite.agreeing_sources.len(), 3);

        // Dropping one agreeing signal below the count removes the bonus
        let fewer = &signals[..2];
        let composite = engine().fuse("staff-1", fewer, Utc::now()).unwrap();
        assert!(!composite.correlation_bonus_applied);
    }

    #[test]
    fn test_bonus_capped_at_one() {
        let signals = vec![
            signal(SignalSource::TransactionAnalytics, 1.0, 0.25),
            signal(SignalSource::PresenceCorrelation, 1.0, 0.25),
            signal(SignalSource::CommunicationAnalysis, 1.0, 0.20),
        ];

        let composite = engine().fuse("staff-1", &signals, Utc::now()).unwrap();
        assert_eq!(composite.total, 1.0);
        assert_eq!(composite.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_subject_mismatch_rejected() {
        let signals = vec![signal(SignalSource::TrendForecast, 0.5, 0.15)];
        let result = engine().fuse("staff-2", &signals, Utc::now());
        assert!(matches!(result, Err(FusionError::SubjectMismatch { .. })));
    }

    proptest! {
        #[test]
        fn prop_normalized_in_unit_range(
            scores in proptest::collection::vec(0.0f64..=1.0, 0..5),
            weights in proptest::collection::vec(0.0f64..=2.0, 5),
        ) {
            let signals: Vec<Signal> = scores
                .iter()
                .zip(SignalSource::ALL.iter())
                .zip(weights.iter())
                .map(|((score, source), weight)| {
                    signal(*source, *score, *weight)
                })
                .collect();

            let composite = engine().fuse("staff-1", &signals, Utc::now()).unwrap();
            prop_assert!(composite.total >= 0.0);
            prop_assert!(composite.total <= 1.0);
        }

        #[test]
        fn prop_order_independent(
            scores in proptest::collection::vec(0.0f64..=1.0, 5),
        ) {
            let computed_at = Utc::now();
            let signals: Vec<Signal> = scores
                .iter()
                .zip(SignalSource::ALL.iter())
                .map(|(score, source)| signal(*source, *score, source.default_weight()))
                .collect();

            let mut reversed = signals.clone();
            reversed.reverse();

            let a = engine().fuse("staff-1", &signals, computed_at).unwrap();
            let b = engine().fuse("staff-1", &reversed, computed_at).unwrap();

            prop_assert_eq!(a.total, b.total);
            prop_assert_eq!(a.risk_level, b.risk_level);
            prop_assert_eq!(a.correlation_bonus_applied, b.correlation_bonus_applied);
            prop_assert_eq!(a.agreeing_sources, b.agreeing_sources);
            let a_sources: Vec<_> = a.contributing.iter().map(|s| s.source).collect();
            let b_sources: Vec<_> = b.contributing.iter().map(|s| s.source).collect();
            prop_assert_eq!(a_sources, b_sources);
        }
    }
}
