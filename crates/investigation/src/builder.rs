//! Package assembly

use chrono::{DateTime, Utc};
use score_bands::RiskLevel;
use serde::{Deserialize, Serialize};
use signal_fusion::{CompositeScore, Evidence, SignalSource};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// One contributing signal, ranked by what it added to the composite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSignal {
    /// Source of the signal
    pub source: SignalSource,

    /// Normalized score
    pub score: f64,

    /// Source confidence
    pub confidence: f64,

    /// Fusion weight
    pub weight: f64,

    /// score x weight - what actually drove the composite
    pub contribution: f64,

    /// Evidence backing the signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

/// Ranked, human-readable evidence bundle for one subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationPackage {
    /// Package id
    pub package_id: Uuid,

    /// Subject under investigation
    pub subject_id: String,

    /// When the package was assembled
    pub generated_at: DateTime<Utc>,

    /// Composite score that triggered the package
    pub composite_total: f64,

    /// Banded risk level
    pub risk_level: RiskLevel,

    /// Plain-language severity label
    pub severity_label: String,

    /// Executive summary paragraph
    pub executive_summary: String,

    /// Top contributing signals, highest contribution first
    pub ranked_signals: Vec<RankedSignal>,

    /// Whether the correlation bonus applied, and which sources agreed
    pub correlation_bonus_applied: bool,
    pub agreeing_sources: Vec<SignalSource>,

    /// Recommended investigation actions
    pub recommended_actions: Vec<String>,
}

/// Builds investigation packages from composite scores and evidence
pub struct PackageBuilder {
    /// How many contributing signals the package foregrounds
    top_n: usize,
}

impl PackageBuilder {
    /// Create a builder keeping the top `top_n` signals
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n: top_n.max(1),
        }
    }

    /// Assemble a package for a subject that crossed the alert threshold.
    ///
    /// Signals are ranked by contribution (score x weight), not raw
    /// score, so the package foregrounds what actually drove the number.
    pub fn build(
        &self,
        subject_id: &str,
        composite: &CompositeScore,
        evidence_by_source: &HashMap<SignalSource, Evidence>,
    ) -> InvestigationPackage {
        let mut ranked: Vec<RankedSignal> = composite
            .contributing
            .iter()
            .map(|signal| RankedSignal {
                source: signal.source,
                score: signal.score,
                confidence: signal.confidence,
                weight: signal.weight,
                contribution: signal.contribution(),
                evidence: evidence_by_source
                    .get(&signal.source)
                    .cloned()
                    .or_else(|| signal.evidence.clone()),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.contribution
                .total_cmp(&a.contribution)
                .then_with(|| a.source.cmp(&b.source))
        });
        ranked.truncate(self.top_n);

        let package = InvestigationPackage {
            package_id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            generated_at: Utc::now(),
            composite_total: composite.total,
            risk_level: composite.risk_level,
            severity_label: composite.risk_level.label().to_string(),
            executive_summary: Self::summarize(subject_id, composite, &ranked),
            ranked_signals: ranked,
            correlation_bonus_applied: composite.correlation_bonus_applied,
            agreeing_sources: composite.agreeing_sources.clone(),
            recommended_actions: Self::actions(composite),
        };

        info!(
            subject_id,
            package_id = %package.package_id,
            signals = package.ranked_signals.len(),
            "assembled investigation package"
        );
        package
    }

    fn summarize(subject_id: &str, composite: &CompositeScore, ranked: &[RankedSignal]) -> String {
        let mut summary = format!(
            "Subject {} scored {:.3} ({}) across {} contributing sources.",
            subject_id,
            composite.total,
            composite.risk_level.as_str(),
            composite.contributing.len(),
        );

        if let Some(top) = ranked.first() {
            summary.push_str(&format!(
                " Primary driver: {} at score {:.2} (contribution {:.3}).",
                top.source.as_str(),
                top.score,
                top.contribution,
            ));
        }

        if composite.correlation_bonus_applied {
            let names: Vec<&str> = composite
                .agreeing_sources
                .iter()
                .map(|s| s.as_str())
                .collect();
            summary.push_str(&format!(
                " Independent sources agree at high risk: {}.",
                names.join(", ")
            ));
        }

        summary
    }

    fn actions(composite: &CompositeScore) -> Vec<String> {
        let mut actions = Vec::new();

        match composite.risk_level {
            RiskLevel::Critical => {
                actions.push("Contact security and management immediately".to_string());
                actions.push("Preserve camera footage for the review period".to_string());
            }
            RiskLevel::High => {
                actions.push("Schedule a formal investigation within one week".to_string());
                actions.push("Pull transaction logs for the flagged period".to_string());
            }
            _ => {
                actions.push("Continue monitoring on the next analysis cycle".to_string());
            }
        }

        if composite.correlation_bonus_applied {
            actions.push("Cross-reference evidence between the agreeing sources".to_string());
        }

        actions
    }
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_fusion::{FusionConfig, FusionEngine, Signal, TransactionIndicator};

    fn signal(source: SignalSource, score: f64, weight: f64) -> Signal {
        Signal::new(source, "staff-1", score, 0.9, weight, None, Utc::now()).unwrap()
    }

    fn fused(signals: &[Signal]) -> CompositeScore {
        FusionEngine::new(FusionConfig::default())
            .unwrap()
            .fuse("staff-1", signals, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_ranked_by_contribution_not_raw_score() {
        // Higher raw score but tiny weight must rank below a weighted signal
        let signals = vec![
            signal(SignalSource::TrendForecast, 0.9, 0.05),
            signal(SignalSource::TransactionAnalytics, 0.6, 0.25),
        ];
        let composite = fused(&signals);

        let package =
            PackageBuilder::default().build("staff-1", &composite, &HashMap::new());

        assert_eq!(
            package.ranked_signals[0].source,
            SignalSource::TransactionAnalytics
        );
        assert_eq!(package.ranked_signals[1].source, SignalSource::TrendForecast);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let signals = vec![
            signal(SignalSource::TransactionAnalytics, 0.8, 0.25),
            signal(SignalSource::PresenceCorrelation, 0.7, 0.25),
            signal(SignalSource::CommunicationAnalysis, 0.6, 0.20),
            signal(SignalSource::BehavioralBaseline, 0.5, 0.15),
        ];
        let composite = fused(&signals);

        let package = PackageBuilder::new(2).build("staff-1", &composite, &HashMap::new());
        assert_eq!(package.ranked_signals.len(), 2);
    }

    #[test]
    fn test_evidence_map_preferred_over_signal_evidence() {
        let signals = vec![signal(SignalSource::TransactionAnalytics, 0.8, 0.25)];
        let composite = fused(&signals);

        let mut evidence = HashMap::new();
        evidence.insert(
            SignalSource::TransactionAnalytics,
            Evidence::Transactions {
                indicators: vec![TransactionIndicator {
                    kind: "excessive_voids".to_string(),
                    description: "14 voids in 7 days".to_string(),
                    severity: 0.8,
                }],
            },
        );

        let package = PackageBuilder::default().build("staff-1", &composite, &evidence);
        let attached = package.ranked_signals[0].evidence.as_ref().unwrap();
        assert_eq!(attached.item_count(), 1);
    }

    #[test]
    fn test_summary_names_agreeing_sources() {
        let signals = vec![
            signal(SignalSource::TransactionAnalytics, 0.8, 0.25),
            signal(SignalSource::PresenceCorrelation, 0.75, 0.25),
            signal(SignalSource::BehavioralBaseline, 0.72, 0.15),
        ];
        let composite = fused(&signals);
        assert!(composite.correlation_bonus_applied);

        let package = PackageBuilder::default().build("staff-1", &composite, &HashMap::new());
        assert!(package.executive_summary.contains("presence_correlation"));
        assert!(package.correlation_bonus_applied);
    }
}
