//! Pipeline composition

use crate::OrchestratorError;
use alert_throttle::{AlertDecision, ThrottleGate};
use chrono::{Datelike, Utc};
use investigation::{InvestigationPackage, PackageBuilder};
use metrics::counter;
use serde::{Deserialize, Serialize};
use signal_fusion::{CompositeScore, Evidence, FusionEngine, Signal, SignalSource};
use signal_providers::{ProviderError, SignalProvider};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::{Repository, RiskSample};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Deadline applied to every provider call
    pub provider_deadline: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider_deadline: Duration::from_secs(10),
        }
    }
}

/// A provider that failed to contribute, and why
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradedSource {
    /// Which source degraded
    pub source: SignalSource,
    /// Human-readable reason
    pub reason: String,
}

/// Result of one subject's analysis run
#[derive(Debug, Clone)]
pub struct SubjectAnalysis {
    /// The fused composite score
    pub composite: CompositeScore,

    /// Throttle gate decision
    pub decision: AlertDecision,

    /// Evidence bundle, present only when the alert fired
    pub package: Option<InvestigationPackage>,

    /// Sources that could not contribute this run
    pub degraded_sources: Vec<DegradedSource>,

    /// Persistence failures; the composite above is still authoritative
    /// and the caller may retry the writes without recomputation
    pub persistence_errors: Vec<String>,
}

/// Outcome counts for a batch sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    /// Subjects analyzed to completion
    pub analyzed: usize,
    /// Alerts that fired
    pub alerts_fired: usize,
    /// Alerts suppressed by the gate
    pub throttled: usize,
    /// Subjects whose analysis failed outright
    pub failed: usize,
    /// Whether the sweep was cancelled before finishing
    pub cancelled: bool,
}

/// Composes providers, fusion, throttling, and packaging
pub struct Orchestrator {
    providers: Vec<Arc<dyn SignalProvider>>,
    fusion: FusionEngine,
    gate: ThrottleGate,
    builder: PackageBuilder,
    repository: Arc<Repository>,
    config: AnalysisConfig,
}

impl Orchestrator {
    /// Create an orchestrator, seeding the gate from persisted state
    pub fn new(
        providers: Vec<Arc<dyn SignalProvider>>,
        fusion: FusionEngine,
        gate: ThrottleGate,
        builder: PackageBuilder,
        repository: Arc<Repository>,
        config: AnalysisConfig,
    ) -> Result<Self, OrchestratorError> {
        if let Ok(states) = repository.load_throttle_states() {
            gate.restore(states)?;
        }
        info!(providers = providers.len(), "creating orchestrator");
        Ok(Self {
            providers,
            fusion,
            gate,
            builder,
            repository,
            config,
        })
    }

    /// Run the full pipeline for one subject.
    ///
    /// A provider failure degrades that one signal and never aborts
    /// fusion for the others; a subject with no usable signals yields
    /// a Low-risk, no-alert result.
    pub async fn analyze_subject(
        &self,
        subject_id: &str,
    ) -> Result<SubjectAnalysis, OrchestratorError> {
        let (signals, degraded) = self.gather_signals(subject_id).await;

        let now = Utc::now();
        let composite = self.fusion.fuse(subject_id, &signals, now)?;
        counter!("fraud_analyses_total").increment(1);

        let mut persistence_errors = Vec::new();
        if let Err(e) = self.repository.save_composite(composite.clone()) {
            error!(subject_id, error = %e, "failed to persist composite");
            persistence_errors.push(e.to_string());
        }
        let week_index = i64::from(now.iso_week().year()) * 100 + i64::from(now.iso_week().week());
        if let Err(e) = self.repository.push_risk_sample(
            subject_id,
            RiskSample {
                week_index,
                score: composite.total,
                recorded_at: now,
            },
        ) {
            error!(subject_id, error = %e, "failed to persist risk sample");
            persistence_errors.push(e.to_string());
        }

        let decision = self.gate.check_and_set(&composite, now)?;
        if let Err(e) = self.repository.save_throttle_state(decision.state.clone()) {
            error!(subject_id, error = %e, "failed to persist throttle state");
            persistence_errors.push(e.to_string());
        }

        let package = if decision.allow {
            counter!("fraud_alerts_fired_total").increment(1);
            let evidence = Self::evidence_by_source(&composite);
            let package = self.builder.build(subject_id, &composite, &evidence);
            if let Err(e) = self.repository.save_package(package.clone()) {
                error!(subject_id, error = %e, "failed to persist package");
                persistence_errors.push(e.to_string());
            }
            Some(package)
        } else {
            // Suppressed alerts are logged, never silently dropped
            if !matches!(
                decision.outcome,
                alert_throttle::ThrottleOutcome::BelowThreshold
            ) {
                counter!("fraud_alerts_throttled_total").increment(1);
                warn!(
                    subject_id,
                    risk_level = composite.risk_level.as_str(),
                    "alert throttled"
                );
            }
            None
        };

        Ok(SubjectAnalysis {
            composite,
            decision,
            package,
            degraded_sources: degraded,
            persistence_errors,
        })
    }

    /// Analyze a batch of subjects in parallel.
    ///
    /// Each subject runs on its own task; cancellation aborts subjects
    /// still in flight and discards their partial signals, never fusing
    /// them partially.
    pub async fn sweep(
        self: &Arc<Self>,
        subjects: Vec<String>,
        cancel: CancellationToken,
    ) -> SweepReport {
        let mut report = SweepReport::default();
        let mut tasks = JoinSet::new();

        for subject_id in subjects {
            let orchestrator = Arc::clone(self);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
                    result = orchestrator.analyze_subject(&subject_id) => result,
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(analysis)) => {
                    report.analyzed += 1;
                    if analysis.decision.allow {
                        report.alerts_fired += 1;
                    } else if !matches!(
                        analysis.decision.outcome,
                        alert_throttle::ThrottleOutcome::BelowThreshold
                    ) {
                        report.throttled += 1;
                    }
                }
                Ok(Err(OrchestratorError::Cancelled)) => {
                    report.cancelled = true;
                }
                Ok(Err(e)) => {
                    error!(error = %e, "subject analysis failed");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "analysis task panicked");
                    report.failed += 1;
                }
            }
        }

        info!(
            analyzed = report.analyzed,
            alerts = report.alerts_fired,
            throttled = report.throttled,
            failed = report.failed,
            cancelled = report.cancelled,
            "sweep complete"
        );
        report
    }

    /// Run every provider concurrently under the configured deadline
    async fn gather_signals(&self, subject_id: &str) -> (Vec<Signal>, Vec<DegradedSource>) {
        let mut tasks = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let subject = subject_id.to_string();
            let deadline = self.config.provider_deadline;
            tasks.spawn(async move {
                let source = provider.source();
                match tokio::time::timeout(deadline, provider.produce(&subject)).await {
                    Ok(result) => (source, result),
                    Err(_) => (
                        source,
                        Err(ProviderError::Timeout {
                            signal_source: source,
                            deadline_ms: deadline.as_millis() as u64,
                        }),
                    ),
                }
            });
        }

        let mut signals = Vec::new();
        let mut degraded = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(signal))) => signals.push(signal),
                Ok((source, Err(e))) => {
                    warn!(subject_id, source = source.as_str(), error = %e, "signal degraded");
                    counter!("fraud_signals_degraded_total").increment(1);
                    degraded.push(DegradedSource {
                        source,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(subject_id, error = %e, "provider task panicked");
                }
            }
        }

        (signals, degraded)
    }

    fn evidence_by_source(composite: &CompositeScore) -> HashMap<SignalSource, Evidence> {
        composite
            .contributing
            .iter()
            .filter_map(|signal| {
                signal
                    .evidence
                    .clone()
                    .map(|evidence| (signal.source, evidence))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_throttle::ThrottlePolicy;
    use async_trait::async_trait;
    use signal_fusion::FusionConfig;

    /// Provider returning a fixed score
    struct FixedProvider {
        source: SignalSource,
        score: f64,
    }

    #[async_trait]
    impl SignalProvider for FixedProvider {
        fn source(&self) -> SignalSource {
            self.source
        }

        async fn produce(&self, subject_id: &str) -> Result<Signal, ProviderError> {
            Signal::new(
                self.source,
                subject_id,
                self.score,
                0.9,
                self.source.default_weight(),
                None,
                Utc::now(),
            )
            .map_err(|e| ProviderError::Validation {
                signal_source: self.source,
                reason: e.to_string(),
            })
        }
    }

    /// Provider that never finishes
    struct StalledProvider;

    #[async_trait]
    impl SignalProvider for StalledProvider {
        fn source(&self) -> SignalSource {
            SignalSource::CommunicationAnalysis
        }

        async fn produce(&self, _subject_id: &str) -> Result<Signal, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("stalled provider never completes");
        }
    }

    fn orchestrator(providers: Vec<Arc<dyn SignalProvider>>) -> Arc<Orchestrator> {
        let orchestrator = Orchestrator::new(
            providers,
            FusionEngine::new(FusionConfig::default()).unwrap(),
            ThrottleGate::new(ThrottlePolicy::default()).unwrap(),
            PackageBuilder::default(),
            Arc::new(Repository::new()),
            AnalysisConfig {
                provider_deadline: Duration::from_millis(50),
            },
        )
        .unwrap();
        Arc::new(orchestrator)
    }

    #[tokio::test]
    async fn test_high_risk_subject_fires_alert_with_package() {
        let orchestrator = orchestrator(vec![
            Arc::new(FixedProvider {
                source: SignalSource::TransactionAnalytics,
                score: 0.9,
            }),
            Arc::new(FixedProvider {
                source: SignalSource::PresenceCorrelation,
                score: 0.85,
            }),
            Arc::new(FixedProvider {
                source: SignalSource::BehavioralBaseline,
                score: 0.8,
            }),
        ]);

        let analysis = orchestrator.analyze_subject("staff-1").await.unwrap();

        assert!(analysis.composite.correlation_bonus_applied);
        assert!(analysis.decision.allow);
        assert!(analysis.package.is_some());
        assert!(analysis.persistence_errors.is_empty());
        assert_eq!(
            orchestrator.repository.latest_composite("staff-1").unwrap().total,
            analysis.composite.total
        );
    }

    #[tokio::test]
    async fn test_stalled_provider_degrades_not_aborts() {
        let orchestrator = orchestrator(vec![
            Arc::new(FixedProvider {
                source: SignalSource::TransactionAnalytics,
                score: 0.6,
            }),
            Arc::new(StalledProvider),
        ]);

        let analysis = orchestrator.analyze_subject("staff-1").await.unwrap();

        assert_eq!(analysis.composite.contributing.len(), 1);
        assert_eq!(analysis.degraded_sources.len(), 1);
        assert_eq!(
            analysis.degraded_sources[0].source,
            SignalSource::CommunicationAnalysis
        );
    }

    #[tokio::test]
    async fn test_no_signals_is_low_risk_no_alert() {
        let orchestrator = orchestrator(vec![Arc::new(StalledProvider)]);

        let analysis = orchestrator.analyze_subject("staff-1").await.unwrap();

        assert_eq!(analysis.composite.total, 0.0);
        assert_eq!(
            analysis.composite.risk_level,
            score_bands::RiskLevel::Low
        );
        assert!(!analysis.decision.allow);
        assert!(analysis.package.is_none());
    }

    #[tokio::test]
    async fn test_second_analysis_throttled() {
        let orchestrator = orchestrator(vec![Arc::new(FixedProvider {
            source: SignalSource::TransactionAnalytics,
            score: 0.95,
        })]);

        let first = orchestrator.analyze_subject("staff-1").await.unwrap();
        assert!(first.decision.allow);

        let second = orchestrator.analyze_subject("staff-1").await.unwrap();
        assert!(!second.decision.allow);
        assert!(second.package.is_none());
    }

    #[tokio::test]
    async fn test_sweep_counts_outcomes() {
        let orchestrator = orchestrator(vec![Arc::new(FixedProvider {
            source: SignalSource::TransactionAnalytics,
            score: 0.95,
        })]);

        let report = orchestrator
            .sweep(
                vec!["staff-1".to_string(), "staff-2".to_string()],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(report.analyzed, 2);
        assert_eq!(report.alerts_fired, 2);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_sweep_discards_partial_subjects() {
        let orchestrator = orchestrator(vec![Arc::new(StalledProvider)]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = orchestrator
            .sweep(vec!["staff-1".to_string()], cancel)
            .await;

        assert!(report.cancelled);
        assert_eq!(report.analyzed, 0);
    }
}
