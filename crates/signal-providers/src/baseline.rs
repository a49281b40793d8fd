//! Behavioral baseline provider

use crate::feeds::BaselineStore;
use crate::provider::{ProviderError, SignalProvider};
use async_trait::async_trait;
use chrono::Utc;
use deviation_scorer::{DeviationError, DeviationScorer};
use signal_fusion::{Evidence, MetricDeviation, Signal, SignalSource};
use std::sync::Arc;
use tracing::debug;

/// Scores current metrics against the subject's learned baselines.
///
/// Dimensions with thin or expired baselines are skipped; if none
/// remain usable the whole signal is unavailable, never zero.
pub struct BehavioralBaselineProvider {
    store: Arc<dyn BaselineStore>,
    scorer: DeviationScorer,
    weight: f64,
}

impl BehavioralBaselineProvider {
    pub fn new(store: Arc<dyn BaselineStore>, scorer: DeviationScorer, weight: f64) -> Self {
        Self {
            store,
            scorer,
            weight,
        }
    }
}

#[async_trait]
impl SignalProvider for BehavioralBaselineProvider {
    fn source(&self) -> SignalSource {
        SignalSource::BehavioralBaseline
    }

    async fn produce(&self, subject_id: &str) -> Result<Signal, ProviderError> {
        let unavailable = |reason: String| ProviderError::Unavailable {
            signal_source: SignalSource::BehavioralBaseline,
            reason,
        };

        let profile = self
            .store
            .profile(subject_id)
            .await
            .map_err(|e| unavailable(e.to_string()))?
            .ok_or_else(|| unavailable("no baseline profile learned yet".to_string()))?;

        let metrics = self
            .store
            .current_metrics(subject_id)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let now = Utc::now();
        let mut deviations = Vec::new();
        let mut normalized_sum = 0.0;

        for (dimension, baseline) in &profile.dimensions {
            let Some(current) = metrics.get(dimension) else {
                continue;
            };

            if baseline.ensure_valid(dimension, now).is_err() {
                debug!(subject_id, dimension, "skipping expired baseline");
                continue;
            }

            match self.scorer.score(*current, baseline) {
                Ok(deviation) => {
                    normalized_sum += deviation.normalized(self.scorer.saturation_sigma());
                    deviations.push(MetricDeviation {
                        metric: dimension.clone(),
                        sigma: deviation.sigma,
                        severity: deviation.severity,
                        current: *current,
                        baseline_mean: baseline.mean,
                    });
                }
                Err(DeviationError::InsufficientData { .. }) => {
                    debug!(subject_id, dimension, "skipping thin baseline");
                }
                Err(e) => {
                    return Err(ProviderError::Validation {
                        signal_source: SignalSource::BehavioralBaseline,
                        reason: e.to_string(),
                    })
                }
            }
        }

        if deviations.is_empty() {
            return Err(unavailable(
                "no baseline dimension had enough samples".to_string(),
            ));
        }

        let score = (normalized_sum / deviations.len() as f64).clamp(0.0, 1.0);
        let confidence = (deviations.len() as f64 / 6.0).clamp(0.5, 0.9);

        debug!(
            subject_id,
            score,
            dimensions = deviations.len(),
            "behavioral baseline signal"
        );

        Signal::new(
            self.source(),
            subject_id,
            score,
            confidence,
            self.weight,
            Some(Evidence::Baseline { deviations }),
            Utc::now(),
        )
        .map_err(|e| ProviderError::Validation {
            signal_source: SignalSource::BehavioralBaseline,
            reason: e.to_string(),
        })
    }
}
