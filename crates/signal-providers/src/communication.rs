//! Communication analysis provider.
//!
//! Communication risk is computed by an external inference service;
//! this provider only submits, polls within a deadline, and maps the
//! verdict into a Signal.

use crate::inference::{
    await_verdict, InferenceError, InferencePipeline, InferenceRequest,
};
use crate::provider::{ProviderError, SignalProvider};
use async_trait::async_trait;
use chrono::Utc;
use signal_fusion::{Evidence, Signal, SignalSource};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Communication provider configuration
#[derive(Debug, Clone)]
pub struct CommunicationConfig {
    /// Analysis kind requested from the service
    pub analysis_kind: String,

    /// Deadline for the whole submit/poll exchange
    pub deadline: Duration,

    /// Interval between polls
    pub poll_interval: Duration,
}

impl Default for CommunicationConfig {
    fn default() -> Self {
        Self {
            analysis_kind: "communication_risk".to_string(),
            deadline: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Wraps the inference service as a signal source
pub struct CommunicationAnalysisProvider {
    pipeline: Arc<dyn InferencePipeline>,
    config: CommunicationConfig,
    cancel: CancellationToken,
    weight: f64,
}

impl CommunicationAnalysisProvider {
    pub fn new(
        pipeline: Arc<dyn InferencePipeline>,
        config: CommunicationConfig,
        cancel: CancellationToken,
        weight: f64,
    ) -> Self {
        Self {
            pipeline,
            config,
            cancel,
            weight,
        }
    }
}

#[async_trait]
impl SignalProvider for CommunicationAnalysisProvider {
    fn source(&self) -> SignalSource {
        SignalSource::CommunicationAnalysis
    }

    async fn produce(&self, subject_id: &str) -> Result<Signal, ProviderError> {
        let request = InferenceRequest {
            subject_id: subject_id.to_string(),
            analysis_kind: self.config.analysis_kind.clone(),
        };

        let verdict = await_verdict(
            self.pipeline.as_ref(),
            request,
            self.config.deadline,
            self.config.poll_interval,
            &self.cancel,
        )
        .await
        .map_err(|e| match e {
            InferenceError::DeadlineExceeded { deadline_ms } => ProviderError::Timeout {
                signal_source: SignalSource::CommunicationAnalysis,
                deadline_ms,
            },
            InferenceError::Cancelled => ProviderError::Cancelled {
                signal_source: SignalSource::CommunicationAnalysis,
            },
            other => ProviderError::Unavailable {
                signal_source: SignalSource::CommunicationAnalysis,
                reason: other.to_string(),
            },
        })?;

        debug!(
            subject_id,
            score = verdict.risk_score,
            flagged = verdict.flagged.len(),
            "communication analysis signal"
        );

        Signal::new(
            self.source(),
            subject_id,
            verdict.risk_score,
            verdict.confidence,
            self.weight,
            Some(Evidence::Communications {
                flagged: verdict.flagged,
            }),
            Utc::now(),
        )
        .map_err(|e| ProviderError::Validation {
            signal_source: SignalSource::CommunicationAnalysis,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceVerdict;
    use crate::memory::StaticInferencePipeline;
    use signal_fusion::FlaggedMessage;

    fn config(deadline_ms: u64) -> CommunicationConfig {
        CommunicationConfig {
            analysis_kind: "communication_risk".to_string(),
            deadline: Duration::from_millis(deadline_ms),
            poll_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_verdict_becomes_signal() {
        let pipeline = StaticInferencePipeline::new(1);
        pipeline.set_verdict(
            "staff-1",
            InferenceVerdict {
                risk_score: 0.65,
                confidence: 0.8,
                flagged: vec![FlaggedMessage {
                    channel: "sms".to_string(),
                    excerpt: "meet after close".to_string(),
                    risk_score: 0.7,
                    observed_at: Utc::now(),
                }],
            },
        );

        let provider = CommunicationAnalysisProvider::new(
            Arc::new(pipeline),
            config(1_000),
            CancellationToken::new(),
            0.20,
        );

        let signal = provider.produce("staff-1").await.unwrap();
        assert!((signal.score - 0.65).abs() < 1e-9);
        assert_eq!(signal.evidence.as_ref().unwrap().item_count(), 1);
    }

    #[tokio::test]
    async fn test_stalled_service_degrades_to_timeout() {
        let pipeline = StaticInferencePipeline::new(u32::MAX);
        let provider = CommunicationAnalysisProvider::new(
            Arc::new(pipeline),
            config(10),
            CancellationToken::new(),
            0.20,
        );

        let result = provider.produce("staff-1").await;
        assert!(matches!(result, Err(ProviderError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_run_propagates() {
        let pipeline = StaticInferencePipeline::new(u32::MAX);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let provider = CommunicationAnalysisProvider::new(
            Arc::new(pipeline),
            config(1_000),
            cancel,
            0.20,
        );

        let result = provider.produce("staff-1").await;
        assert!(matches!(result, Err(ProviderError::Cancelled { .. })));
    }
}
