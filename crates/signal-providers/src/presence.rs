//! Presence correlation provider

use crate::feeds::PresenceFeed;
use crate::provider::{ProviderError, SignalProvider};
use async_trait::async_trait;
use chrono::Utc;
use event_correlator::{Correlator, CorrelatorConfig, MatchClass};
use signal_fusion::{Evidence, PresenceMismatch, Signal, SignalSource};
use std::sync::Arc;
use tracing::debug;

/// Presence provider configuration
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Lookback period in days
    pub lookback_days: u32,

    /// Correlator settings (window, confidence floor)
    pub correlator: CorrelatorConfig,

    /// Severity for a transaction with zero camera activity nearby
    pub ghost_severity: f64,

    /// Severity for a low-confidence best match
    pub low_confidence_severity: f64,

    /// Severity for multiple people at the till
    pub multi_candidate_severity: f64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            correlator: CorrelatorConfig::default(),
            ghost_severity: 0.9,
            low_confidence_severity: 0.5,
            multi_candidate_severity: 0.75,
        }
    }
}

/// Correlates till transactions against camera detections
pub struct PresenceCorrelationProvider {
    feed: Arc<dyn PresenceFeed>,
    correlator: Correlator,
    config: PresenceConfig,
    weight: f64,
}

impl PresenceCorrelationProvider {
    /// Create a provider; the correlator config is validated here
    pub fn new(
        feed: Arc<dyn PresenceFeed>,
        config: PresenceConfig,
        weight: f64,
    ) -> Result<Self, ProviderError> {
        let correlator =
            Correlator::new(config.correlator.clone()).map_err(|e| ProviderError::Validation {
                signal_source: SignalSource::PresenceCorrelation,
                reason: e.to_string(),
            })?;
        Ok(Self {
            feed,
            correlator,
            config,
            weight,
        })
    }

    fn severity_for(&self, classification: MatchClass) -> f64 {
        match classification {
            MatchClass::Matched => 0.0,
            MatchClass::Ghost => self.config.ghost_severity,
            MatchClass::LowConfidence => self.config.low_confidence_severity,
            MatchClass::MultiCandidate => self.config.multi_candidate_severity,
        }
    }
}

#[async_trait]
impl SignalProvider for PresenceCorrelationProvider {
    fn source(&self) -> SignalSource {
        SignalSource::PresenceCorrelation
    }

    async fn produce(&self, subject_id: &str) -> Result<Signal, ProviderError> {
        let unavailable = |reason: String| ProviderError::Unavailable {
            signal_source: SignalSource::PresenceCorrelation,
            reason,
        };

        let anchors = self
            .feed
            .till_events(subject_id, self.config.lookback_days)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if anchors.is_empty() {
            return Err(unavailable(
                "no till events in lookback period".to_string(),
            ));
        }

        let candidates = self
            .feed
            .camera_events(subject_id, self.config.lookback_days)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let mut mismatches = Vec::new();
        let mut severity_sum = 0.0;
        let mut confirmed = 0usize;

        for anchor in &anchors {
            let result = self
                .correlator
                .correlate(anchor, &candidates)
                .map_err(|e| ProviderError::Validation {
                    signal_source: SignalSource::PresenceCorrelation,
                    reason: e.to_string(),
                })?;

            let severity = self.severity_for(result.classification);
            severity_sum += severity;

            if result.is_confirmed() {
                confirmed += 1;
            } else {
                mismatches.push(PresenceMismatch {
                    classification: result.classification,
                    description: match result.classification {
                        MatchClass::Ghost => {
                            format!("transaction {} with no camera detection", anchor.event_id)
                        }
                        MatchClass::LowConfidence => format!(
                            "transaction {} matched only a low-confidence detection",
                            anchor.event_id
                        ),
                        MatchClass::MultiCandidate => format!(
                            "multiple people at the till during transaction {}",
                            anchor.event_id
                        ),
                        MatchClass::Matched => String::new(),
                    },
                    severity,
                    occurred_at: anchor.timestamp,
                });
            }
        }

        let score = (severity_sum / anchors.len() as f64).clamp(0.0, 1.0);
        let confidence = (anchors.len() as f64 / 20.0).clamp(0.5, 0.95);

        debug!(
            subject_id,
            score,
            checked = anchors.len(),
            confirmed,
            "presence correlation signal"
        );

        Signal::new(
            self.source(),
            subject_id,
            score,
            confidence,
            self.weight,
            Some(Evidence::Presence {
                mismatches,
                events_checked: anchors.len(),
                events_confirmed: confirmed,
            }),
            Utc::now(),
        )
        .map_err(|e| ProviderError::Validation {
            signal_source: SignalSource::PresenceCorrelation,
            reason: e.to_string(),
        })
    }
}
