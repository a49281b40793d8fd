//! Trend forecast provider

use crate::feeds::RiskHistoryFeed;
use crate::provider::{ProviderError, SignalProvider};
use async_trait::async_trait;
use chrono::Utc;
use signal_fusion::{Evidence, Signal, SignalSource};
use std::sync::Arc;
use tracing::debug;
use trend_projector::{TrendError, TrendProjector};

/// Forecast provider configuration
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Weeks of history to request
    pub history_weeks: u32,

    /// Projection horizon in weeks
    pub horizon_weeks: i64,

    /// Risk level used for the ETA estimate
    pub high_risk_threshold: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            history_weeks: 12,
            horizon_weeks: 4,
            high_risk_threshold: 0.70,
        }
    }
}

/// Projects a subject's risk trajectory from weekly history
pub struct TrendForecastProvider {
    feed: Arc<dyn RiskHistoryFeed>,
    projector: TrendProjector,
    config: ForecastConfig,
    weight: f64,
}

impl TrendForecastProvider {
    pub fn new(
        feed: Arc<dyn RiskHistoryFeed>,
        projector: TrendProjector,
        config: ForecastConfig,
        weight: f64,
    ) -> Self {
        Self {
            feed,
            projector,
            config,
            weight,
        }
    }
}

#[async_trait]
impl SignalProvider for TrendForecastProvider {
    fn source(&self) -> SignalSource {
        SignalSource::TrendForecast
    }

    async fn produce(&self, subject_id: &str) -> Result<Signal, ProviderError> {
        let history = self
            .feed
            .weekly_risk(subject_id, self.config.history_weeks)
            .await
            .map_err(|e| ProviderError::Unavailable {
                signal_source: SignalSource::TrendForecast,
                reason: e.to_string(),
            })?;

        let projection = match self.projector.project(&history, self.config.horizon_weeks) {
            Ok(projection) => projection,
            Err(TrendError::InsufficientHistory { points }) => {
                return Err(ProviderError::Unavailable {
                    signal_source: SignalSource::TrendForecast,
                    reason: format!("only {} weeks of history, 2 required", points),
                })
            }
            Err(e) => {
                return Err(ProviderError::Validation {
                    signal_source: SignalSource::TrendForecast,
                    reason: e.to_string(),
                })
            }
        };

        let weeks_to_high_risk = projection.eta_to(self.config.high_risk_threshold);
        let mut indicators = Vec::new();
        if projection.slope > 0.0 {
            indicators.push(format!(
                "risk increasing by {:.3} per week",
                projection.slope
            ));
        }
        if let Some(weeks) = weeks_to_high_risk {
            indicators.push(format!(
                "projected to reach high risk in {} weeks",
                weeks
            ));
        }

        let score = projection.projected_value.clamp(0.0, 1.0);
        let confidence = (0.4 + 0.05 * history.len() as f64).clamp(0.4, 0.9);

        debug!(
            subject_id,
            score,
            slope = projection.slope,
            "trend forecast signal"
        );

        Signal::new(
            self.source(),
            subject_id,
            score,
            confidence,
            self.weight,
            Some(Evidence::Forecast {
                slope_per_week: projection.slope,
                projected_risk: projection.projected_value,
                weeks_to_high_risk,
                indicators,
            }),
            Utc::now(),
        )
        .map_err(|e| ProviderError::Validation {
            signal_source: SignalSource::TrendForecast,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRiskHistory;

    fn provider(feed: InMemoryRiskHistory) -> TrendForecastProvider {
        TrendForecastProvider::new(
            Arc::new(feed),
            TrendProjector::default(),
            ForecastConfig::default(),
            0.15,
        )
    }

    #[tokio::test]
    async fn test_rising_trend_projects_forward() {
        let feed = InMemoryRiskHistory::new();
        feed.insert(
            "staff-1",
            vec![(1, 0.2), (2, 0.3), (3, 0.4), (4, 0.5)],
        );

        let signal = provider(feed).produce("staff-1").await.unwrap();

        // slope 0.1/week, current 0.5, horizon 4 -> 0.9
        assert!((signal.score - 0.9).abs() < 1e-9);
        let Some(Evidence::Forecast {
            weeks_to_high_risk, ..
        }) = &signal.evidence
        else {
            panic!("expected forecast evidence");
        };
        assert_eq!(*weeks_to_high_risk, Some(2));
    }

    #[tokio::test]
    async fn test_short_history_is_unavailable() {
        let feed = InMemoryRiskHistory::new();
        feed.insert("staff-1", vec![(1, 0.2)]);

        let result = provider(feed).produce("staff-1").await;
        assert!(matches!(result, Err(ProviderError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_flat_trend_has_no_eta() {
        let feed = InMemoryRiskHistory::new();
        feed.insert("staff-1", vec![(1, 0.3), (2, 0.3), (3, 0.3)]);

        let signal = provider(feed).produce("staff-1").await.unwrap();
        let Some(Evidence::Forecast {
            weeks_to_high_risk, ..
        }) = &signal.evidence
        else {
            panic!("expected forecast evidence");
        };
        assert_eq!(*weeks_to_high_risk, None);
    }
}
