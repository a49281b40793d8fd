//! Transaction analytics provider

use crate::feeds::{TransactionActivity, TransactionFeed};
use crate::provider::{ProviderError, SignalProvider};
use async_trait::async_trait;
use chrono::Utc;
use signal_fusion::{Evidence, Signal, SignalSource, TransactionIndicator};
use std::sync::Arc;
use tracing::debug;

/// Thresholds for transaction anomaly indicators
#[derive(Debug, Clone)]
pub struct TransactionRules {
    /// Lookback period in days
    pub lookback_days: u32,

    /// Void rate (voids / transactions) above which voids are flagged
    pub void_rate_warn: f64,

    /// Refund rate above which refunds are flagged
    pub refund_rate_warn: f64,

    /// Average discount percentage above which discounting is flagged
    pub discount_warn_pct: f64,

    /// After-hours transaction count above which activity is flagged
    pub after_hours_warn: u32,
}

impl Default for TransactionRules {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            void_rate_warn: 0.05,
            refund_rate_warn: 0.05,
            discount_warn_pct: 20.0,
            after_hours_warn: 5,
        }
    }
}

/// Scores register activity against the rule thresholds
pub struct TransactionAnalyticsProvider {
    feed: Arc<dyn TransactionFeed>,
    rules: TransactionRules,
    weight: f64,
}

impl TransactionAnalyticsProvider {
    pub fn new(feed: Arc<dyn TransactionFeed>, rules: TransactionRules, weight: f64) -> Self {
        Self {
            feed,
            rules,
            weight,
        }
    }

    fn indicators(&self, activity: &TransactionActivity) -> Vec<TransactionIndicator> {
        let mut indicators = Vec::new();
        let total = activity.total_transactions as f64;

        let void_rate = activity.voids as f64 / total;
        if void_rate >= self.rules.void_rate_warn {
            indicators.push(TransactionIndicator {
                kind: "excessive_voids".to_string(),
                description: format!(
                    "{} voids in {} transactions ({:.1}%)",
                    activity.voids,
                    activity.total_transactions,
                    void_rate * 100.0
                ),
                severity: (void_rate / (self.rules.void_rate_warn * 4.0)).clamp(0.4, 1.0),
            });
        }

        let refund_rate = activity.refunds as f64 / total;
        if refund_rate >= self.rules.refund_rate_warn {
            indicators.push(TransactionIndicator {
                kind: "excessive_refunds".to_string(),
                description: format!(
                    "{} refunds in {} transactions ({:.1}%)",
                    activity.refunds,
                    activity.total_transactions,
                    refund_rate * 100.0
                ),
                severity: (refund_rate / (self.rules.refund_rate_warn * 4.0)).clamp(0.4, 1.0),
            });
        }

        if activity.avg_discount_pct >= self.rules.discount_warn_pct {
            indicators.push(TransactionIndicator {
                kind: "heavy_discounting".to_string(),
                description: format!(
                    "average discount {:.1}% (max {:.1}%)",
                    activity.avg_discount_pct, activity.max_discount_pct
                ),
                severity: (activity.avg_discount_pct / (self.rules.discount_warn_pct * 2.5))
                    .clamp(0.4, 1.0),
            });
        }

        if activity.after_hours_count >= self.rules.after_hours_warn {
            indicators.push(TransactionIndicator {
                kind: "after_hours_activity".to_string(),
                description: format!(
                    "{} transactions outside store hours",
                    activity.after_hours_count
                ),
                severity: 0.6,
            });
        }

        if activity.rapid_fire_bursts > 0 {
            indicators.push(TransactionIndicator {
                kind: "rapid_fire_transactions".to_string(),
                description: format!(
                    "{} bursts faster than a plausible ring speed",
                    activity.rapid_fire_bursts
                ),
                severity: 0.7,
            });
        }

        indicators
    }
}

#[async_trait]
impl SignalProvider for TransactionAnalyticsProvider {
    fn source(&self) -> SignalSource {
        SignalSource::TransactionAnalytics
    }

    async fn produce(&self, subject_id: &str) -> Result<Signal, ProviderError> {
        let activity = self
            .feed
            .activity(subject_id, self.rules.lookback_days)
            .await
            .map_err(|e| ProviderError::Unavailable {
                signal_source: self.source(),
                reason: e.to_string(),
            })?;

        if activity.total_transactions == 0 {
            return Err(ProviderError::Unavailable {
                signal_source: self.source(),
                reason: "no transaction activity in lookback period".to_string(),
            });
        }

        let indicators = self.indicators(&activity);
        // Average indicator severity; an indicator-free period is a
        // legitimate zero-risk signal, not an absence.
        let score = if indicators.is_empty() {
            0.0
        } else {
            indicators.iter().map(|i| i.severity).sum::<f64>() / indicators.len() as f64
        };

        let confidence =
            (activity.total_transactions as f64 / 200.0).clamp(0.5, 0.95);

        debug!(
            subject_id,
            score,
            indicators = indicators.len(),
            "transaction analytics signal"
        );

        Signal::new(
            self.source(),
            subject_id,
            score.clamp(0.0, 1.0),
            confidence,
            self.weight,
            Some(Evidence::Transactions { indicators }),
            Utc::now(),
        )
        .map_err(|e| ProviderError::Validation {
            signal_source: SignalSource::TransactionAnalytics,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryTransactionFeed;

    fn provider(feed: InMemoryTransactionFeed) -> TransactionAnalyticsProvider {
        TransactionAnalyticsProvider::new(Arc::new(feed), TransactionRules::default(), 0.25)
    }

    #[tokio::test]
    async fn test_clean_activity_scores_zero() {
        let feed = InMemoryTransactionFeed::new();
        feed.insert(
            "staff-1",
            TransactionActivity {
                total_transactions: 400,
                voids: 2,
                refunds: 3,
                avg_discount_pct: 4.0,
                max_discount_pct: 10.0,
                after_hours_count: 0,
                rapid_fire_bursts: 0,
            },
        );

        let signal = provider(feed).produce("staff-1").await.unwrap();
        assert_eq!(signal.score, 0.0);
        assert_eq!(signal.source, SignalSource::TransactionAnalytics);
    }

    #[tokio::test]
    async fn test_anomalous_activity_flagged() {
        let feed = InMemoryTransactionFeed::new();
        feed.insert(
            "staff-1",
            TransactionActivity {
                total_transactions: 100,
                voids: 14,
                refunds: 9,
                avg_discount_pct: 35.0,
                max_discount_pct: 60.0,
                after_hours_count: 8,
                rapid_fire_bursts: 2,
            },
        );

        let signal = provider(feed).produce("staff-1").await.unwrap();
        assert!(signal.score > 0.5);

        let Some(Evidence::Transactions { indicators }) = &signal.evidence else {
            panic!("expected transaction evidence");
        };
        assert_eq!(indicators.len(), 5);
    }

    #[tokio::test]
    async fn test_no_activity_is_unavailable() {
        let feed = InMemoryTransactionFeed::new();
        feed.insert("staff-1", TransactionActivity::default());

        let result = provider(feed).produce("staff-1").await;
        assert!(matches!(result, Err(ProviderError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_unknown_subject_is_unavailable() {
        let feed = InMemoryTransactionFeed::new();
        let result = provider(feed).produce("nobody").await;
        assert!(matches!(result, Err(ProviderError::Unavailable { .. })));
    }
}
