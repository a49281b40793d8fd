//! Data-feed traits the providers consume.
//!
//! Raw acquisition (SQL against transaction/timesheet/camera tables)
//! stays behind these traits; the providers only see typed records.

use async_trait::async_trait;
use deviation_scorer::BaselineProfile;
use event_correlator::EventRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from a feed backend
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Subject has no rows in the backing store
    #[error("no data for subject '{0}'")]
    NotFound(String),

    /// Backend failure (connection, query)
    #[error("feed backend error: {0}")]
    Backend(String),
}

/// Aggregated register activity for a subject over a lookback period
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionActivity {
    /// Total transactions in the period
    pub total_transactions: u32,

    /// Void count
    pub voids: u32,

    /// Refund count
    pub refunds: u32,

    /// Average discount percentage applied
    pub avg_discount_pct: f64,

    /// Highest single discount percentage
    pub max_discount_pct: f64,

    /// Transactions outside store hours
    pub after_hours_count: u32,

    /// Bursts of transactions faster than a human plausibly rings
    pub rapid_fire_bursts: u32,
}

/// Register transaction metrics for a subject
#[async_trait]
pub trait TransactionFeed: Send + Sync {
    /// Aggregated activity over the last `days`
    async fn activity(&self, subject_id: &str, days: u32)
        -> Result<TransactionActivity, FeedError>;
}

/// Till events and camera detections for presence correlation
#[async_trait]
pub trait PresenceFeed: Send + Sync {
    /// Anchor events: transactions at the subject's register
    async fn till_events(&self, subject_id: &str, days: u32)
        -> Result<Vec<EventRecord>, FeedError>;

    /// Candidate events: detections from cameras covering those registers
    async fn camera_events(
        &self,
        subject_id: &str,
        days: u32,
    ) -> Result<Vec<EventRecord>, FeedError>;
}

/// Learned baselines plus the current observation window
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// The subject's learned profile, if one has been built
    async fn profile(&self, subject_id: &str) -> Result<Option<BaselineProfile>, FeedError>;

    /// Current values per metric dimension
    async fn current_metrics(&self, subject_id: &str) -> Result<HashMap<String, f64>, FeedError>;
}

/// Per-week risk history for trend projection
#[async_trait]
pub trait RiskHistoryFeed: Send + Sync {
    /// Ordered (week index, composite score) pairs, oldest first
    async fn weekly_risk(&self, subject_id: &str, weeks: u32)
        -> Result<Vec<(i64, f64)>, FeedError>;
}
