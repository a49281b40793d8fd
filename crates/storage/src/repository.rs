//! Repository Implementation

use crate::StorageError;
use alert_throttle::ThrottleState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use investigation::InvestigationPackage;
use serde::{Deserialize, Serialize};
use signal_fusion::CompositeScore;
use signal_providers::{FeedError, RiskHistoryFeed};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, info};

/// One week's composite score for trend history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSample {
    /// ISO week index
    pub week_index: i64,
    /// Composite score for the week
    pub score: f64,
    /// When the sample was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Repository for data access (in-memory implementation for now)
pub struct Repository {
    /// Latest composite per subject; later runs supersede earlier ones
    composites: Mutex<HashMap<String, CompositeScore>>,
    /// Investigation packages, newest last
    packages: Mutex<Vec<InvestigationPackage>>,
    /// Persisted throttle states per subject
    throttle_states: Mutex<HashMap<String, ThrottleState>>,
    /// Weekly risk history windows per subject
    risk_history: Mutex<HashMap<String, VecDeque<RiskSample>>>,
    /// Max packages retained
    max_packages: usize,
    /// Max weeks of history per subject
    max_history_weeks: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            composites: Mutex::new(HashMap::new()),
            packages: Mutex::new(Vec::with_capacity(256)),
            throttle_states: Mutex::new(HashMap::new()),
            risk_history: Mutex::new(HashMap::new()),
            max_packages: 10_000,
            max_history_weeks: 26,
        }
    }

    /// Create a new repository backed by SQLite (placeholder)
    pub async fn with_sqlite(_db_path: &str) -> Result<Self, StorageError> {
        // In real implementation, we would use sqlx here:
        // let pool = SqlitePool::connect(db_path).await?;
        // Run migrations, setup WAL mode, etc.

        Ok(Self::new())
    }

    /// Save a composite score; per-subject idempotent last-write-wins
    pub fn save_composite(&self, composite: CompositeScore) -> Result<(), StorageError> {
        let mut composites = self
            .composites
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        debug!(subject_id = %composite.subject_id, total = composite.total, "saving composite");
        composites.insert(composite.subject_id.clone(), composite);
        Ok(())
    }

    /// Latest composite for a subject
    pub fn latest_composite(&self, subject_id: &str) -> Result<CompositeScore, StorageError> {
        let composites = self
            .composites
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        composites
            .get(subject_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    /// All latest composites, for dashboards and sweeps
    pub fn all_composites(&self) -> Result<Vec<CompositeScore>, StorageError> {
        let composites = self
            .composites
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        Ok(composites.values().cloned().collect())
    }

    /// Save an investigation package
    pub fn save_package(&self, package: InvestigationPackage) -> Result<(), StorageError> {
        let mut packages = self
            .packages
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        // Enforce retention
        if packages.len() >= self.max_packages {
            packages.remove(0);
        }
        packages.push(package);
        Ok(())
    }

    /// Most recent packages, optionally for one subject
    pub fn recent_packages(
        &self,
        subject_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InvestigationPackage>, StorageError> {
        let packages = self
            .packages
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        Ok(packages
            .iter()
            .rev()
            .filter(|p| subject_id.map_or(true, |s| p.subject_id == s))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Load persisted throttle states (e.g. to seed the gate at startup)
    pub fn load_throttle_states(&self) -> Result<Vec<ThrottleState>, StorageError> {
        let states = self
            .throttle_states
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        Ok(states.values().cloned().collect())
    }

    /// Persist one subject's throttle state after a gate decision
    pub fn save_throttle_state(&self, state: ThrottleState) -> Result<(), StorageError> {
        let mut states = self
            .throttle_states
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        states.insert(state.subject_id.clone(), state);
        Ok(())
    }

    /// Append a weekly risk sample, overwriting the same week's sample
    pub fn push_risk_sample(
        &self,
        subject_id: &str,
        sample: RiskSample,
    ) -> Result<(), StorageError> {
        let mut history = self
            .risk_history
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;

        let window = history.entry(subject_id.to_string()).or_default();

        if let Some(last) = window.back_mut() {
            if last.week_index == sample.week_index {
                *last = sample;
                return Ok(());
            }
        }

        while window.len() >= self.max_history_weeks {
            window.pop_front();
        }
        window.push_back(sample);
        Ok(())
    }

    /// Number of subjects with a stored composite
    pub fn composite_count(&self) -> usize {
        self.composites.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of stored packages
    pub fn package_count(&self) -> usize {
        self.packages.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut composites) = self.composites.lock() {
            composites.clear();
        }
        if let Ok(mut packages) = self.packages.lock() {
            packages.clear();
        }
        if let Ok(mut states) = self.throttle_states.lock() {
            states.clear();
        }
        if let Ok(mut history) = self.risk_history.lock() {
            history.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiskHistoryFeed for Repository {
    async fn weekly_risk(
        &self,
        subject_id: &str,
        weeks: u32,
    ) -> Result<Vec<(i64, f64)>, FeedError> {
        let history = self
            .risk_history
            .lock()
            .map_err(|e| FeedError::Backend(format!("Lock error: {}", e)))?;

        let window = history
            .get(subject_id)
            .map(|w| {
                let skip = w.len().saturating_sub(weeks as usize);
                w.iter()
                    .skip(skip)
                    .map(|s| (s.week_index, s.score))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_fusion::{FusionConfig, FusionEngine, Signal, SignalSource};

    fn composite(subject_id: &str, score: f64) -> CompositeScore {
        let engine = FusionEngine::new(FusionConfig::default()).unwrap();
        let signal = Signal::new(
            SignalSource::TransactionAnalytics,
            subject_id,
            score,
            0.9,
            1.0,
            None,
            Utc::now(),
        )
        .unwrap();
        engine.fuse(subject_id, &[signal], Utc::now()).unwrap()
    }

    #[test]
    fn test_composite_last_write_wins() {
        let repo = Repository::new();

        repo.save_composite(composite("staff-1", 0.4)).unwrap();
        repo.save_composite(composite("staff-1", 0.8)).unwrap();

        let latest = repo.latest_composite("staff-1").unwrap();
        assert!((latest.total - 0.8).abs() < 1e-9);
        assert_eq!(repo.composite_count(), 1);
    }

    #[test]
    fn test_missing_composite_is_not_found() {
        let repo = Repository::new();
        assert!(matches!(
            repo.latest_composite("nobody"),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn test_throttle_state_round_trip() {
        let repo = Repository::new();

        let mut state = ThrottleState::new("staff-1");
        state.alerts_in_window = 2;
        state.last_alert_at = Some(Utc::now());
        repo.save_throttle_state(state).unwrap();

        let states = repo.load_throttle_states().unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].alerts_in_window, 2);
    }

    #[tokio::test]
    async fn test_risk_history_window_bounded() {
        let repo = Repository::new();

        for week in 0..40 {
            repo.push_risk_sample(
                "staff-1",
                RiskSample {
                    week_index: week,
                    score: 0.1,
                    recorded_at: Utc::now(),
                },
            )
            .unwrap();
        }

        let history = repo.weekly_risk("staff-1", 52).await.unwrap();
        assert_eq!(history.len(), 26);
        assert_eq!(history[0].0, 14);
    }

    #[tokio::test]
    async fn test_same_week_sample_overwritten() {
        let repo = Repository::new();

        repo.push_risk_sample(
            "staff-1",
            RiskSample {
                week_index: 10,
                score: 0.2,
                recorded_at: Utc::now(),
            },
        )
        .unwrap();
        repo.push_risk_sample(
            "staff-1",
            RiskSample {
                week_index: 10,
                score: 0.6,
                recorded_at: Utc::now(),
            },
        )
        .unwrap();

        let history = repo.weekly_risk("staff-1", 52).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!((history[0].1 - 0.6).abs() < 1e-9);
    }
}
