//! In-memory feed implementations.
//!
//! Used by tests and the demo binary until real backends are wired in.

use crate::feeds::{
    BaselineStore, FeedError, PresenceFeed, RiskHistoryFeed, TransactionActivity, TransactionFeed,
};
use crate::inference::{
    InferenceError, InferenceHandle, InferencePipeline, InferenceRequest, InferenceVerdict,
    PollStatus,
};
use async_trait::async_trait;
use deviation_scorer::BaselineProfile;
use event_correlator::EventRecord;
use std::collections::HashMap;
use std::sync::Mutex;

fn lock_err<T>(error: std::sync::PoisonError<T>) -> FeedError {
    FeedError::Backend(format!("lock error: {}", error))
}

/// In-memory transaction feed
#[derive(Default)]
pub struct InMemoryTransactionFeed {
    activity: Mutex<HashMap<String, TransactionActivity>>,
}

impl InMemoryTransactionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed activity for a subject
    pub fn insert(&self, subject_id: &str, activity: TransactionActivity) {
        if let Ok(mut map) = self.activity.lock() {
            map.insert(subject_id.to_string(), activity);
        }
    }
}

#[async_trait]
impl TransactionFeed for InMemoryTransactionFeed {
    async fn activity(
        &self,
        subject_id: &str,
        _days: u32,
    ) -> Result<TransactionActivity, FeedError> {
        let map = self.activity.lock().map_err(lock_err)?;
        map.get(subject_id)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(subject_id.to_string()))
    }
}

/// In-memory presence feed
#[derive(Default)]
pub struct InMemoryPresenceFeed {
    till: Mutex<HashMap<String, Vec<EventRecord>>>,
    camera: Mutex<HashMap<String, Vec<EventRecord>>>,
}

impl InMemoryPresenceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_till(&self, subject_id: &str, events: Vec<EventRecord>) {
        if let Ok(mut map) = self.till.lock() {
            map.insert(subject_id.to_string(), events);
        }
    }

    pub fn insert_camera(&self, subject_id: &str, events: Vec<EventRecord>) {
        if let Ok(mut map) = self.camera.lock() {
            map.insert(subject_id.to_string(), events);
        }
    }
}

#[async_trait]
impl PresenceFeed for InMemoryPresenceFeed {
    async fn till_events(
        &self,
        subject_id: &str,
        _days: u32,
    ) -> Result<Vec<EventRecord>, FeedError> {
        let map = self.till.lock().map_err(lock_err)?;
        Ok(map.get(subject_id).cloned().unwrap_or_default())
    }

    async fn camera_events(
        &self,
        subject_id: &str,
        _days: u32,
    ) -> Result<Vec<EventRecord>, FeedError> {
        let map = self.camera.lock().map_err(lock_err)?;
        Ok(map.get(subject_id).cloned().unwrap_or_default())
    }
}

/// In-memory baseline store
#[derive(Default)]
pub struct InMemoryBaselineStore {
    profiles: Mutex<HashMap<String, BaselineProfile>>,
    metrics: Mutex<HashMap<String, HashMap<String, f64>>>,
}

impl InMemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: BaselineProfile) {
        if let Ok(mut map) = self.profiles.lock() {
            map.insert(profile.subject_id.clone(), profile);
        }
    }

    pub fn insert_metrics(&self, subject_id: &str, metrics: HashMap<String, f64>) {
        if let Ok(mut map) = self.metrics.lock() {
            map.insert(subject_id.to_string(), metrics);
        }
    }
}

#[async_trait]
impl BaselineStore for InMemoryBaselineStore {
    async fn profile(&self, subject_id: &str) -> Result<Option<BaselineProfile>, FeedError> {
        let map = self.profiles.lock().map_err(lock_err)?;
        Ok(map.get(subject_id).cloned())
    }

    async fn current_metrics(
        &self,
        subject_id: &str,
    ) -> Result<HashMap<String, f64>, FeedError> {
        let map = self.metrics.lock().map_err(lock_err)?;
        Ok(map.get(subject_id).cloned().unwrap_or_default())
    }
}

/// In-memory weekly risk history
#[derive(Default)]
pub struct InMemoryRiskHistory {
    history: Mutex<HashMap<String, Vec<(i64, f64)>>>,
}

impl InMemoryRiskHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subject_id: &str, history: Vec<(i64, f64)>) {
        if let Ok(mut map) = self.history.lock() {
            map.insert(subject_id.to_string(), history);
        }
    }
}

#[async_trait]
impl RiskHistoryFeed for InMemoryRiskHistory {
    async fn weekly_risk(
        &self,
        subject_id: &str,
        weeks: u32,
    ) -> Result<Vec<(i64, f64)>, FeedError> {
        let map = self.history.lock().map_err(lock_err)?;
        let mut history = map.get(subject_id).cloned().unwrap_or_default();
        let keep = weeks as usize;
        if history.len() > keep {
            history.drain(..history.len() - keep);
        }
        Ok(history)
    }
}

/// Inference pipeline that answers from seeded verdicts after a fixed
/// number of pending polls; with no verdict seeded it stays pending
/// forever, which is how tests exercise the deadline path.
pub struct StaticInferencePipeline {
    verdicts: Mutex<HashMap<String, InferenceVerdict>>,
    polls_remaining: Mutex<HashMap<String, u32>>,
    polls_before_done: u32,
}

impl StaticInferencePipeline {
    /// Create a pipeline that reports Pending `polls_before_done` times
    pub fn new(polls_before_done: u32) -> Self {
        Self {
            verdicts: Mutex::new(HashMap::new()),
            polls_remaining: Mutex::new(HashMap::new()),
            polls_before_done,
        }
    }

    /// Seed the verdict returned for a subject
    pub fn set_verdict(&self, subject_id: &str, verdict: InferenceVerdict) {
        if let Ok(mut map) = self.verdicts.lock() {
            map.insert(subject_id.to_string(), verdict);
        }
    }
}

#[async_trait]
impl InferencePipeline for StaticInferencePipeline {
    async fn submit(&self, request: InferenceRequest) -> Result<InferenceHandle, InferenceError> {
        let mut polls = self
            .polls_remaining
            .lock()
            .map_err(|e| InferenceError::Submit(e.to_string()))?;
        polls.insert(request.subject_id.clone(), self.polls_before_done);
        Ok(InferenceHandle(request.subject_id))
    }

    async fn poll(&self, handle: &InferenceHandle) -> Result<PollStatus, InferenceError> {
        let mut polls = self
            .polls_remaining
            .lock()
            .map_err(|e| InferenceError::Poll(e.to_string()))?;
        let remaining = polls.entry(handle.0.clone()).or_insert(0);
        if *remaining > 0 {
            *remaining = remaining.saturating_sub(1);
            return Ok(PollStatus::Pending);
        }

        let verdicts = self
            .verdicts
            .lock()
            .map_err(|e| InferenceError::Poll(e.to_string()))?;
        match verdicts.get(&handle.0) {
            Some(verdict) => Ok(PollStatus::Done(verdict.clone())),
            None => Ok(PollStatus::Pending),
        }
    }
}
