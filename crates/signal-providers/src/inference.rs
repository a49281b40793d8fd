//! Bounded async inference client.
//!
//! The core treats the inference pipeline purely as a pollable async
//! source: submit a request, poll the handle, give up at the deadline.
//! It does not know or care that the other side is video or language
//! analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signal_fusion::FlaggedMessage;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Inference client errors
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// Submission rejected by the service
    #[error("inference submit failed: {0}")]
    Submit(String),

    /// Poll call failed
    #[error("inference poll failed: {0}")]
    Poll(String),

    /// Result did not arrive before the deadline
    #[error("inference deadline of {deadline_ms} ms exceeded")]
    DeadlineExceeded { deadline_ms: u64 },

    /// The surrounding analysis was cancelled
    #[error("inference request cancelled")]
    Cancelled,
}

/// Request submitted to the inference service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Subject the analysis is about
    pub subject_id: String,

    /// Analysis kind requested (e.g. "communication_risk")
    pub analysis_kind: String,
}

/// Opaque handle for polling a submitted request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceHandle(pub String);

/// Result of one poll call
#[derive(Debug, Clone)]
pub enum PollStatus {
    /// Still running
    Pending,
    /// Finished with a verdict
    Done(InferenceVerdict),
}

/// Verdict returned by the inference service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceVerdict {
    /// Normalized risk score in [0, 1]
    pub risk_score: f64,

    /// Service confidence in the verdict
    pub confidence: f64,

    /// Messages the service flagged
    pub flagged: Vec<FlaggedMessage>,
}

/// Async request/poll interface to the inference service
#[async_trait]
pub trait InferencePipeline: Send + Sync {
    /// Submit a request, returning a pollable handle
    async fn submit(&self, request: InferenceRequest) -> Result<InferenceHandle, InferenceError>;

    /// Poll a handle for completion
    async fn poll(&self, handle: &InferenceHandle) -> Result<PollStatus, InferenceError>;
}

/// Submit and poll until done, deadline, or cancellation.
///
/// A stalled service degrades to DeadlineExceeded after `deadline`
/// rather than blocking the subject's fusion indefinitely.
pub async fn await_verdict(
    pipeline: &dyn InferencePipeline,
    request: InferenceRequest,
    deadline: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<InferenceVerdict, InferenceError> {
    let handle = pipeline.submit(request).await?;
    debug!(handle = %handle.0, "submitted inference request");

    let poll_loop = async {
        loop {
            match pipeline.poll(&handle).await? {
                PollStatus::Done(verdict) => return Ok(verdict),
                PollStatus::Pending => tokio::time::sleep(poll_interval).await,
            }
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => Err(InferenceError::Cancelled),
        result = tokio::time::timeout(deadline, poll_loop) => match result {
            Ok(inner) => inner,
            Err(_) => Err(InferenceError::DeadlineExceeded {
                deadline_ms: deadline.as_millis() as u64,
            }),
        },
    }
}
