//! On-demand analysis route

use alert_throttle::ThrottleOutcome;
use axum::{extract::State, http::StatusCode, Json};
use score_bands::RiskLevel;
use serde::{Deserialize, Serialize};
use signal_fusion::SignalSource;
use std::sync::Arc;
use tracing::error;

use crate::AppState;

/// Request body for the analyze endpoint
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Subject to analyze
    pub subject_id: String,
}

/// Response for the analyze endpoint
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub subject_id: String,
    pub total: f64,
    pub risk_level: RiskLevel,
    pub contributing_sources: Vec<SignalSource>,
    pub correlation_bonus_applied: bool,
    pub alert_fired: bool,
    pub alert_outcome: ThrottleOutcome,
    pub package_id: Option<uuid::Uuid>,
    pub degraded_sources: Vec<String>,
    pub persistence_errors: Vec<String>,
}

/// Run one subject through the full pipeline
pub async fn analyze_subject(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    if request.subject_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "subject_id must not be empty".to_string(),
        ));
    }

    let analysis = state
        .orchestrator
        .analyze_subject(&request.subject_id)
        .await
        .map_err(|e| {
            error!(subject_id = %request.subject_id, error = %e, "analysis failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(AnalyzeResponse {
        subject_id: request.subject_id,
        total: analysis.composite.total,
        risk_level: analysis.composite.risk_level,
        contributing_sources: analysis
            .composite
            .contributing
            .iter()
            .map(|s| s.source)
            .collect(),
        correlation_bonus_applied: analysis.composite.correlation_bonus_applied,
        alert_fired: analysis.decision.allow,
        alert_outcome: analysis.decision.outcome,
        package_id: analysis.package.as_ref().map(|p| p.package_id),
        degraded_sources: analysis
            .degraded_sources
            .iter()
            .map(|d| format!("{}: {}", d.source.as_str(), d.reason))
            .collect(),
        persistence_errors: analysis.persistence_errors,
    }))
}
