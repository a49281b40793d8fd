//! Composite score routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use signal_fusion::CompositeScore;
use std::sync::Arc;

use crate::AppState;

/// Query parameters for the scores endpoint
#[derive(Debug, Deserialize)]
pub struct ScoreQuery {
    /// Filter by risk level ("low", "medium", "high", "critical")
    pub risk_level: Option<String>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for the scores endpoint
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub data: Vec<CompositeScore>,
    pub count: usize,
}

/// Get latest composite scores, highest risk first
pub async fn get_scores(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoreQuery>,
) -> Json<ScoreResponse> {
    let limit = params.limit.min(1000);

    let mut scores = state.repository.all_composites().unwrap_or_default();
    if let Some(level) = &params.risk_level {
        scores.retain(|s| s.risk_level.as_str() == level);
    }
    scores.sort_by(|a, b| b.total.total_cmp(&a.total));
    scores.truncate(limit);

    let count = scores.len();
    Json(ScoreResponse {
        data: scores,
        count,
    })
}
