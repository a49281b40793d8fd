//! Investigation package routes

use axum::{
    extract::{Query, State},
    Json,
};
use investigation::InvestigationPackage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// Query parameters for the packages endpoint
#[derive(Debug, Deserialize)]
pub struct PackageQuery {
    /// Filter by subject
    pub subject_id: Option<String>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Response for the packages endpoint
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    pub data: Vec<InvestigationPackage>,
    pub count: usize,
}

/// Get recent investigation packages
pub async fn get_packages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PackageQuery>,
) -> Json<PackageResponse> {
    let limit = params.limit.min(200);

    let data = state
        .repository
        .recent_packages(params.subject_id.as_deref(), limit)
        .unwrap_or_default();

    let count = data.len();
    Json(PackageResponse { data, count })
}
