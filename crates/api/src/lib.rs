//! Fraud Pipeline API Server
//!
//! REST surface over the fusion pipeline: health, recent composite
//! scores, investigation packages, and on-demand subject analysis.
//! Alert delivery and dashboard rendering live elsewhere; this crate
//! only exposes what the pipeline computed.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use orchestrator::Orchestrator;
use serde::Serialize;
use std::sync::Arc;
use storage::Repository;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod rate_limit;
mod routes;
mod settings;

pub use rate_limit::{create_governor_config, RateLimitConfig};
pub use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Pipeline entry point
    pub orchestrator: Arc<Orchestrator>,
    /// Storage repository
    pub repository: Arc<Repository>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(orchestrator: Arc<Orchestrator>, repository: Arc<Repository>) -> Self {
        Self {
            orchestrator,
            repository,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub metrics: SystemMetrics,
}

/// System metrics
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub subjects_scored: usize,
    pub packages_generated: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/scores", get(routes::scores::get_scores))
        .route("/api/v1/packages", get(routes::packages::get_packages))
        .route("/api/v1/analyze", post(routes::analyze::analyze_subject))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        metrics: SystemMetrics {
            subjects_scored: state.repository.composite_count(),
            packages_generated: state.repository.package_count(),
        },
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server
pub async fn run_server(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
