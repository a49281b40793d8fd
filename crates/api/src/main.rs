//! Fraud Signal Pipeline - Main Entry Point

use alert_throttle::{ThrottleGate, ThrottlePolicy};
use api::{init_logging, run_server, AppState, Settings};
use chrono::{Duration as ChronoDuration, Utc};
use deviation_scorer::{BaselineProfile, DeviationScorer, DimensionBaseline};
use event_correlator::{EventKind, EventRecord};
use investigation::PackageBuilder;
use metrics_exporter_prometheus::PrometheusBuilder;
use orchestrator::{AnalysisConfig, Orchestrator};
use signal_fusion::{FusionConfig, FusionEngine, SignalSource};
use signal_providers::{
    BehavioralBaselineProvider, CommunicationAnalysisProvider, CommunicationConfig,
    ForecastConfig, InMemoryBaselineStore, InMemoryPresenceFeed, InMemoryTransactionFeed,
    InferenceVerdict, PresenceConfig, PresenceCorrelationProvider, SignalProvider,
    StaticInferencePipeline, TransactionActivity, TransactionAnalyticsProvider, TransactionRules,
    TrendForecastProvider,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::Repository;
use tokio_util::sync::CancellationToken;
use tracing::info;
use trend_projector::TrendProjector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Fraud Signal Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;

    PrometheusBuilder::new().install()?;

    let repository = Arc::new(Repository::new());
    let cancel = CancellationToken::new();
    let fusion_config = FusionConfig::default();
    let providers = demo_providers(&fusion_config, Arc::clone(&repository), cancel.clone());

    let orchestrator = Arc::new(Orchestrator::new(
        providers,
        FusionEngine::new(fusion_config)?,
        ThrottleGate::new(ThrottlePolicy {
            window: ChronoDuration::minutes(settings.throttle_window_minutes),
            ..Default::default()
        })?,
        PackageBuilder::default(),
        Arc::clone(&repository),
        AnalysisConfig {
            provider_deadline: Duration::from_secs(settings.provider_deadline_secs),
        },
    )?);

    let state = Arc::new(AppState::new(orchestrator, repository));
    run_server(&settings.bind_addr, state).await
}

fn demo_event(
    id: &str,
    kind: EventKind,
    base: chrono::DateTime<Utc>,
    offset_secs: i64,
) -> EventRecord {
    EventRecord {
        event_id: id.to_string(),
        subject_ref: "staff-demo".to_string(),
        kind,
        timestamp: base + ChronoDuration::seconds(offset_secs),
        location_ref: Some("register-1".to_string()),
        confidence: 0.9,
    }
}

/// Wire the providers against seeded in-memory feeds until real
/// backends are connected.
fn demo_providers(
    fusion_config: &FusionConfig,
    repository: Arc<Repository>,
    cancel: CancellationToken,
) -> Vec<Arc<dyn SignalProvider>> {
    let transactions = InMemoryTransactionFeed::new();
    transactions.insert(
        "staff-demo",
        TransactionActivity {
            total_transactions: 240,
            voids: 18,
            refunds: 11,
            avg_discount_pct: 24.0,
            max_discount_pct: 55.0,
            after_hours_count: 6,
            rapid_fire_bursts: 1,
        },
    );

    let baselines = InMemoryBaselineStore::new();
    let now = Utc::now();
    let mut profile = BaselineProfile::new("staff-demo");
    profile.dimensions.insert(
        "void_rate".to_string(),
        DimensionBaseline {
            mean: 0.02,
            stddev: 0.01,
            sample_count: 90,
            learned_at: now - ChronoDuration::days(30),
            valid_until: now + ChronoDuration::days(60),
        },
    );
    baselines.insert_profile(profile);
    baselines.insert_metrics(
        "staff-demo",
        HashMap::from([("void_rate".to_string(), 0.075)]),
    );

    let presence = InMemoryPresenceFeed::new();
    presence.insert_till(
        "staff-demo",
        vec![
            demo_event("tx-1", EventKind::Transaction, now, 0),
            demo_event("tx-2", EventKind::Transaction, now, 3_600),
        ],
    );
    // tx-2 has no nearby detection: a ghost transaction
    presence.insert_camera(
        "staff-demo",
        vec![demo_event("cam-1", EventKind::CameraDetection, now, 12)],
    );

    let inference = StaticInferencePipeline::new(1);
    inference.set_verdict(
        "staff-demo",
        InferenceVerdict {
            risk_score: 0.35,
            confidence: 0.7,
            flagged: Vec::new(),
        },
    );

    let presence_provider = PresenceCorrelationProvider::new(
        Arc::new(presence),
        PresenceConfig::default(),
        fusion_config.weight_for(SignalSource::PresenceCorrelation),
    )
    .expect("default presence config is valid");

    vec![
        Arc::new(TransactionAnalyticsProvider::new(
            Arc::new(transactions),
            TransactionRules::default(),
            fusion_config.weight_for(SignalSource::TransactionAnalytics),
        )),
        Arc::new(presence_provider),
        Arc::new(BehavioralBaselineProvider::new(
            Arc::new(baselines),
            DeviationScorer::default(),
            fusion_config.weight_for(SignalSource::BehavioralBaseline),
        )),
        Arc::new(TrendForecastProvider::new(
            repository,
            TrendProjector::default(),
            ForecastConfig::default(),
            fusion_config.weight_for(SignalSource::TrendForecast),
        )),
        Arc::new(CommunicationAnalysisProvider::new(
            Arc::new(inference),
            CommunicationConfig::default(),
            cancel,
            fusion_config.weight_for(SignalSource::CommunicationAnalysis),
        )),
    ]
}
