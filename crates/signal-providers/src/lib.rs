//! Signal Providers
//!
//! One provider per independent fraud-signal source. Each provider
//! reads its own raw data through a feed trait (SQL acquisition lives
//! behind those traits, outside this crate), runs one of the core
//! algorithms, and emits a normalized Signal - or a typed
//! "unavailable" outcome when its data is too thin. A provider failure
//! never aborts fusion for the other sources.

mod baseline;
mod communication;
mod feeds;
mod forecast;
mod inference;
mod memory;
mod presence;
mod provider;
mod transactions;

pub use baseline::BehavioralBaselineProvider;
pub use communication::{CommunicationAnalysisProvider, CommunicationConfig};
pub use feeds::{
    BaselineStore, FeedError, PresenceFeed, RiskHistoryFeed, TransactionActivity, TransactionFeed,
};
pub use forecast::{ForecastConfig, TrendForecastProvider};
pub use inference::{
    await_verdict, InferenceError, InferenceHandle, InferencePipeline, InferenceRequest,
    InferenceVerdict, PollStatus,
};
pub use memory::{
    InMemoryBaselineStore, InMemoryPresenceFeed, InMemoryRiskHistory, InMemoryTransactionFeed,
    StaticInferencePipeline,
};
pub use presence::{PresenceConfig, PresenceCorrelationProvider};
pub use provider::{ProviderError, SignalProvider};
pub use transactions::{TransactionAnalyticsProvider, TransactionRules};
