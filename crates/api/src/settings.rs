//! Server settings loaded via the config crate

use serde::Deserialize;

/// Runtime settings for the pipeline server
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Bind address for the API server
    pub bind_addr: String,

    /// Per-provider deadline in seconds
    pub provider_deadline_secs: u64,

    /// Throttle cooldown window in minutes
    pub throttle_window_minutes: i64,

    /// Rate limit: requests replenished per second
    pub rate_limit_per_second: u64,

    /// Rate limit: burst size
    pub rate_limit_burst: u32,
}

impl Settings {
    /// Load settings from config/pipeline.toml (optional) and the
    /// FRAUD_PIPELINE_* environment, over built-in defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("provider_deadline_secs", 10i64)?
            .set_default("throttle_window_minutes", 30i64)?
            .set_default("rate_limit_per_second", 2i64)?
            .set_default("rate_limit_burst", 5i64)?
            .add_source(config::File::with_name("config/pipeline").required(false))
            .add_source(config::Environment::with_prefix("FRAUD_PIPELINE"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let settings = Settings::load().unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
        assert_eq!(settings.provider_deadline_secs, 10);
    }
}
