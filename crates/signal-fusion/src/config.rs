//! Fusion configuration

use crate::signal::SignalSource;
use crate::FusionError;
use score_bands::{RiskLevel, ThresholdLadder};
use std::collections::BTreeMap;

/// Fusion configuration.
///
/// The agreement count and bonus size are hand-tuned operating points
/// carried over from the production system; they are defaults, not
/// derived constants, and every deployment may override them.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// Per-source fusion weights
    pub weights: BTreeMap<SignalSource, f64>,

    /// Score at or above which a signal counts as high risk (default 0.70)
    pub high_risk_threshold: f64,

    /// Agreeing high-risk sources required for the bonus (default 3)
    pub min_agreeing_sources: usize,

    /// Additive bonus when enough sources agree (default 0.10)
    pub correlation_bonus: f64,

    /// Composite-score risk bands
    pub risk_bands: ThresholdLadder<RiskLevel>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        let weights = SignalSource::ALL
            .iter()
            .map(|source| (*source, source.default_weight()))
            .collect();

        Self {
            weights,
            high_risk_threshold: 0.70,
            min_agreeing_sources: 3,
            correlation_bonus: 0.10,
            risk_bands: RiskLevel::default_ladder(),
        }
    }
}

impl FusionConfig {
    /// Validate the configuration; called at load time so a bad value
    /// fails fast instead of silently skewing every composite.
    pub fn validate(&self) -> Result<(), FusionError> {
        for source in SignalSource::ALL {
            match self.weights.get(&source) {
                None => {
                    return Err(FusionError::InvalidConfig(format!(
                        "missing weight for source '{}'",
                        source.as_str()
                    )))
                }
                Some(weight) if !weight.is_finite() || *weight < 0.0 => {
                    return Err(FusionError::InvalidConfig(format!(
                        "weight {} for source '{}' is invalid",
                        weight,
                        source.as_str()
                    )))
                }
                Some(_) => {}
            }
        }

        if !self.high_risk_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.high_risk_threshold)
        {
            return Err(FusionError::InvalidConfig(format!(
                "high_risk_threshold {} is outside [0, 1]",
                self.high_risk_threshold
            )));
        }
        if !self.correlation_bonus.is_finite() || !(0.0..=1.0).contains(&self.correlation_bonus) {
            return Err(FusionError::InvalidConfig(format!(
                "correlation_bonus {} is outside [0, 1]",
                self.correlation_bonus
            )));
        }
        if self.min_agreeing_sources == 0 {
            return Err(FusionError::InvalidConfig(
                "min_agreeing_sources must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Weight configured for a source
    pub fn weight_for(&self, source: SignalSource) -> f64 {
        self.weights
            .get(&source)
            .copied()
            .unwrap_or_else(|| source.default_weight())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FusionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_weight_fails_fast() {
        let mut config = FusionConfig::default();
        config.weights.remove(&SignalSource::TrendForecast);
        assert!(matches!(
            config.validate(),
            Err(FusionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = FusionConfig::default();
        config
            .weights
            .insert(SignalSource::TrendForecast, -0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let config = FusionConfig {
            high_risk_threshold: 1.4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
