//! Sigma computation and severity banding

use crate::baseline::DimensionBaseline;
use crate::DeviationError;
use score_bands::{Severity, ThresholdLadder};
use tracing::debug;

/// Deviation scorer configuration
#[derive(Debug, Clone)]
pub struct DeviationConfig {
    /// Minimum baseline samples before a sigma is trusted
    pub min_samples: u32,

    /// Sigma-to-severity bands
    pub bands: ThresholdLadder<Severity>,

    /// Sigma at which the normalized score saturates at 1.0
    pub saturation_sigma: f64,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            min_samples: 30,
            bands: Severity::default_ladder(),
            saturation_sigma: 4.0,
        }
    }
}

/// How far a current value sits from its baseline
#[derive(Debug, Clone, Copy)]
pub struct Deviation {
    /// Standard deviations from the baseline mean (may be +infinity)
    pub sigma: f64,

    /// Banded severity for the sigma
    pub severity: Severity,
}

impl Deviation {
    /// Map the sigma into [0, 1] for signal construction.
    ///
    /// Saturates at `saturation_sigma`; an infinite sigma maps to 1.0.
    pub fn normalized(&self, saturation_sigma: f64) -> f64 {
        if self.sigma.is_infinite() {
            return 1.0;
        }
        (self.sigma / saturation_sigma).clamp(0.0, 1.0)
    }
}

/// Converts (current value, baseline) into a sigma and severity
pub struct DeviationScorer {
    config: DeviationConfig,
}

impl DeviationScorer {
    /// Create a scorer, validating the configuration
    pub fn new(config: DeviationConfig) -> Result<Self, DeviationError> {
        if config.min_samples == 0 {
            return Err(DeviationError::InvalidBaseline(
                "min_samples must be at least 1".to_string(),
            ));
        }
        if !config.saturation_sigma.is_finite() || config.saturation_sigma <= 0.0 {
            return Err(DeviationError::NonFinite {
                field: "saturation_sigma",
            });
        }
        Ok(Self { config })
    }

    /// Saturation sigma configured for normalization
    pub fn saturation_sigma(&self) -> f64 {
        self.config.saturation_sigma
    }

    /// Score a current value against its baseline.
    ///
    /// stddev == 0 with current == mean yields sigma 0; stddev == 0 with
    /// current != mean yields +infinity (maximal severity). Division by
    /// zero never propagates as NaN. A baseline below the sample floor
    /// is a typed absence, not a sigma.
    pub fn score(
        &self,
        current: f64,
        baseline: &DimensionBaseline,
    ) -> Result<Deviation, DeviationError> {
        if !current.is_finite() {
            return Err(DeviationError::NonFinite { field: "current" });
        }
        if !baseline.mean.is_finite() {
            return Err(DeviationError::NonFinite { field: "mean" });
        }
        if !baseline.stddev.is_finite() || baseline.stddev < 0.0 {
            return Err(DeviationError::InvalidBaseline(format!(
                "stddev {} is negative or not finite",
                baseline.stddev
            )));
        }
        if baseline.sample_count < self.config.min_samples {
            return Err(DeviationError::InsufficientData {
                have: baseline.sample_count,
                need: self.config.min_samples,
            });
        }

        let sigma = if baseline.stddev > 0.0 {
            (current - baseline.mean).abs() / baseline.stddev
        } else if current == baseline.mean {
            0.0
        } else {
            f64::INFINITY
        };

        let severity = self.config.bands.classify(sigma);
        debug!(sigma, severity = severity.as_str(), "scored deviation");

        Ok(Deviation { sigma, severity })
    }
}

impl Default for DeviationScorer {
    fn default() -> Self {
        Self::new(DeviationConfig::default()).expect("default deviation config is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn baseline(mean: f64, stddev: f64, sample_count: u32) -> DimensionBaseline {
        let now = Utc::now();
        DimensionBaseline {
            mean,
            stddev,
            sample_count,
            learned_at: now - Duration::days(30),
            valid_until: now + Duration::days(30),
        }
    }

    #[test]
    fn test_three_sigma_is_major() {
        let scorer = DeviationScorer::default();
        let deviation = scorer.score(16.0, &baseline(10.0, 2.0, 50)).unwrap();

        assert!((deviation.sigma - 3.0).abs() < 1e-9);
        assert_eq!(deviation.severity, Severity::Major);
    }

    #[test]
    fn test_within_band_is_normal() {
        let scorer = DeviationScorer::default();
        let deviation = scorer.score(10.5, &baseline(10.0, 2.0, 50)).unwrap();

        assert_eq!(deviation.severity, Severity::Normal);
    }

    #[test]
    fn test_zero_stddev_at_mean() {
        let scorer = DeviationScorer::default();
        let deviation = scorer.score(10.0, &baseline(10.0, 0.0, 50)).unwrap();

        assert_eq!(deviation.sigma, 0.0);
        assert_eq!(deviation.severity, Severity::Normal);
    }

    #[test]
    fn test_zero_stddev_off_mean_is_maximal() {
        let scorer = DeviationScorer::default();
        let deviation = scorer.score(10.1, &baseline(10.0, 0.0, 50)).unwrap();

        assert!(deviation.sigma.is_infinite());
        assert_eq!(deviation.severity, Severity::Critical);
        assert_eq!(deviation.normalized(4.0), 1.0);
    }

    #[test]
    fn test_insufficient_samples() {
        let scorer = DeviationScorer::default();
        let result = scorer.score(16.0, &baseline(10.0, 2.0, 5));

        assert!(matches!(
            result,
            Err(DeviationError::InsufficientData { have: 5, need: 30 })
        ));
    }

    #[test]
    fn test_nan_current_rejected() {
        let scorer = DeviationScorer::default();
        let result = scorer.score(f64::NAN, &baseline(10.0, 2.0, 50));

        assert!(matches!(result, Err(DeviationError::NonFinite { .. })));
    }

    #[test]
    fn test_normalized_saturates() {
        let deviation = Deviation {
            sigma: 10.0,
            severity: Severity::Critical,
        };
        assert_eq!(deviation.normalized(4.0), 1.0);

        let mild = Deviation {
            sigma: 2.0,
            severity: Severity::Moderate,
        };
        assert!((mild.normalized(4.0) - 0.5).abs() < 1e-9);
    }
}
