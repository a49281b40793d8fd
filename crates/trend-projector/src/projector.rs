//! OLS fit and forward projection

use crate::TrendError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Slopes flatter than this are treated as zero for ETA purposes
const SLOPE_EPSILON: f64 = 1e-9;

/// Trend projector configuration
#[derive(Debug, Clone)]
pub struct TrendConfig {
    /// Lower clamp bound for projected values
    pub clamp_min: f64,

    /// Upper clamp bound for projected values
    pub clamp_max: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        // Risk scores live in [0, 1]; raw metrics get a wider range
        Self {
            clamp_min: 0.0,
            clamp_max: 1.0,
        }
    }
}

/// A fitted trend and its forward projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    /// Fitted slope per index step
    pub slope: f64,

    /// Fitted intercept
    pub intercept: f64,

    /// Most recent observed value
    pub current_value: f64,

    /// Extrapolated value after the horizon, clamped
    pub projected_value: f64,

    /// Horizon the projection covers, in index steps
    pub horizon: i64,
}

impl Projection {
    /// Index steps until the trajectory reaches `threshold`.
    ///
    /// Returns None when the slope is flat or negative, or the current
    /// value already meets the threshold.
    pub fn eta_to(&self, threshold: f64) -> Option<i64> {
        if self.slope <= SLOPE_EPSILON || self.current_value >= threshold {
            return None;
        }
        Some(((threshold - self.current_value) / self.slope).ceil() as i64)
    }
}

/// Fits a least-squares line through (index, value) history
pub struct TrendProjector {
    config: TrendConfig,
}

impl TrendProjector {
    /// Create a projector, validating the clamp range
    pub fn new(config: TrendConfig) -> Result<Self, TrendError> {
        if !config.clamp_min.is_finite()
            || !config.clamp_max.is_finite()
            || config.clamp_min >= config.clamp_max
        {
            return Err(TrendError::InvalidClamp {
                min: config.clamp_min,
                max: config.clamp_max,
            });
        }
        Ok(Self { config })
    }

    /// Fit the history and project `horizon` index steps forward.
    ///
    /// Indices are monotonic time buckets (e.g. week numbers) and must be
    /// strictly increasing. Fewer than two points is an explicit
    /// InsufficientHistory outcome.
    pub fn project(&self, history: &[(i64, f64)], horizon: i64) -> Result<Projection, TrendError> {
        if history.len() < 2 {
            return Err(TrendError::InsufficientHistory {
                points: history.len(),
            });
        }

        for pair in history.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(TrendError::UnorderedHistory { index: pair[1].0 });
            }
        }
        for (index, value) in history {
            if !value.is_finite() {
                return Err(TrendError::NonFinite { index: *index });
            }
        }

        let n = history.len() as f64;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_xy = 0.0;
        let mut sum_x2 = 0.0;
        for (index, value) in history {
            let x = *index as f64;
            sum_x += x;
            sum_y += value;
            sum_xy += x * value;
            sum_x2 += x * x;
        }

        let denominator = n * sum_x2 - sum_x * sum_x;
        if denominator.abs() < SLOPE_EPSILON {
            return Err(TrendError::DegenerateHistory);
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        let current_value = history[history.len() - 1].1;
        let projected_value = (current_value + slope * horizon as f64)
            .clamp(self.config.clamp_min, self.config.clamp_max);

        debug!(slope, projected_value, horizon, "fitted trend");

        Ok(Projection {
            slope,
            intercept,
            current_value,
            projected_value,
            horizon,
        })
    }
}

impl Default for TrendProjector {
    fn default() -> Self {
        Self::new(TrendConfig::default()).expect("default trend config is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_exact_line() {
        let projector = TrendProjector::new(TrendConfig {
            clamp_min: 0.0,
            clamp_max: 100.0,
        })
        .unwrap();

        // y = 2x + 1
        let history = vec![(0, 1.0), (1, 3.0), (2, 5.0), (3, 7.0)];
        let projection = projector.project(&history, 2).unwrap();

        assert!((projection.slope - 2.0).abs() < 1e-9);
        assert!((projection.intercept - 1.0).abs() < 1e-9);
        assert!((projection.projected_value - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_clamped() {
        let projector = TrendProjector::default();
        let history = vec![(0, 0.6), (1, 0.8)];
        let projection = projector.project(&history, 5).unwrap();

        assert_eq!(projection.projected_value, 1.0);
    }

    #[test]
    fn test_insufficient_history_is_explicit() {
        let projector = TrendProjector::default();

        let empty = projector.project(&[], 4);
        assert!(matches!(
            empty,
            Err(TrendError::InsufficientHistory { points: 0 })
        ));

        let single = projector.project(&[(0, 0.5)], 4);
        assert!(matches!(
            single,
            Err(TrendError::InsufficientHistory { points: 1 })
        ));
    }

    #[test]
    fn test_eta_to_threshold() {
        let projector = TrendProjector::default();
        let history = vec![(0, 0.1), (1, 0.2), (2, 0.3)];
        let projection = projector.project(&history, 1).unwrap();

        // slope 0.1, current 0.3 -> (0.7 - 0.3) / 0.1 = 4 steps
        assert_eq!(projection.eta_to(0.7), Some(4));
    }

    #[test]
    fn test_eta_none_when_flat_or_reached() {
        let projector = TrendProjector::default();

        let flat = projector.project(&[(0, 0.5), (1, 0.5)], 1).unwrap();
        assert_eq!(flat.eta_to(0.7), None);

        let falling = projector.project(&[(0, 0.9), (1, 0.6)], 1).unwrap();
        assert_eq!(falling.eta_to(0.7), None);

        let reached = projector.project(&[(0, 0.6), (1, 0.8)], 1).unwrap();
        assert_eq!(reached.eta_to(0.7), None);
    }

    #[test]
    fn test_unordered_history_rejected() {
        let projector = TrendProjector::default();
        let result = projector.project(&[(3, 0.1), (1, 0.2)], 1);
        assert!(matches!(result, Err(TrendError::UnorderedHistory { .. })));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let projector = TrendProjector::default();
        let result = projector.project(&[(0, 0.1), (1, f64::NAN)], 1);
        assert!(matches!(result, Err(TrendError::NonFinite { .. })));
    }
}
