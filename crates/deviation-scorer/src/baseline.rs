//! Learned baseline profiles

use crate::DeviationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Learned normal range for one metric dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionBaseline {
    /// Baseline mean
    pub mean: f64,

    /// Baseline standard deviation
    pub stddev: f64,

    /// Number of samples the baseline was learned from
    pub sample_count: u32,

    /// When the learning process produced this baseline
    pub learned_at: DateTime<Utc>,

    /// Baseline expiry; an expired baseline must be relearned
    pub valid_until: DateTime<Utc>,
}

impl DimensionBaseline {
    /// Reject an expired baseline as "signal unavailable"
    pub fn ensure_valid(&self, dimension: &str, now: DateTime<Utc>) -> Result<(), DeviationError> {
        if now >= self.valid_until {
            return Err(DeviationError::ExpiredBaseline {
                dimension: dimension.to_string(),
                valid_until: self.valid_until,
            });
        }
        Ok(())
    }
}

/// A subject's learned baselines, one per metric dimension.
///
/// Produced by an external learning process and consumed read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineProfile {
    /// Subject the profile belongs to
    pub subject_id: String,

    /// Per-dimension baselines, keyed by metric name
    pub dimensions: HashMap<String, DimensionBaseline>,
}

impl BaselineProfile {
    /// Create an empty profile for a subject
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            dimensions: HashMap::new(),
        }
    }

    /// Look up one dimension's baseline
    pub fn dimension(&self, name: &str) -> Option<&DimensionBaseline> {
        self.dimensions.get(name)
    }

    /// Dimension names present in the profile
    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expired_baseline_rejected() {
        let now = Utc::now();
        let baseline = DimensionBaseline {
            mean: 10.0,
            stddev: 2.0,
            sample_count: 50,
            learned_at: now - Duration::days(60),
            valid_until: now - Duration::days(1),
        };

        let result = baseline.ensure_valid("void_rate", now);
        assert!(matches!(result, Err(DeviationError::ExpiredBaseline { .. })));
    }

    #[test]
    fn test_current_baseline_accepted() {
        let now = Utc::now();
        let baseline = DimensionBaseline {
            mean: 10.0,
            stddev: 2.0,
            sample_count: 50,
            learned_at: now - Duration::days(10),
            valid_until: now + Duration::days(20),
        };

        assert!(baseline.ensure_valid("void_rate", now).is_ok());
    }
}
