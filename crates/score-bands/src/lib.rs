//! Score Banding
//!
//! Provides the shared ordered-threshold table used to map continuous
//! scores onto discrete risk and severity levels. One configurable
//! ladder type serves every component that bands a score.

mod ladder;

pub use ladder::{LadderError, ThresholdLadder};

use serde::{Deserialize, Serialize};

/// Composite risk level for a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Plain-language label for reports
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "No elevated risk detected",
            RiskLevel::Medium => "Elevated risk - monitor closely",
            RiskLevel::High => "High risk - review evidence and schedule investigation",
            RiskLevel::Critical => "Critical risk - immediate investigation required",
        }
    }

    /// Default composite-score ladder: 0.85 critical, 0.70 high, 0.50 medium
    pub fn default_ladder() -> ThresholdLadder<RiskLevel> {
        ThresholdLadder::new(
            vec![
                (0.85, RiskLevel::Critical),
                (0.70, RiskLevel::High),
                (0.50, RiskLevel::Medium),
            ],
            RiskLevel::Low,
        )
        .expect("default risk ladder is valid")
    }
}

/// Deviation severity for a single metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Normal,
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Severity {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }

    /// Default sigma ladder: 4.0 critical, 3.0 major, 2.0 moderate, 1.0 minor
    pub fn default_ladder() -> ThresholdLadder<Severity> {
        ThresholdLadder::new(
            vec![
                (4.0, Severity::Critical),
                (3.0, Severity::Major),
                (2.0, Severity::Moderate),
                (1.0, Severity::Minor),
            ],
            Severity::Normal,
        )
        .expect("default severity ladder is valid")
    }
}
