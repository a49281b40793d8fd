//! Event records and correlation results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of event in a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Register transaction (sale, void, refund)
    Transaction,
    /// Person detection from a camera covering the register zone
    CameraDetection,
    /// Terminal or back-office login
    TerminalLogin,
    /// Door or restricted-area access
    DoorAccess,
}

/// A single timestamped event from one stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Stream-unique event id
    pub event_id: String,

    /// Subject (staff member) the event is attributed to
    pub subject_ref: String,

    /// What kind of event this is
    pub kind: EventKind,

    /// When the event occurred
    pub timestamp: DateTime<Utc>,

    /// Register, camera, or door identifier
    pub location_ref: Option<String>,

    /// Producer confidence in the event (0-1)
    pub confidence: f64,
}

/// Classification of an anchor event against its candidate stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchClass {
    /// One corroborating candidate inside the window
    Matched,
    /// No candidate inside the window at all
    Ghost,
    /// Best candidate fell below the confidence floor
    LowConfidence,
    /// Multiple independent candidates crowd the anchor
    MultiCandidate,
}

impl MatchClass {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchClass::Matched => "matched",
            MatchClass::Ghost => "ghost",
            MatchClass::LowConfidence => "low_confidence",
            MatchClass::MultiCandidate => "multi_candidate",
        }
    }
}

/// Result of correlating one anchor event against a candidate stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// The anchor event that was being corroborated
    pub anchor: EventRecord,

    /// Best-matching candidate, if any survived the window filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<EventRecord>,

    /// Signed offset of the match from the anchor, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_delta_ms: Option<i64>,

    /// How the anchor was classified
    pub classification: MatchClass,

    /// Number of candidates that fell inside the window
    pub candidates_in_window: usize,
}

impl CorrelationResult {
    /// Whether the anchor was corroborated cleanly
    pub fn is_confirmed(&self) -> bool {
        self.classification == MatchClass::Matched
    }
}
