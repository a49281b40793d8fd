//! Correlation algorithm

use crate::error::CorrelatorError;
use crate::event::{CorrelationResult, EventRecord, MatchClass};
use chrono::Duration;
use std::collections::HashSet;
use tracing::debug;

/// Correlator configuration
#[derive(Debug, Clone)]
pub struct CorrelatorConfig {
    /// Tolerance window around the anchor timestamp
    pub window: Duration,

    /// Minimum candidate confidence for a clean match
    pub min_confidence: f64,

    /// Fraction of the window used for multi-candidate crowding checks
    pub multi_candidate_fraction: f64,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            window: Duration::seconds(120),
            min_confidence: 0.75,
            multi_candidate_fraction: 0.5,
        }
    }
}

/// Matches anchor events against a candidate stream.
///
/// Candidate sets are small (bounded by window size and event rate), so
/// best-match selection is a single linear scan.
pub struct Correlator {
    config: CorrelatorConfig,
}

impl Correlator {
    /// Create a correlator, validating the configuration
    pub fn new(config: CorrelatorConfig) -> Result<Self, CorrelatorError> {
        if config.window <= Duration::zero() {
            return Err(CorrelatorError::InvalidWindow(
                config.window.num_milliseconds(),
            ));
        }
        if !config.min_confidence.is_finite()
            || !(0.0..=1.0).contains(&config.min_confidence)
        {
            return Err(CorrelatorError::InvalidConfidence {
                field: "min_confidence",
                value: config.min_confidence,
            });
        }
        if !config.multi_candidate_fraction.is_finite()
            || config.multi_candidate_fraction <= 0.0
            || config.multi_candidate_fraction > 1.0
        {
            return Err(CorrelatorError::InvalidFraction(
                config.multi_candidate_fraction,
            ));
        }
        Ok(Self { config })
    }

    /// Correlate one anchor against a candidate stream.
    ///
    /// Out-of-window candidates are discarded here even if the caller
    /// passed an unfiltered set. Classification priority: Ghost, then
    /// LowConfidence, then MultiCandidate, then Matched.
    pub fn correlate(
        &self,
        anchor: &EventRecord,
        candidates: &[EventRecord],
    ) -> Result<CorrelationResult, CorrelatorError> {
        Self::validate_confidence("anchor", anchor.confidence)?;
        for candidate in candidates {
            Self::validate_confidence("candidate", candidate.confidence)?;
        }

        let in_window: Vec<&EventRecord> = candidates
            .iter()
            .filter(|c| Self::abs_delta(anchor, c) <= self.config.window)
            .collect();

        if in_window.is_empty() {
            debug!(
                event_id = %anchor.event_id,
                "no candidates in window, classifying as ghost"
            );
            return Ok(CorrelationResult {
                anchor: anchor.clone(),
                matched: None,
                time_delta_ms: None,
                classification: MatchClass::Ghost,
                candidates_in_window: 0,
            });
        }

        // Smallest absolute delta wins; ties broken by higher confidence.
        let mut best = in_window[0];
        for candidate in in_window.iter().skip(1) {
            let delta_best = Self::abs_delta(anchor, best);
            let delta_cand = Self::abs_delta(anchor, candidate);
            if delta_cand < delta_best
                || (delta_cand == delta_best && candidate.confidence > best.confidence)
            {
                best = candidate;
            }
        }

        let classification = if best.confidence < self.config.min_confidence {
            MatchClass::LowConfidence
        } else if self.crowded(anchor, &in_window) {
            MatchClass::MultiCandidate
        } else {
            MatchClass::Matched
        };

        let delta = best.timestamp - anchor.timestamp;
        Ok(CorrelationResult {
            anchor: anchor.clone(),
            matched: Some(best.clone()),
            time_delta_ms: Some(delta.num_milliseconds()),
            classification,
            candidates_in_window: in_window.len(),
        })
    }

    /// More than one independent candidate inside the stricter sub-window
    fn crowded(&self, anchor: &EventRecord, in_window: &[&EventRecord]) -> bool {
        let sub_window_ms = (self.config.window.num_milliseconds() as f64
            * self.config.multi_candidate_fraction) as i64;
        let sub_window = Duration::milliseconds(sub_window_ms);

        let mut distinct: HashSet<&str> = HashSet::new();
        for candidate in in_window {
            if Self::abs_delta(anchor, candidate) <= sub_window {
                distinct.insert(candidate.event_id.as_str());
            }
        }
        distinct.len() > 1
    }

    fn abs_delta(anchor: &EventRecord, candidate: &EventRecord) -> Duration {
        let delta = candidate.timestamp - anchor.timestamp;
        if delta < Duration::zero() {
            -delta
        } else {
            delta
        }
    }

    fn validate_confidence(field: &'static str, value: f64) -> Result<(), CorrelatorError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(CorrelatorError::InvalidConfidence { field, value });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, kind: EventKind, epoch_secs: i64, confidence: f64) -> EventRecord {
        EventRecord {
            event_id: id.to_string(),
            subject_ref: "staff-7".to_string(),
            kind,
            timestamp: Utc.timestamp_opt(epoch_secs, 0).unwrap(),
            location_ref: Some("register-2".to_string()),
            confidence,
        }
    }

    fn correlator(window_secs: i64, min_confidence: f64) -> Correlator {
        Correlator::new(CorrelatorConfig {
            window: Duration::seconds(window_secs),
            min_confidence,
            multi_candidate_fraction: 0.5,
        })
        .unwrap()
    }

    #[test]
    fn test_best_match_smallest_delta() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        let candidates = vec![
            event("cam-1", EventKind::CameraDetection, 970, 0.8),
            event("cam-2", EventKind::CameraDetection, 1005, 0.85),
            event("cam-3", EventKind::CameraDetection, 1050, 0.9),
        ];

        let result = correlator(30, 0.75).correlate(&anchor, &candidates).unwrap();

        assert_eq!(result.classification, MatchClass::Matched);
        assert_eq!(result.matched.as_ref().unwrap().event_id, "cam-2");
        assert_eq!(result.time_delta_ms, Some(5_000));
        // cam-3 is 50s away, outside the 30s window
        assert_eq!(result.candidates_in_window, 2);
    }

    #[test]
    fn test_empty_candidates_is_ghost() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        let result = correlator(30, 0.75).correlate(&anchor, &[]).unwrap();

        assert_eq!(result.classification, MatchClass::Ghost);
        assert!(result.matched.is_none());
        assert!(result.time_delta_ms.is_none());
    }

    #[test]
    fn test_all_candidates_outside_window_is_ghost() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        let candidates = vec![event("cam-1", EventKind::CameraDetection, 2000, 0.9)];
        let result = correlator(30, 0.75).correlate(&anchor, &candidates).unwrap();

        assert_eq!(result.classification, MatchClass::Ghost);
    }

    #[test]
    fn test_low_confidence_match() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        let candidates = vec![event("cam-1", EventKind::CameraDetection, 1002, 0.4)];
        let result = correlator(30, 0.75).correlate(&anchor, &candidates).unwrap();

        assert_eq!(result.classification, MatchClass::LowConfidence);
        assert!(result.matched.is_some());
    }

    #[test]
    fn test_multi_candidate_in_sub_window() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        let candidates = vec![
            event("cam-1", EventKind::CameraDetection, 1003, 0.9),
            event("cam-2", EventKind::CameraDetection, 1010, 0.85),
        ];
        let result = correlator(30, 0.75).correlate(&anchor, &candidates).unwrap();

        assert_eq!(result.classification, MatchClass::MultiCandidate);
    }

    #[test]
    fn test_second_candidate_outside_sub_window_still_matched() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        // cam-2 is inside the 30s window but outside the 15s sub-window
        let candidates = vec![
            event("cam-1", EventKind::CameraDetection, 1003, 0.9),
            event("cam-2", EventKind::CameraDetection, 1025, 0.85),
        ];
        let result = correlator(30, 0.75).correlate(&anchor, &candidates).unwrap();

        assert_eq!(result.classification, MatchClass::Matched);
    }

    #[test]
    fn test_tie_broken_by_confidence() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        let candidates = vec![
            event("cam-1", EventKind::CameraDetection, 995, 0.8),
            event("cam-2", EventKind::CameraDetection, 1005, 0.95),
        ];
        let result = correlator(30, 0.75).correlate(&anchor, &candidates).unwrap();

        assert_eq!(result.matched.as_ref().unwrap().event_id, "cam-2");
    }

    #[test]
    fn test_rejects_non_positive_window() {
        let result = Correlator::new(CorrelatorConfig {
            window: Duration::seconds(0),
            ..Default::default()
        });
        assert!(matches!(result, Err(CorrelatorError::InvalidWindow(_))));
    }

    #[test]
    fn test_rejects_bad_candidate_confidence() {
        let anchor = event("tx-1", EventKind::Transaction, 1000, 1.0);
        let candidates = vec![event("cam-1", EventKind::CameraDetection, 1002, 1.7)];
        let result = correlator(30, 0.75).correlate(&anchor, &candidates);
        assert!(matches!(
            result,
            Err(CorrelatorError::InvalidConfidence { .. })
        ));
    }
}
