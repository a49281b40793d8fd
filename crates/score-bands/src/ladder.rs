//! Ordered-threshold table

use thiserror::Error;

/// Errors constructing a threshold ladder
#[derive(Debug, Clone, Error)]
pub enum LadderError {
    /// Threshold is NaN or infinite
    #[error("threshold {0} is not finite")]
    NonFinite(f64),

    /// Two bands share the same threshold
    #[error("duplicate threshold {0}")]
    Duplicate(f64),

    /// Ladder has no bands at all
    #[error("ladder requires at least one band")]
    Empty,
}

/// An ordered table of (threshold, label) bands.
///
/// Classification scans from the highest threshold down and returns the
/// label of the first band the value meets or exceeds; below all bands
/// the floor label applies.
#[derive(Debug, Clone)]
pub struct ThresholdLadder<L> {
    bands: Vec<(f64, L)>,
    floor: L,
}

impl<L: Copy> ThresholdLadder<L> {
    /// Create a ladder from bands and a floor label.
    ///
    /// Bands may be passed in any order; they are sorted descending.
    /// Duplicate or non-finite thresholds are rejected.
    pub fn new(mut bands: Vec<(f64, L)>, floor: L) -> Result<Self, LadderError> {
        if bands.is_empty() {
            return Err(LadderError::Empty);
        }

        for (threshold, _) in &bands {
            if !threshold.is_finite() {
                return Err(LadderError::NonFinite(*threshold));
            }
        }

        bands.sort_by(|a, b| b.0.total_cmp(&a.0));

        for pair in bands.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(LadderError::Duplicate(pair[0].0));
            }
        }

        Ok(Self { bands, floor })
    }

    /// Classify a value: first band met-or-exceeded wins, else the floor.
    pub fn classify(&self, value: f64) -> L {
        for (threshold, label) in &self.bands {
            if value >= *threshold {
                return *label;
            }
        }
        self.floor
    }

    /// Highest threshold in the ladder
    pub fn top_threshold(&self) -> f64 {
        self.bands[0].0
    }

    /// Number of bands above the floor
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}
