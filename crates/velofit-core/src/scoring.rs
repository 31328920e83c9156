//! Scoring: deviations, severities, per-area and overall fit scores.
//!
//! A measured angle inside its ideal range scores 100. Outside it, the score
//! drops by 40 points per full range width of deviation and floors at 0.
//!
//! # Example
//!
//! ```rust
//! use velofit_core::profile::AngleRange;
//! use velofit_core::scoring::{score_area, severity_for, Severity};
//!
//! let range = AngleRange::new(140.0, 150.0, 30.0).unwrap();
//! assert_eq!(score_area(120.0, &range), 20.0);
//! assert_eq!(severity_for(20.0, range.width()), Severity::Critical);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{AngleStats, CyclingAngles};
use crate::error::{FitError, FitResult};
use crate::frame::AngleKind;
use crate::profile::{AngleRange, RangeProfile};

/// Points lost per full range width of deviation.
pub const PENALTY_PER_RANGE_WIDTH: f64 = 40.0;

// =============================================================================
// Severity
// =============================================================================

/// Qualitative bucket of a deviation, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Within the ideal range.
    Optimal,
    /// Up to half a range width outside.
    Minor,
    /// Up to one range width outside.
    Moderate,
    /// More than one range width outside.
    Critical,
}

impl Severity {
    /// Lowercase identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Critical => "critical",
        }
    }

    /// Hex color used by presentation layers.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Optimal => "#22c55e",
            Self::Minor => "#eab308",
            Self::Moderate => "#f97316",
            Self::Critical => "#ef4444",
        }
    }

    /// Returns `true` unless the area is already within range.
    #[must_use]
    pub fn needs_adjustment(&self) -> bool {
        !matches!(self, Self::Optimal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "OPTIMAL"),
            Self::Minor => write!(f, "MINOR"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// =============================================================================
// Deviation
// =============================================================================

/// Where a measured value falls relative to its ideal range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deviation {
    /// Inside `[min, max]`.
    Within,
    /// Below `min` by this many degrees.
    Below(f64),
    /// Above `max` by this many degrees.
    Above(f64),
}

impl Deviation {
    /// Classifies `value` against `range`.
    #[must_use]
    pub fn of(value: f64, range: &AngleRange) -> Self {
        if value < range.min() {
            Self::Below(range.min() - value)
        } else if value > range.max() {
            Self::Above(value - range.max())
        } else {
            Self::Within
        }
    }

    /// Unsigned distance outside the range in degrees.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        match self {
            Self::Within => 0.0,
            Self::Below(d) | Self::Above(d) => *d,
        }
    }
}

// =============================================================================
// Scoring functions
// =============================================================================

/// Score in [0, 100] for one measured value.
#[must_use]
pub fn score_area(value: f64, range: &AngleRange) -> f64 {
    let deviation = Deviation::of(value, range).magnitude();
    (100.0 - deviation / range.width() * PENALTY_PER_RANGE_WIDTH).clamp(0.0, 100.0)
}

/// Severity bucket for a deviation, with inclusive upper bounds at 0.5 and
/// 1.0 range widths.
#[must_use]
pub fn severity_for(deviation: f64, range_width: f64) -> Severity {
    let ratio = deviation / range_width;
    if ratio <= 0.0 {
        Severity::Optimal
    } else if ratio <= 0.5 {
        Severity::Minor
    } else if ratio <= 1.0 {
        Severity::Moderate
    } else {
        Severity::Critical
    }
}

/// Weighted mean of the scores of scoreable areas.
///
/// An area without a score (`None`) or without a weight entry is left out of
/// both sums. The result is clamped to [0, 100] since fractional weights can
/// push a perfect fit a rounding step past 100.
///
/// # Errors
///
/// Returns [`FitError::NoScoreableAreas`] if no area remains or the remaining
/// weights sum to zero.
pub fn overall_score(
    area_scores: &BTreeMap<AngleKind, Option<f64>>,
    weights: &BTreeMap<AngleKind, f64>,
) -> FitResult<f64> {
    let (weighted, total) = area_scores
        .iter()
        .filter_map(|(kind, score)| Some(((*score)?, *weights.get(kind)?)))
        .fold((0.0, 0.0), |(sum, w_sum), (score, w)| (sum + score * w, w_sum + w));
    if total <= 0.0 {
        return Err(FitError::NoScoreableAreas);
    }
    Ok((weighted / total).clamp(0.0, 100.0))
}

/// The value of an aggregated angle that is compared against its range.
///
/// Knee extension is judged at the bottom of the stroke (largest extension),
/// hip angle at the top (most closed). Ankle uses the middle of its swing.
/// Back, elbow and shoulder are held roughly static and use the mean.
#[must_use]
pub fn measured_value(kind: AngleKind, stats: &AngleStats) -> f64 {
    match kind {
        AngleKind::KneeExtension => stats.max,
        AngleKind::Hip => stats.min,
        AngleKind::Ankle => stats.midpoint(),
        AngleKind::Back | AngleKind::Elbow | AngleKind::Shoulder => stats.mean,
    }
}

// =============================================================================
// FitCategory and FitScore
// =============================================================================

/// Overall fit band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitCategory {
    /// Below 55.
    Poor,
    /// 55 to below 75.
    Fair,
    /// 75 to below 90.
    Good,
    /// 90 and above.
    Excellent,
}

impl FitCategory {
    /// Band for an overall score; lower bounds are inclusive.
    #[must_use]
    pub fn from_score(overall: f64) -> Self {
        if overall >= 90.0 {
            Self::Excellent
        } else if overall >= 75.0 {
            Self::Good
        } else if overall >= 55.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Lowercase identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }

    /// Hex color used by presentation layers.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "#22c55e",
            Self::Good => "#84cc16",
            Self::Fair => "#eab308",
            Self::Poor => "#ef4444",
        }
    }
}

impl fmt::Display for FitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall and per-area scores of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "FitScoreRecord", try_from = "FitScoreRecord")]
pub struct FitScore {
    overall: f64,
    area_scores: BTreeMap<AngleKind, f64>,
}

impl FitScore {
    /// Creates a score, checking every value is within [0, 100].
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range or non-finite scores.
    pub fn new(overall: f64, area_scores: BTreeMap<AngleKind, f64>) -> FitResult<Self> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(overall) {
            return Err(FitError::validation(format!(
                "Overall score must be in [0, 100], got {overall}"
            )));
        }
        if let Some((kind, score)) = area_scores.iter().find(|(_, s)| !in_range(**s)) {
            return Err(FitError::validation(format!(
                "{kind} score must be in [0, 100], got {score}"
            )));
        }
        Ok(Self {
            overall,
            area_scores,
        })
    }

    /// Weighted overall score.
    #[must_use]
    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// Score of one area, if it was scoreable.
    #[must_use]
    pub fn area(&self, kind: AngleKind) -> Option<f64> {
        self.area_scores.get(&kind).copied()
    }

    /// Scores of all scoreable areas.
    #[must_use]
    pub fn area_scores(&self) -> &BTreeMap<AngleKind, f64> {
        &self.area_scores
    }

    /// Category derived from the overall score.
    #[must_use]
    pub fn category(&self) -> FitCategory {
        FitCategory::from_score(self.overall)
    }

    /// Primitive persisted form.
    #[must_use]
    pub fn to_record(&self) -> FitScoreRecord {
        FitScoreRecord::from(self.clone())
    }
}

/// Primitive form of a [`FitScore`] for persistence.
///
/// `reach_score` holds the elbow area. `category` is written for readers but
/// ignored on load and recomputed from `overall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitScoreRecord {
    /// Weighted overall score.
    pub overall: f64,
    /// Knee extension score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knee_score: Option<f64>,
    /// Hip angle score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hip_score: Option<f64>,
    /// Back angle score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_score: Option<f64>,
    /// Ankle angle score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ankle_score: Option<f64>,
    /// Elbow angle score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reach_score: Option<f64>,
    /// Shoulder angle score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_score: Option<f64>,
    /// Category string.
    #[serde(default)]
    pub category: String,
}

impl From<FitScore> for FitScoreRecord {
    fn from(score: FitScore) -> Self {
        let area = |k| score.area(k);
        Self {
            overall: score.overall,
            knee_score: area(AngleKind::KneeExtension),
            hip_score: area(AngleKind::Hip),
            back_score: area(AngleKind::Back),
            ankle_score: area(AngleKind::Ankle),
            reach_score: area(AngleKind::Elbow),
            shoulder_score: area(AngleKind::Shoulder),
            category: score.category().as_str().to_string(),
        }
    }
}

impl TryFrom<FitScoreRecord> for FitScore {
    type Error = FitError;

    fn try_from(record: FitScoreRecord) -> Result<Self, Self::Error> {
        let areas = [
            (AngleKind::KneeExtension, record.knee_score),
            (AngleKind::Hip, record.hip_score),
            (AngleKind::Back, record.back_score),
            (AngleKind::Ankle, record.ankle_score),
            (AngleKind::Elbow, record.reach_score),
            (AngleKind::Shoulder, record.shoulder_score),
        ];
        Self::new(
            record.overall,
            areas
                .into_iter()
                .filter_map(|(k, s)| s.map(|s| (k, s)))
                .collect(),
        )
    }
}

// =============================================================================
// ScoringEngine
// =============================================================================

/// Scores aggregated angles against a [`RangeProfile`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Creates a scoring engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Per-area scores for every angle the profile covers. Angles without
    /// statistics map to `None`.
    #[must_use]
    pub fn area_scores(
        &self,
        angles: &CyclingAngles,
        profile: &RangeProfile,
    ) -> BTreeMap<AngleKind, Option<f64>> {
        profile
            .ranges()
            .map(|(kind, range)| {
                let score = angles
                    .get(kind)
                    .map(|stats| score_area(measured_value(kind, stats), range));
                (kind, score)
            })
            .collect()
    }

    /// Scores a run.
    ///
    /// Areas that have statistics but zero weight get a per-area score and
    /// do not affect the overall score.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::NoScoreableAreas`] if no weighted area has
    /// statistics.
    pub fn score(&self, angles: &CyclingAngles, profile: &RangeProfile) -> FitResult<FitScore> {
        let areas = self.area_scores(angles, profile);
        let overall = overall_score(&areas, &profile.weights())?;
        let area_scores: BTreeMap<AngleKind, f64> = areas
            .into_iter()
            .filter_map(|(k, s)| s.map(|s| (k, s)))
            .collect();
        debug!(overall, areas = area_scores.len(), "Scored fit");
        FitScore::new(overall, area_scores)
    }
}
