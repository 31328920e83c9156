//! Sequence aggregation: per-frame angle bundles to [`CyclingAngles`].
//!
//! For each angle the per-frame series (usable frames where that angle was
//! computable, in frame order) is smoothed with a centered moving average and
//! then reduced to min/max/mean. Smoothing first keeps single-frame detector
//! jitter from setting the extremes.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FitError, FitResult};
use crate::frame::{AngleBundle, AngleKind, FrameEvaluator};
use crate::types::JointSequence;
use crate::utils::{min_max_mean, moving_average};
use crate::{DEFAULT_MIN_USABLE_FRAMES, DEFAULT_SMOOTHING_WINDOW};

/// Summary statistics of one smoothed angle series, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleStats {
    /// Smallest smoothed value.
    pub min: f64,
    /// Largest smoothed value.
    pub max: f64,
    /// Mean of the smoothed series.
    pub mean: f64,
    /// Number of frames that contributed.
    pub samples: usize,
}

impl AngleStats {
    /// Smooths `series` and reduces it. `None` for an empty series.
    #[must_use]
    pub fn from_series(series: &[f64], smoothing_window: usize) -> Option<Self> {
        let raw = Array1::from(series.to_vec());
        let smoothed = moving_average(&raw, smoothing_window);
        let (min, max, mean) = min_max_mean(&smoothed)?;
        Some(Self {
            min,
            max,
            mean,
            samples: series.len(),
        })
    }

    /// Midpoint of min and max.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Range of motion (max − min).
    #[must_use]
    pub fn range_of_motion(&self) -> f64 {
        self.max - self.min
    }
}

/// Aggregated angles for one analysis run. An absent field had no
/// computable samples and is not scoreable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CyclingAngles {
    /// Hip–knee–ankle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knee_extension: Option<AngleStats>,
    /// Shoulder–hip–knee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hip_angle: Option<AngleStats>,
    /// Torso against horizontal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_angle: Option<AngleStats>,
    /// Knee–ankle–toe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ankle_angle: Option<AngleStats>,
    /// Shoulder–elbow–wrist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elbow_angle: Option<AngleStats>,
    /// Hip–shoulder–elbow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_angle: Option<AngleStats>,
}

impl CyclingAngles {
    /// Statistics for one angle.
    #[must_use]
    pub fn get(&self, kind: AngleKind) -> Option<&AngleStats> {
        match kind {
            AngleKind::KneeExtension => self.knee_extension.as_ref(),
            AngleKind::Hip => self.hip_angle.as_ref(),
            AngleKind::Back => self.back_angle.as_ref(),
            AngleKind::Ankle => self.ankle_angle.as_ref(),
            AngleKind::Elbow => self.elbow_angle.as_ref(),
            AngleKind::Shoulder => self.shoulder_angle.as_ref(),
        }
    }

    fn slot(&mut self, kind: AngleKind) -> &mut Option<AngleStats> {
        match kind {
            AngleKind::KneeExtension => &mut self.knee_extension,
            AngleKind::Hip => &mut self.hip_angle,
            AngleKind::Back => &mut self.back_angle,
            AngleKind::Ankle => &mut self.ankle_angle,
            AngleKind::Elbow => &mut self.elbow_angle,
            AngleKind::Shoulder => &mut self.shoulder_angle,
        }
    }

    /// Deepest knee bend, `180 − min(knee extension)`.
    #[must_use]
    pub fn knee_flexion_max(&self) -> Option<f64> {
        self.knee_extension.map(|s| 180.0 - s.min)
    }

    /// Angles that have statistics.
    pub fn present(&self) -> impl Iterator<Item = (AngleKind, &AngleStats)> {
        AngleKind::ALL
            .into_iter()
            .filter_map(move |k| self.get(k).map(|s| (k, s)))
    }
}

/// Reduces a [`JointSequence`] to [`CyclingAngles`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceAggregator {
    evaluator: FrameEvaluator,
    min_usable_frames: usize,
    smoothing_window: usize,
}

impl Default for SequenceAggregator {
    fn default() -> Self {
        Self::new(
            FrameEvaluator::default(),
            DEFAULT_MIN_USABLE_FRAMES,
            DEFAULT_SMOOTHING_WINDOW,
        )
    }
}

impl SequenceAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(evaluator: FrameEvaluator, min_usable_frames: usize, smoothing_window: usize) -> Self {
        Self {
            evaluator,
            min_usable_frames,
            smoothing_window,
        }
    }

    /// Frame evaluator used to select usable frames.
    #[must_use]
    pub fn evaluator(&self) -> &FrameEvaluator {
        &self.evaluator
    }

    /// Minimum number of usable frames.
    #[must_use]
    pub fn min_usable_frames(&self) -> usize {
        self.min_usable_frames
    }

    /// Smoothing window width in samples.
    #[must_use]
    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// Aggregates every usable frame of `sequence`.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InsufficientData`] if fewer than
    /// `min_usable_frames` frames are usable.
    pub fn aggregate(&self, sequence: &JointSequence) -> FitResult<CyclingAngles> {
        let bundles: Vec<AngleBundle> = sequence
            .frames()
            .iter()
            .filter_map(|f| self.evaluator.compute_frame_angles(f))
            .collect();
        self.aggregate_bundles(&bundles)
    }

    /// Aggregates bundles that were already computed for usable frames.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::InsufficientData`] if there are fewer bundles than
    /// `min_usable_frames`.
    pub fn aggregate_bundles(&self, bundles: &[AngleBundle]) -> FitResult<CyclingAngles> {
        if bundles.len() < self.min_usable_frames {
            return Err(FitError::InsufficientData {
                required: self.min_usable_frames,
                available: bundles.len(),
            });
        }

        let mut angles = CyclingAngles::default();
        for kind in AngleKind::ALL {
            let series: Vec<f64> = bundles.iter().filter_map(|b| b.get(kind)).collect();
            let stats = AngleStats::from_series(&series, self.smoothing_window);
            if stats.is_none() {
                debug!(angle = %kind, "No computable samples; angle absent");
            }
            *angles.slot(kind) = stats;
        }
        Ok(angles)
    }
}
