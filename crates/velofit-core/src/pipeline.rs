//! End-to-end analysis: joint sequence to fit report.
//!
//! [`FitAnalyzer`] runs the stages in one sequential pass:
//!
//! ```text
//! JointSequence -> FrameEvaluator -> SequenceAggregator -> ScoringEngine -> RecommendationGenerator
//! ```
//!
//! The analyzer owns no threads. Callers that run it in the background pass
//! a [`Cancellation`] and a progress callback to [`FitAnalyzer::analyze_with`].
//!
//! # Example
//!
//! ```rust,no_run
//! use velofit_core::pipeline::{AnalysisConfig, FitAnalyzer};
//! use velofit_core::types::JointSequence;
//!
//! # fn load() -> JointSequence { unimplemented!() }
//! let analyzer = FitAnalyzer::with_builtin_profiles(AnalysisConfig::default())?;
//! let report = analyzer.analyze(&load(), "road")?;
//! println!("{:.1} ({})", report.score.overall(), report.score.category());
//! # Ok::<(), velofit_core::FitError>(())
//! ```

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::aggregate::{CyclingAngles, SequenceAggregator};
use crate::error::{ConfigError, FitError, FitResult};
use crate::frame::{AngleBundle, FrameEvaluator};
use crate::profile::{ProfileTable, RidingStyle};
use crate::recommend::{Recommendation, RecommendationGenerator};
use crate::scoring::{FitScore, ScoringEngine};
use crate::types::{BodySide, JointSequence};
use crate::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MIN_USABLE_FRAMES, DEFAULT_SMOOTHING_WINDOW};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tunable analysis policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Body side facing the camera.
    pub body_side: BodySide,
    /// Required joints need confidence strictly above this. Range [0, 1).
    pub confidence_threshold: f64,
    /// Minimum usable frames for aggregation. At least 1.
    pub min_usable_frames: usize,
    /// Moving-average width in samples. At least 1.
    pub smoothing_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            body_side: BodySide::Left,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_usable_frames: DEFAULT_MIN_USABLE_FRAMES,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl AnalysisConfig {
    /// Validate all fields and return the first problem found.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::invalid_value(
                "confidence_threshold",
                format!("must be in [0, 1), got {}", self.confidence_threshold),
            ));
        }
        if self.min_usable_frames == 0 {
            return Err(ConfigError::invalid_value("min_usable_frames", "must be >= 1"));
        }
        if self.smoothing_window == 0 {
            return Err(ConfigError::invalid_value("smoothing_window", "must be >= 1"));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`], [`ConfigError::Parse`], or a
    /// validation error.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse { source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this configuration as pretty-printed JSON, creating parent
    /// directories if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileWrite`] if the directory or file cannot be
    /// written, or [`ConfigError::Serialize`].
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Serialize { source })?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Cancellation and progress
// ---------------------------------------------------------------------------

/// Cooperative cancellation, polled between frames and before aggregation.
pub trait Cancellation {
    /// Returns `true` once the caller wants the run abandoned.
    fn is_cancelled(&self) -> bool;
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: Cancellation + ?Sized> Cancellation for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// A [`Cancellation`] that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Pipeline stage, reported in progress updates and cancellations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Per-frame usability and angle computation.
    FrameEvaluation,
    /// Smoothing and min/max/mean reduction.
    Aggregation,
    /// Scoring and recommendations.
    Scoring,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameEvaluation => write!(f, "frame evaluation"),
            Self::Aggregation => write!(f, "aggregation"),
            Self::Scoring => write!(f, "scoring"),
        }
    }
}

/// Snapshot passed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisProgress {
    /// Current stage.
    pub stage: AnalysisStage,
    /// Frames evaluated so far.
    pub frames_evaluated: usize,
    /// Usable frames found so far.
    pub usable_frames: usize,
    /// Frames in the sequence.
    pub total_frames: usize,
}

impl AnalysisProgress {
    /// Fraction of frames evaluated, in [0, 1].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total_frames == 0 {
            1.0
        } else {
            self.frames_evaluated as f64 / self.total_frames as f64
        }
    }
}

// ---------------------------------------------------------------------------
// FitAnalyzer
// ---------------------------------------------------------------------------

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitReport {
    /// Style the run was scored against.
    pub style: RidingStyle,
    /// Frames in the input sequence.
    pub total_frames: usize,
    /// Frames that passed the usability check.
    pub usable_frames: usize,
    /// Aggregated angles.
    pub angles: CyclingAngles,
    /// Overall and per-area scores.
    pub score: FitScore,
    /// Recommendations, worst first.
    pub recommendations: Vec<Recommendation>,
}

/// Runs the full analysis for one sequence.
#[derive(Debug, Clone)]
pub struct FitAnalyzer {
    config: AnalysisConfig,
    aggregator: SequenceAggregator,
    profiles: ProfileTable,
    scoring: ScoringEngine,
    recommendations: RecommendationGenerator,
}

impl FitAnalyzer {
    /// Creates an analyzer with a custom profile table.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::Configuration`] if `config` is invalid.
    pub fn new(config: AnalysisConfig, profiles: ProfileTable) -> FitResult<Self> {
        config.validate()?;
        let evaluator = FrameEvaluator::new(config.body_side, config.confidence_threshold);
        let aggregator =
            SequenceAggregator::new(evaluator, config.min_usable_frames, config.smoothing_window);
        Ok(Self {
            config,
            aggregator,
            profiles,
            scoring: ScoringEngine::new(),
            recommendations: RecommendationGenerator::new(),
        })
    }

    /// Creates an analyzer using the built-in profile table.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::Configuration`] if `config` is invalid.
    pub fn with_builtin_profiles(config: AnalysisConfig) -> FitResult<Self> {
        Self::new(config, ProfileTable::builtin()?)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Profile table used for scoring.
    #[must_use]
    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Analyzes a sequence without cancellation or progress reporting.
    ///
    /// # Errors
    ///
    /// See [`FitAnalyzer::analyze_with`].
    pub fn analyze(&self, sequence: &JointSequence, style_id: &str) -> FitResult<FitReport> {
        self.analyze_with(sequence, style_id, &NeverCancel, &mut |_| {})
    }

    /// Analyzes a sequence, polling `cancel` after every frame and before
    /// aggregation, and calling `progress` after every frame and at each
    /// stage change.
    ///
    /// # Errors
    ///
    /// - [`FitError::UnknownStyle`] before any frame is touched
    /// - [`FitError::Cancelled`] if `cancel` fires
    /// - [`FitError::InsufficientData`] if too few frames are usable
    /// - [`FitError::NoScoreableAreas`] if nothing can be scored
    pub fn analyze_with(
        &self,
        sequence: &JointSequence,
        style_id: &str,
        cancel: &dyn Cancellation,
        progress: &mut dyn FnMut(&AnalysisProgress),
    ) -> FitResult<FitReport> {
        let profile = self.profiles.for_style(style_id)?;
        let span = info_span!("fit_analysis", style = %profile.style(), frames = sequence.len());
        let _enter = span.enter();

        let evaluator = self.aggregator.evaluator();
        let total_frames = sequence.len();
        let mut snapshot = AnalysisProgress {
            stage: AnalysisStage::FrameEvaluation,
            frames_evaluated: 0,
            usable_frames: 0,
            total_frames,
        };
        progress(&snapshot);

        let mut bundles: Vec<AngleBundle> = Vec::with_capacity(total_frames);
        for frame in sequence.frames() {
            if cancel.is_cancelled() {
                warn!(evaluated = snapshot.frames_evaluated, "Analysis cancelled");
                return Err(FitError::Cancelled {
                    stage: AnalysisStage::FrameEvaluation,
                });
            }
            if let Some(bundle) = evaluator.compute_frame_angles(frame) {
                bundles.push(bundle);
            }
            snapshot.frames_evaluated += 1;
            snapshot.usable_frames = bundles.len();
            progress(&snapshot);
        }

        if cancel.is_cancelled() {
            warn!("Analysis cancelled before aggregation");
            return Err(FitError::Cancelled {
                stage: AnalysisStage::Aggregation,
            });
        }
        snapshot.stage = AnalysisStage::Aggregation;
        progress(&snapshot);
        debug!(usable = bundles.len(), total = total_frames, "Frame evaluation done");
        let angles = self.aggregator.aggregate_bundles(&bundles)?;

        snapshot.stage = AnalysisStage::Scoring;
        progress(&snapshot);
        let score = self.scoring.score(&angles, profile)?;
        let recommendations = self
            .recommendations
            .generate(&angles, profile, score.area_scores());

        info!(
            usable = bundles.len(),
            total = total_frames,
            overall = score.overall(),
            category = %score.category(),
            "Fit analysis complete"
        );

        Ok(FitReport {
            style: profile.style(),
            total_frames,
            usable_frames: bundles.len(),
            angles,
            score,
            recommendations,
        })
    }
}
