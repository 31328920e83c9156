//! # VeloFit Core
//!
//! Bike-fit analysis from side-view pose data. Given per-frame joint
//! positions of a cyclist pedaling, this crate derives the key joint angles,
//! aggregates them over the sequence, scores them against the ideal ranges
//! of a riding style and produces ranked adjustment recommendations.
//!
//! ## Pipeline
//!
//! 1. **Geometry** ([`geometry`]): angle at a vertex and angle to horizontal,
//!    composed into knee, hip, back, ankle, elbow and shoulder angles.
//! 2. **Frame evaluation** ([`FrameEvaluator`]): drops frames where a
//!    required joint is missing or low-confidence, computes an
//!    [`AngleBundle`] for the rest.
//! 3. **Aggregation** ([`SequenceAggregator`]): moving-average smoothing per
//!    angle, then min/max/mean into [`CyclingAngles`].
//! 4. **Scoring** ([`ScoringEngine`]): per-area scores, severities and a
//!    weighted overall [`FitScore`] against a [`RangeProfile`].
//! 5. **Recommendations** ([`RecommendationGenerator`]): one entry per scored
//!    area, worst first.
//!
//! [`FitAnalyzer`] wires the stages together with cooperative cancellation
//! and progress reporting. [`RiderMeasurements`] and [`BikeGeometry`] describe
//! the rider and the current setup.
//!
//! ## Example
//!
//! ```rust
//! use velofit_core::prelude::*;
//!
//! let range = AngleRange::new(140.0, 150.0, 30.0).unwrap();
//! assert_eq!(score_area(145.0, &range), 100.0);
//! assert_eq!(severity_for(0.0, range.width()), Severity::Optimal);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod bike;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod pipeline;
pub mod profile;
pub mod recommend;
pub mod rider;
pub mod scoring;
pub mod types;
pub mod utils;

pub use aggregate::{AngleStats, CyclingAngles, SequenceAggregator};
pub use bike::BikeGeometry;
pub use error::{ConfigError, FitError, FitResult, GeometryError};
pub use frame::{AngleBundle, AngleKind, FrameEvaluator};
pub use pipeline::{
    AnalysisConfig, AnalysisProgress, AnalysisStage, Cancellation, FitAnalyzer, FitReport,
    NeverCancel,
};
pub use profile::{AngleRange, ProfileTable, RangeProfile, RidingStyle};
pub use recommend::{Component, Recommendation, RecommendationGenerator};
pub use rider::{Flexibility, RiderMeasurements};
pub use scoring::{FitCategory, FitScore, FitScoreRecord, ScoringEngine, Severity};
pub use types::{
    BodySide, Confidence, FrameJoints, JointName, JointPosition, JointRole, JointSequence, Point2,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Required joints need confidence strictly above this to count.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Fewer usable frames than this fails aggregation.
pub const DEFAULT_MIN_USABLE_FRAMES: usize = 3;

/// Moving-average width, in samples.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Commonly used types.
pub mod prelude {
    pub use crate::aggregate::{AngleStats, CyclingAngles, SequenceAggregator};
    pub use crate::bike::BikeGeometry;
    pub use crate::error::{ConfigError, FitError, FitResult};
    pub use crate::frame::{AngleBundle, AngleKind, FrameEvaluator};
    pub use crate::pipeline::{AnalysisConfig, Cancellation, FitAnalyzer, FitReport, NeverCancel};
    pub use crate::profile::{AngleRange, ProfileTable, RangeProfile, RidingStyle};
    pub use crate::recommend::{Component, Recommendation, RecommendationGenerator};
    pub use crate::scoring::{
        overall_score, score_area, severity_for, FitCategory, FitScore, ScoringEngine, Severity,
    };
    pub use crate::types::{
        BodySide, Confidence, FrameJoints, JointName, JointPosition, JointSequence,
    };
}
