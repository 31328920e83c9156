//! Per-frame usability check and angle computation.
//!
//! A frame is usable when every joint in [`JointRole::REQUIRED`] on the
//! configured body side is present with confidence strictly above the
//! threshold. Unusable frames are dropped, never interpolated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FitError, GeometryError};
use crate::geometry;
use crate::types::{BodySide, FrameJoints, JointRole, Point2};
use crate::DEFAULT_CONFIDENCE_THRESHOLD;

// =============================================================================
// AngleKind
// =============================================================================

/// The six angles derived from each frame. Also identifies a scoring area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AngleKind {
    /// Hip–knee–ankle.
    #[serde(rename = "knee_extension")]
    KneeExtension,
    /// Shoulder–hip–knee.
    #[serde(rename = "hip_angle")]
    Hip,
    /// Hip→shoulder against horizontal.
    #[serde(rename = "back_angle")]
    Back,
    /// Knee–ankle–toe.
    #[serde(rename = "ankle_angle")]
    Ankle,
    /// Shoulder–elbow–wrist.
    #[serde(rename = "elbow_angle")]
    Elbow,
    /// Hip–shoulder–elbow.
    #[serde(rename = "shoulder_angle")]
    Shoulder,
}

impl AngleKind {
    /// All angle kinds in canonical order.
    pub const ALL: [Self; 6] = [
        Self::KneeExtension,
        Self::Hip,
        Self::Back,
        Self::Ankle,
        Self::Elbow,
        Self::Shoulder,
    ];

    /// Configuration key for this angle.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::KneeExtension => "knee_extension",
            Self::Hip => "hip_angle",
            Self::Back => "back_angle",
            Self::Ankle => "ankle_angle",
            Self::Elbow => "elbow_angle",
            Self::Shoulder => "shoulder_angle",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::KneeExtension => "Knee extension",
            Self::Hip => "Hip angle",
            Self::Back => "Back angle",
            Self::Ankle => "Ankle angle",
            Self::Elbow => "Elbow angle",
            Self::Shoulder => "Shoulder angle",
        }
    }
}

impl fmt::Display for AngleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AngleKind {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.key() == s)
            .ok_or_else(|| FitError::validation(format!("Unknown angle: '{s}'")))
    }
}

// =============================================================================
// AngleBundle
// =============================================================================

/// The six angles of one usable frame. A field is `None` when its geometry
/// was degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AngleBundle {
    /// Hip–knee–ankle.
    pub knee_extension: Option<f64>,
    /// Shoulder–hip–knee.
    pub hip_angle: Option<f64>,
    /// Torso against horizontal.
    pub back_angle: Option<f64>,
    /// Knee–ankle–toe.
    pub ankle_angle: Option<f64>,
    /// Shoulder–elbow–wrist.
    pub elbow_angle: Option<f64>,
    /// Hip–shoulder–elbow.
    pub shoulder_angle: Option<f64>,
}

impl AngleBundle {
    /// Value of one angle.
    #[must_use]
    pub fn get(&self, kind: AngleKind) -> Option<f64> {
        match kind {
            AngleKind::KneeExtension => self.knee_extension,
            AngleKind::Hip => self.hip_angle,
            AngleKind::Back => self.back_angle,
            AngleKind::Ankle => self.ankle_angle,
            AngleKind::Elbow => self.elbow_angle,
            AngleKind::Shoulder => self.shoulder_angle,
        }
    }

    /// Number of angles that were computable.
    #[must_use]
    pub fn computed(&self) -> usize {
        AngleKind::ALL.iter().filter(|k| self.get(**k).is_some()).count()
    }
}

// =============================================================================
// FrameEvaluator
// =============================================================================

/// Decides which frames are usable and computes their angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEvaluator {
    side: BodySide,
    confidence_threshold: f64,
}

impl Default for FrameEvaluator {
    fn default() -> Self {
        Self::new(BodySide::Left, DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl FrameEvaluator {
    /// Creates an evaluator for one body side.
    #[must_use]
    pub fn new(side: BodySide, confidence_threshold: f64) -> Self {
        Self {
            side,
            confidence_threshold,
        }
    }

    /// The evaluated body side.
    #[must_use]
    pub fn side(&self) -> BodySide {
        self.side
    }

    /// Minimum confidence (exclusive) for a required joint.
    #[must_use]
    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    fn point(&self, frame: &FrameJoints, role: JointRole) -> Option<Point2> {
        frame
            .get(self.side.joint(role))
            .filter(|j| j.confidence().above(self.confidence_threshold))
            .map(|j| j.point())
    }

    /// Returns `true` iff every required joint is confidently detected.
    #[must_use]
    pub fn is_frame_usable(&self, frame: &FrameJoints) -> bool {
        JointRole::REQUIRED
            .iter()
            .all(|role| self.point(frame, *role).is_some())
    }

    /// Computes the angle bundle for a usable frame, or `None` otherwise.
    #[must_use]
    pub fn compute_frame_angles(&self, frame: &FrameJoints) -> Option<AngleBundle> {
        if !self.is_frame_usable(frame) {
            debug!(frame = frame.frame_index(), "Frame excluded: required joints missing");
            return None;
        }
        // Usable frames carry every required joint on this side.
        let at = |role| self.point(frame, role);
        let shoulder = at(JointRole::Shoulder)?;
        let elbow = at(JointRole::Elbow)?;
        let wrist = at(JointRole::Wrist)?;
        let hip = at(JointRole::Hip)?;
        let knee = at(JointRole::Knee)?;
        let ankle = at(JointRole::Ankle)?;
        let toe = at(JointRole::Forefoot)?;

        let index = frame.frame_index();
        let absorb = |kind: AngleKind, result: Result<f64, GeometryError>| match result {
            Ok(angle) => Some(angle),
            Err(e) => {
                debug!(frame = index, angle = %kind, error = %e, "Angle dropped");
                None
            }
        };

        Some(AngleBundle {
            knee_extension: absorb(
                AngleKind::KneeExtension,
                geometry::knee_extension(hip, knee, ankle),
            ),
            hip_angle: absorb(AngleKind::Hip, geometry::hip_angle(shoulder, hip, knee)),
            back_angle: absorb(AngleKind::Back, geometry::back_angle(shoulder, hip)),
            ankle_angle: absorb(AngleKind::Ankle, geometry::ankle_angle(knee, ankle, toe)),
            elbow_angle: absorb(AngleKind::Elbow, geometry::elbow_angle(shoulder, elbow, wrist)),
            shoulder_angle: absorb(
                AngleKind::Shoulder,
                geometry::shoulder_angle(hip, shoulder, elbow),
            ),
        })
    }
}
