//! Core data types consumed by the analysis pipeline.
//!
//! This module contains the value types produced by the external pose
//! detector and read by every later stage:
//!
//! - **Joint Types**: [`JointName`], [`JointRole`], [`BodySide`]
//! - **Positions**: [`Point2`], [`JointPosition`], [`Confidence`]
//! - **Sequences**: [`FrameJoints`], [`JointSequence`]
//!
//! All of them validate on construction and on deserialization, so a value
//! that exists is a value the pipeline can trust.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};

// =============================================================================
// Confidence
// =============================================================================

/// Detector confidence in the range [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Creates a new confidence value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range [0.0, 1.0].
    pub fn new(value: f64) -> FitResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(FitError::validation(format!(
                "Confidence must be in [0.0, 1.0], got {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the raw confidence value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns `true` if the confidence is strictly above `threshold`.
    #[must_use]
    pub fn above(&self, threshold: f64) -> bool {
        self.0 > threshold
    }

    /// Maximum confidence (1.0).
    pub const MAX: Self = Self(1.0);

    /// Minimum confidence (0.0).
    pub const MIN: Self = Self(0.0);
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<f64> for Confidence {
    type Error = FitError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

// =============================================================================
// Joint names
// =============================================================================

/// Body side observed by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySide {
    /// Rider's left side faces the camera.
    #[default]
    Left,
    /// Rider's right side faces the camera.
    Right,
}

impl BodySide {
    /// Resolves a side-independent role to the named joint on this side.
    #[must_use]
    pub fn joint(self, role: JointRole) -> JointName {
        use JointName as J;
        use JointRole as R;
        match (self, role) {
            (Self::Left, R::Shoulder) => J::LeftShoulder,
            (Self::Left, R::Elbow) => J::LeftElbow,
            (Self::Left, R::Wrist) => J::LeftWrist,
            (Self::Left, R::Hip) => J::LeftHip,
            (Self::Left, R::Knee) => J::LeftKnee,
            (Self::Left, R::Ankle) => J::LeftAnkle,
            (Self::Left, R::Heel) => J::LeftHeel,
            (Self::Left, R::Forefoot) => J::LeftFootIndex,
            (Self::Right, R::Shoulder) => J::RightShoulder,
            (Self::Right, R::Elbow) => J::RightElbow,
            (Self::Right, R::Wrist) => J::RightWrist,
            (Self::Right, R::Hip) => J::RightHip,
            (Self::Right, R::Knee) => J::RightKnee,
            (Self::Right, R::Ankle) => J::RightAnkle,
            (Self::Right, R::Heel) => J::RightHeel,
            (Self::Right, R::Forefoot) => J::RightFootIndex,
        }
    }
}

impl fmt::Display for BodySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

impl FromStr for BodySide {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            other => Err(FitError::validation(format!("Invalid body side: '{other}'"))),
        }
    }
}

/// Side-independent joint role used by the fit geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointRole {
    /// Shoulder
    Shoulder,
    /// Elbow
    Elbow,
    /// Wrist
    Wrist,
    /// Hip
    Hip,
    /// Knee
    Knee,
    /// Ankle
    Ankle,
    /// Heel
    Heel,
    /// Toe tip (forefoot)
    Forefoot,
}

impl JointRole {
    /// Roles that must be confidently detected for a frame to be usable.
    pub const REQUIRED: [Self; 8] = [
        Self::Hip,
        Self::Knee,
        Self::Ankle,
        Self::Shoulder,
        Self::Elbow,
        Self::Wrist,
        Self::Heel,
        Self::Forefoot,
    ];
}

/// Named body joints reported by the pose detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum JointName {
    /// Nose
    Nose = 0,
    /// Left shoulder
    LeftShoulder = 1,
    /// Right shoulder
    RightShoulder = 2,
    /// Left elbow
    LeftElbow = 3,
    /// Right elbow
    RightElbow = 4,
    /// Left wrist
    LeftWrist = 5,
    /// Right wrist
    RightWrist = 6,
    /// Left hip
    LeftHip = 7,
    /// Right hip
    RightHip = 8,
    /// Left knee
    LeftKnee = 9,
    /// Right knee
    RightKnee = 10,
    /// Left ankle
    LeftAnkle = 11,
    /// Right ankle
    RightAnkle = 12,
    /// Left heel
    LeftHeel = 13,
    /// Right heel
    RightHeel = 14,
    /// Left toe tip
    LeftFootIndex = 15,
    /// Right toe tip
    RightFootIndex = 16,
}

impl JointName {
    /// Returns all joint names in order.
    #[must_use]
    pub fn all() -> &'static [Self; 17] {
        &[
            Self::Nose,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
            Self::LeftHeel,
            Self::RightHeel,
            Self::LeftFootIndex,
            Self::RightFootIndex,
        ]
    }

    /// Returns the joint name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }
}

impl fmt::Display for JointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JointName {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|j| j.name() == s)
            .ok_or_else(|| FitError::validation(format!("Unknown joint name: '{s}'")))
    }
}

impl TryFrom<u8> for JointName {
    type Error = FitError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::all()
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| FitError::validation(format!("Invalid joint index: {value}")))
    }
}

// =============================================================================
// Positions
// =============================================================================

/// A 2D point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate (image convention, grows downward)
    pub y: f64,
}

impl Point2 {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One detected joint with a normalized position and a confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJointPosition")]
pub struct JointPosition {
    joint: JointName,
    x: f64,
    y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    z: Option<f64>,
    confidence: Confidence,
}

impl JointPosition {
    /// Creates a new 2D joint position.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `x` or `y` is outside [0.0, 1.0].
    pub fn new(joint: JointName, x: f64, y: f64, confidence: Confidence) -> FitResult<Self> {
        for (axis, v) in [("x", x), ("y", y)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(FitError::validation(format!(
                    "{joint}: {axis} must be in [0.0, 1.0], got {v}"
                )));
            }
        }
        Ok(Self {
            joint,
            x,
            y,
            z: None,
            confidence,
        })
    }

    /// Attaches a depth value.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `z` is not finite.
    pub fn with_depth(mut self, z: f64) -> FitResult<Self> {
        if !z.is_finite() {
            return Err(FitError::validation(format!(
                "{}: depth must be finite, got {z}",
                self.joint
            )));
        }
        self.z = Some(z);
        Ok(self)
    }

    /// The joint this position belongs to.
    #[must_use]
    pub fn joint(&self) -> JointName {
        self.joint
    }

    /// Normalized horizontal coordinate.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Normalized vertical coordinate.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Depth, if the detector reported one.
    #[must_use]
    pub fn z(&self) -> Option<f64> {
        self.z
    }

    /// Detector confidence.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// The 2D position used by angle math.
    #[must_use]
    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawJointPosition {
    joint: JointName,
    x: f64,
    y: f64,
    #[serde(default)]
    z: Option<f64>,
    confidence: Confidence,
}

impl TryFrom<RawJointPosition> for JointPosition {
    type Error = FitError;

    fn try_from(raw: RawJointPosition) -> Result<Self, Self::Error> {
        let pos = Self::new(raw.joint, raw.x, raw.y, raw.confidence)?;
        match raw.z {
            Some(z) => pos.with_depth(z),
            None => Ok(pos),
        }
    }
}

// =============================================================================
// Frames and sequences
// =============================================================================

/// All joints detected in one video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame", into = "RawFrame")]
pub struct FrameJoints {
    frame_index: u64,
    timestamp_ms: f64,
    joints: BTreeMap<JointName, JointPosition>,
}

impl FrameJoints {
    /// Creates a frame from detected joints.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a joint name appears twice or the
    /// timestamp is not finite.
    pub fn new(
        frame_index: u64,
        timestamp_ms: f64,
        joints: impl IntoIterator<Item = JointPosition>,
    ) -> FitResult<Self> {
        if !timestamp_ms.is_finite() {
            return Err(FitError::validation(format!(
                "Frame {frame_index}: timestamp must be finite"
            )));
        }
        let mut map = BTreeMap::new();
        for joint in joints {
            if map.insert(joint.joint(), joint).is_some() {
                return Err(FitError::validation(format!(
                    "Frame {frame_index}: duplicate joint '{}'",
                    joint.joint()
                )));
            }
        }
        Ok(Self {
            frame_index,
            timestamp_ms,
            joints: map,
        })
    }

    /// Index of the source video frame.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Presentation timestamp in milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    /// Looks up a joint by name.
    #[must_use]
    pub fn get(&self, joint: JointName) -> Option<&JointPosition> {
        self.joints.get(&joint)
    }

    /// Iterates over detected joints in name order.
    pub fn joints(&self) -> impl Iterator<Item = &JointPosition> {
        self.joints.values()
    }

    /// Number of detected joints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Returns `true` if no joints were detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFrame {
    frame_index: u64,
    timestamp_ms: f64,
    joints: Vec<JointPosition>,
}

impl TryFrom<RawFrame> for FrameJoints {
    type Error = FitError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        Self::new(raw.frame_index, raw.timestamp_ms, raw.joints)
    }
}

impl From<FrameJoints> for RawFrame {
    fn from(frame: FrameJoints) -> Self {
        Self {
            frame_index: frame.frame_index,
            timestamp_ms: frame.timestamp_ms,
            joints: frame.joints.into_values().collect(),
        }
    }
}

/// Ordered frames from one video plus its frame rate.
///
/// Frame indices are strictly increasing and the frame rate is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSequence", into = "RawSequence")]
pub struct JointSequence {
    fps: f64,
    frames: Vec<FrameJoints>,
}

impl JointSequence {
    /// Creates an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `fps` is not a positive finite number.
    pub fn new(fps: f64) -> FitResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(FitError::validation(format!(
                "Frame rate must be positive, got {fps}"
            )));
        }
        Ok(Self {
            fps,
            frames: Vec::new(),
        })
    }

    /// Creates a sequence from frames in order.
    ///
    /// # Errors
    ///
    /// Returns a validation error on a bad frame rate or out-of-order frames.
    pub fn from_frames(fps: f64, frames: impl IntoIterator<Item = FrameJoints>) -> FitResult<Self> {
        let mut seq = Self::new(fps)?;
        for frame in frames {
            seq.push(frame)?;
        }
        Ok(seq)
    }

    /// Appends a frame.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless the frame index is greater than the
    /// last one.
    pub fn push(&mut self, frame: FrameJoints) -> FitResult<()> {
        if let Some(last) = self.frames.last() {
            if frame.frame_index() <= last.frame_index() {
                return Err(FitError::validation(format!(
                    "Frame indices must be strictly increasing: {} follows {}",
                    frame.frame_index(),
                    last.frame_index()
                )));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Source frame rate.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames in index order.
    #[must_use]
    pub fn frames(&self) -> &[FrameJoints] {
        &self.frames
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the sequence holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Duration covered by the sequence in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => (last.frame_index() - first.frame_index()) as f64 / self.fps,
            _ => 0.0,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSequence {
    fps: f64,
    frames: Vec<FrameJoints>,
}

impl TryFrom<RawSequence> for JointSequence {
    type Error = FitError;

    fn try_from(raw: RawSequence) -> Result<Self, Self::Error> {
        Self::from_frames(raw.fps, raw.frames)
    }
}

impl From<JointSequence> for RawSequence {
    fn from(seq: JointSequence) -> Self {
        Self {
            fps: seq.fps,
            frames: seq.frames,
        }
    }
}
