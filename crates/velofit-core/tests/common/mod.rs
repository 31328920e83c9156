//! Synthetic side-view rider frames for integration tests.

#![allow(dead_code)]

use velofit_core::types::{Confidence, FrameJoints, JointName, JointPosition, JointSequence};

/// Builds a left-side frame whose hip–knee–ankle angle is exactly
/// `knee_deg` degrees.
pub fn rider_frame(index: u64, knee_deg: f64, confidence: f64) -> FrameJoints {
    let knee = (0.50, 0.60);
    let thigh = 0.15_f64;
    let shin = 0.15_f64;
    let to_hip = (-120.0_f64).to_radians();
    let to_ankle = to_hip + knee_deg.to_radians();
    let hip = (knee.0 + thigh * to_hip.cos(), knee.1 + thigh * to_hip.sin());
    let ankle = (knee.0 + shin * to_ankle.cos(), knee.1 + shin * to_ankle.sin());

    let c = Confidence::new(confidence).unwrap();
    let at = |name, (x, y): (f64, f64)| JointPosition::new(name, x, y, c).unwrap();
    FrameJoints::new(
        index,
        index as f64 * 1000.0 / 30.0,
        [
            at(JointName::LeftShoulder, (0.62, 0.30)),
            at(JointName::LeftElbow, (0.72, 0.40)),
            at(JointName::LeftWrist, (0.82, 0.44)),
            at(JointName::LeftHip, hip),
            at(JointName::LeftKnee, knee),
            at(JointName::LeftAnkle, ankle),
            at(JointName::LeftHeel, (ankle.0 - 0.03, ankle.1 + 0.02)),
            at(JointName::LeftFootIndex, (ankle.0 + 0.07, ankle.1 + 0.03)),
        ],
    )
    .unwrap()
}

/// Same as [`rider_frame`] with the wrist placed on the elbow, so the elbow
/// angle is degenerate.
pub fn rider_frame_without_elbow_angle(index: u64, knee_deg: f64) -> FrameJoints {
    let frame = rider_frame(index, knee_deg, 0.9);
    let joints = frame.joints().map(|j| {
        if j.joint() == JointName::LeftWrist {
            JointPosition::new(JointName::LeftWrist, 0.72, 0.40, j.confidence()).unwrap()
        } else {
            *j
        }
    });
    FrameJoints::new(frame.frame_index(), frame.timestamp_ms(), joints.collect::<Vec<_>>()).unwrap()
}

/// A 30 fps sequence with one frame per knee angle.
pub fn sequence(knee_angles: &[f64]) -> JointSequence {
    JointSequence::from_frames(
        30.0,
        knee_angles
            .iter()
            .enumerate()
            .map(|(i, deg)| rider_frame(i as u64, *deg, 0.9)),
    )
    .unwrap()
}
