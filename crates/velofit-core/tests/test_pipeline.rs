//! End-to-end tests for the analysis pipeline.
//!
//! Sequences are built from synthetic side-view frames with exact knee
//! angles. All tests are deterministic and use only in-memory data.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};

use common::{rider_frame, rider_frame_without_elbow_angle, sequence};
use velofit_core::prelude::*;
use velofit_core::pipeline::{AnalysisProgress, AnalysisStage};
use velofit_core::types::JointSequence;

fn analyzer() -> FitAnalyzer {
    FitAnalyzer::with_builtin_profiles(AnalysisConfig::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn knee_in_range_scores_full_and_optimal() {
    let report = analyzer().analyze(&sequence(&[145.0; 10]), "road").unwrap();

    assert_eq!(report.usable_frames, 10);
    let knee = report.score.area(AngleKind::KneeExtension).unwrap();
    assert!((knee - 100.0).abs() < 1e-9, "knee score = {knee}");

    let rec = report
        .recommendations
        .iter()
        .find(|r| r.component == Component::SaddleHeight)
        .unwrap();
    assert_eq!(rec.severity, Severity::Optimal);
    assert_eq!(rec.adjustment, "Saddle height is well set");
    assert!(rec.adjustment_mm.is_none());
}

#[test]
fn knee_twenty_degrees_low_is_critical_and_raises_saddle() {
    let report = analyzer().analyze(&sequence(&[120.0; 10]), "road").unwrap();

    let knee = report.score.area(AngleKind::KneeExtension).unwrap();
    assert!((knee - 20.0).abs() < 1e-6, "knee score = {knee}");

    let rec = report
        .recommendations
        .iter()
        .find(|r| r.component == Component::SaddleHeight)
        .unwrap();
    assert_eq!(rec.severity, Severity::Critical);
    assert!((rec.adjustment_mm.unwrap() - 50.0).abs() < 1e-6);
    assert_eq!(rec.adjustment, "Raise saddle by approximately 50 mm");
    // Critical knee outranks everything else.
    assert_eq!(report.recommendations[0].component, Component::SaddleHeight);
}

#[test]
fn two_usable_frames_is_insufficient() {
    let frames = (0..6).map(|i| {
        let confidence = if i < 2 { 0.9 } else { 0.3 };
        rider_frame(i, 145.0, confidence)
    });
    let seq = JointSequence::from_frames(30.0, frames).unwrap();

    let err = analyzer().analyze(&seq, "road").unwrap_err();
    assert!(matches!(
        err,
        FitError::InsufficientData {
            required: 3,
            available: 2
        }
    ));
    assert!(err.aborts_run());

    let direct = SequenceAggregator::default().aggregate(&seq).unwrap_err();
    assert!(matches!(direct, FitError::InsufficientData { .. }));
}

#[test]
fn absent_area_is_excluded_from_overall() {
    let frames = (0..8).map(|i| rider_frame_without_elbow_angle(i, 145.0));
    let seq = JointSequence::from_frames(30.0, frames).unwrap();
    let report = analyzer().analyze(&seq, "road").unwrap();

    assert!(report.angles.elbow_angle.is_none());
    assert!(report.score.area(AngleKind::Elbow).is_none());
    assert!(report
        .recommendations
        .iter()
        .all(|r| r.component != Component::StemLength));

    let profile = velofit_core::profile::for_style("road").unwrap();
    let (num, den) = report
        .score
        .area_scores()
        .iter()
        .fold((0.0, 0.0), |(n, d), (k, s)| {
            let w = profile.weight(*k);
            (n + s * w, d + w)
        });
    assert!((report.score.overall() - num / den).abs() < 1e-10);
}

#[test]
fn recommendation_count_matches_scoreable_areas() {
    let report = analyzer()
        .analyze(&sequence(&[130.0, 135.0, 140.0, 145.0, 150.0, 145.0, 140.0]), "gravel")
        .unwrap();
    assert_eq!(report.recommendations.len(), report.score.area_scores().len());
    for pair in report.recommendations.windows(2) {
        assert!(pair[0].severity >= pair[1].severity);
    }
}

#[test]
fn unusable_frames_are_skipped_not_guessed() {
    let frames = (0..10).map(|i| {
        let confidence = if i % 2 == 0 { 0.9 } else { 0.2 };
        rider_frame(i, 145.0, confidence)
    });
    let seq = JointSequence::from_frames(30.0, frames).unwrap();
    let report = analyzer().analyze(&seq, "road").unwrap();
    assert_eq!(report.total_frames, 10);
    assert_eq!(report.usable_frames, 5);
    assert_eq!(report.angles.knee_extension.unwrap().samples, 5);
}

#[test]
fn style_alias_is_accepted() {
    let report = analyzer().analyze(&sequence(&[145.0; 5]), "tt").unwrap();
    assert_eq!(report.style, RidingStyle::TimeTrial);
}

#[test]
fn unknown_style_is_surfaced() {
    let err = analyzer().analyze(&sequence(&[145.0; 5]), "unicycle").unwrap_err();
    assert!(matches!(err, FitError::UnknownStyle { .. }));
}

// ---------------------------------------------------------------------------
// Cancellation and progress
// ---------------------------------------------------------------------------

#[test]
fn cancellation_between_frames() {
    let seq = sequence(&[145.0; 10]);
    let flag = AtomicBool::new(false);
    let mut on_progress = |p: &AnalysisProgress| {
        if p.frames_evaluated == 3 {
            flag.store(true, Ordering::Relaxed);
        }
    };
    let err = analyzer()
        .analyze_with(&seq, "road", &flag, &mut on_progress)
        .unwrap_err();
    assert!(matches!(
        err,
        FitError::Cancelled {
            stage: AnalysisStage::FrameEvaluation
        }
    ));
}

#[test]
fn cancellation_before_aggregation() {
    let seq = sequence(&[145.0; 4]);
    let flag = AtomicBool::new(false);
    let mut on_progress = |p: &AnalysisProgress| {
        if p.frames_evaluated == p.total_frames {
            flag.store(true, Ordering::Relaxed);
        }
    };
    let err = analyzer()
        .analyze_with(&seq, "road", &flag, &mut on_progress)
        .unwrap_err();
    assert!(matches!(
        err,
        FitError::Cancelled {
            stage: AnalysisStage::Aggregation
        }
    ));
}

#[test]
fn progress_reported_per_frame_and_stage() {
    let seq = sequence(&[145.0; 6]);
    let mut updates = Vec::new();
    analyzer()
        .analyze_with(&seq, "road", &NeverCancel, &mut |p| updates.push(*p))
        .unwrap();

    assert_eq!(updates.len(), 1 + 6 + 2);
    assert_eq!(updates[0].frames_evaluated, 0);
    assert_eq!(updates[6].frames_evaluated, 6);
    assert_eq!(updates[6].usable_frames, 6);
    assert_eq!(updates[7].stage, AnalysisStage::Aggregation);
    assert_eq!(updates[8].stage, AnalysisStage::Scoring);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn fit_score_roundtrip_preserves_values() {
    let report = analyzer()
        .analyze(&sequence(&[128.3, 131.7, 135.1, 138.9, 133.3]), "road")
        .unwrap();
    let json = serde_json::to_string(&report.score).unwrap();
    let back: FitScore = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report.score);
    assert_eq!(back.overall().to_bits(), report.score.overall().to_bits());
    assert_eq!(back.category(), report.score.category());
}

#[test]
fn persisted_category_is_recomputed() {
    let json = r#"{"overall": 91.5, "knee_score": 100.0, "category": "poor"}"#;
    let score: FitScore = serde_json::from_str(json).unwrap();
    assert_eq!(score.category(), FitCategory::Excellent);
    assert_eq!(score.to_record().category, "excellent");
}

#[test]
fn persisted_score_out_of_range_is_rejected() {
    let json = r#"{"overall": 120.0, "category": "excellent"}"#;
    assert!(serde_json::from_str::<FitScore>(json).is_err());
}

#[test]
fn cycling_angles_roundtrip_preserves_values() {
    let report = analyzer()
        .analyze(&sequence(&[128.3, 131.7, 135.1, 138.9, 133.3]), "road")
        .unwrap();
    let json = serde_json::to_string(&report.angles).unwrap();
    let back: CyclingAngles = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report.angles);
}

#[test]
fn sequence_loads_from_detector_json() {
    let seq = sequence(&[140.0, 142.0, 144.0]);
    let json = serde_json::to_string_pretty(&seq).unwrap();
    let back: JointSequence = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 3);
    assert!(FrameEvaluator::default().is_frame_usable(&back.frames()[0]));
}
