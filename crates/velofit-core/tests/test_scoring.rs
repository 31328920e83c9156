//! Scoring, severity and weighting tests.

use std::collections::BTreeMap;

use proptest::prelude::*;
use velofit_core::prelude::*;

fn knee_range() -> AngleRange {
    AngleRange::new(140.0, 150.0, 30.0).unwrap()
}

#[test]
fn weighted_overall_skips_absent_area() {
    let scores = BTreeMap::from([
        (AngleKind::KneeExtension, Some(90.0)),
        (AngleKind::Hip, Some(75.0)),
        (AngleKind::Back, Some(80.0)),
        (AngleKind::Ankle, Some(65.0)),
        (AngleKind::Elbow, None),
    ]);
    let weights = velofit_core::profile::for_style("road").unwrap().weights();
    let overall = overall_score(&scores, &weights).unwrap();
    let expected = (90.0 * 30.0 + 75.0 * 20.0 + 80.0 * 15.0 + 65.0 * 10.0) / (30.0 + 20.0 + 15.0 + 10.0);
    assert!((overall - expected).abs() < 1e-10);
    assert!((overall - 80.67).abs() < 0.005);
    assert_eq!(FitCategory::from_score(overall), FitCategory::Good);
}

#[test]
fn no_scoreable_areas_fails() {
    let scores: BTreeMap<AngleKind, Option<f64>> =
        AngleKind::ALL.iter().map(|k| (*k, None)).collect();
    let weights = velofit_core::profile::for_style("road").unwrap().weights();
    assert!(matches!(
        overall_score(&scores, &weights),
        Err(FitError::NoScoreableAreas)
    ));
}

#[test]
fn engine_reports_no_scoreable_areas_for_empty_angles() {
    let profile = velofit_core::profile::for_style("road").unwrap();
    let err = ScoringEngine::new()
        .score(&CyclingAngles::default(), &profile)
        .unwrap_err();
    assert!(matches!(err, FitError::NoScoreableAreas));
}

#[test]
fn severity_inclusive_boundaries() {
    let width = 10.0;
    let eps = 1e-9;
    assert_eq!(severity_for(0.0, width), Severity::Optimal);
    assert_eq!(severity_for(0.5 * width, width), Severity::Minor);
    assert_eq!(severity_for((0.5 + eps) * width, width), Severity::Moderate);
    assert_eq!(severity_for(width, width), Severity::Moderate);
    assert_eq!(severity_for((1.0 + eps) * width, width), Severity::Critical);
}

#[test]
fn score_example_values() {
    assert_eq!(score_area(145.0, &knee_range()), 100.0);
    assert!((score_area(120.0, &knee_range()) - 20.0).abs() < 1e-10);
    assert_eq!(score_area(90.0, &knee_range()), 0.0);
}

fn steady(value: f64) -> Option<AngleStats> {
    Some(AngleStats {
        min: value,
        max: value,
        mean: value,
        samples: 30,
    })
}

#[test]
fn perfect_fit_with_fractional_weights_scores_exactly_100() {
    let profile = RangeProfile::new(
        RidingStyle::Road,
        [
            (AngleKind::KneeExtension, AngleRange::new(140.0, 150.0, 1.2).unwrap()),
            (AngleKind::Hip, AngleRange::new(40.0, 55.0, 1.2).unwrap()),
            (AngleKind::Back, AngleRange::new(35.0, 45.0, 1.1).unwrap()),
            (AngleKind::Ankle, AngleRange::new(90.0, 120.0, 2.3).unwrap()),
            (AngleKind::Elbow, AngleRange::new(150.0, 165.0, 1.4).unwrap()),
        ],
    );
    let angles = CyclingAngles {
        knee_extension: steady(145.0),
        hip_angle: steady(47.0),
        back_angle: steady(40.0),
        ankle_angle: steady(105.0),
        elbow_angle: steady(158.0),
        shoulder_angle: None,
    };

    let score = ScoringEngine::new().score(&angles, &profile).unwrap();
    assert_eq!(score.overall(), 100.0);
    assert_eq!(score.category(), FitCategory::Excellent);

    let all_full: BTreeMap<AngleKind, Option<f64>> = profile
        .ranges()
        .map(|(kind, _)| (kind, Some(100.0)))
        .collect();
    assert!(overall_score(&all_full, &profile.weights()).unwrap() <= 100.0);
}

proptest! {
    #[test]
    fn prop_score_is_full_inside_range(v in 140.0f64..=150.0) {
        prop_assert_eq!(score_area(v, &knee_range()), 100.0);
    }

    #[test]
    fn prop_score_non_increasing_outside(d1 in 0.0f64..100.0, extra in 0.0f64..100.0) {
        let r = knee_range();
        let d2 = d1 + extra;
        prop_assert!(score_area(150.0 + d1, &r) >= score_area(150.0 + d2, &r));
        prop_assert!(score_area(140.0 - d1, &r) >= score_area(140.0 - d2, &r));
    }

    #[test]
    fn prop_score_is_bounded(v in -360.0f64..360.0) {
        let s = score_area(v, &knee_range());
        prop_assert!((0.0..=100.0).contains(&s));
    }
}
