//! Turns scored deviations into ordered, human-readable recommendations.
//!
//! Every scoreable area yields exactly one [`Recommendation`], including
//! areas that are already in range. Output is ordered worst severity first,
//! then by the area's configured weight.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::CyclingAngles;
use crate::frame::AngleKind;
use crate::profile::RangeProfile;
use crate::scoring::{measured_value, severity_for, Deviation, Severity};

// =============================================================================
// Components
// =============================================================================

/// Bike component an adjustment applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// Saddle height (knee extension).
    SaddleHeight,
    /// Saddle fore-aft position (hip angle).
    SaddleSetback,
    /// Handlebar height and drop (back angle).
    HandlebarHeight,
    /// Cleat placement (ankle angle).
    CleatPosition,
    /// Stem length (elbow angle).
    StemLength,
    /// Handlebar reach (shoulder angle).
    HandlebarReach,
}

impl Component {
    /// The component adjusted to correct `kind`.
    #[must_use]
    pub fn for_angle(kind: AngleKind) -> Self {
        match kind {
            AngleKind::KneeExtension => Self::SaddleHeight,
            AngleKind::Hip => Self::SaddleSetback,
            AngleKind::Back => Self::HandlebarHeight,
            AngleKind::Ankle => Self::CleatPosition,
            AngleKind::Elbow => Self::StemLength,
            AngleKind::Shoulder => Self::HandlebarReach,
        }
    }

    /// Identifier used in persisted output.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::SaddleHeight => "saddle_height",
            Self::SaddleSetback => "saddle_setback",
            Self::HandlebarHeight => "handlebar_height",
            Self::CleatPosition => "cleat_position",
            Self::StemLength => "stem_length",
            Self::HandlebarReach => "handlebar_reach",
        }
    }

    /// Millimetres of adjustment per degree of deviation.
    #[must_use]
    pub fn mm_per_degree(&self) -> f64 {
        match self {
            Self::SaddleHeight => 2.5,
            Self::SaddleSetback => 2.0,
            Self::HandlebarHeight => 3.0,
            Self::CleatPosition => 1.0,
            Self::StemLength => 2.0,
            Self::HandlebarReach => 2.0,
        }
    }

    fn guidance(&self, deviation: Deviation) -> String {
        let mm = deviation.magnitude() * self.mm_per_degree();
        match (self, deviation) {
            (Self::SaddleHeight, Deviation::Within) => "Saddle height is well set".to_string(),
            (Self::SaddleHeight, Deviation::Below(_)) => {
                format!("Raise saddle by approximately {mm:.0} mm")
            }
            (Self::SaddleHeight, Deviation::Above(_)) => {
                format!("Lower saddle by approximately {mm:.0} mm")
            }
            (Self::SaddleSetback, Deviation::Within) => "Hip angle is in a good range".to_string(),
            (Self::SaddleSetback, Deviation::Below(_)) => format!(
                "Move saddle back by approximately {mm:.0} mm or raise handlebars to open the hip angle"
            ),
            (Self::SaddleSetback, Deviation::Above(_)) => format!(
                "Move saddle forward by approximately {mm:.0} mm or lower handlebars to close the hip angle"
            ),
            (Self::HandlebarHeight, Deviation::Within) => {
                "Back angle is well positioned".to_string()
            }
            (Self::HandlebarHeight, Deviation::Below(_)) => format!(
                "Raise handlebars by approximately {mm:.0} mm or use a shorter, steeper stem"
            ),
            (Self::HandlebarHeight, Deviation::Above(_)) => format!(
                "Lower handlebars by approximately {mm:.0} mm or use a longer, more negative stem"
            ),
            (Self::CleatPosition, Deviation::Within) => {
                "Ankle movement is within normal range".to_string()
            }
            (Self::CleatPosition, Deviation::Below(_)) => format!(
                "Reduce toe pointing: move cleats forward by approximately {mm:.0} mm and re-check saddle height"
            ),
            (Self::CleatPosition, Deviation::Above(_)) => format!(
                "Foot may be too far forward on the pedal: move cleats back by approximately {mm:.0} mm"
            ),
            (Self::StemLength, Deviation::Within) => {
                "Reach and elbow bend are comfortable".to_string()
            }
            (Self::StemLength, Deviation::Below(_)) => {
                format!("Stem may be too long: try a stem approximately {mm:.0} mm shorter")
            }
            (Self::StemLength, Deviation::Above(_)) => {
                format!("Stem may be too short: try a stem approximately {mm:.0} mm longer")
            }
            (Self::HandlebarReach, Deviation::Within) => {
                "Shoulder angle and reach are balanced".to_string()
            }
            (Self::HandlebarReach, Deviation::Below(_)) => {
                format!("Reach is short: extend reach by approximately {mm:.0} mm")
            }
            (Self::HandlebarReach, Deviation::Above(_)) => {
                format!("Reach is long: reduce reach by approximately {mm:.0} mm")
            }
        }
    }

    fn explanation(&self) -> &'static str {
        match self {
            Self::SaddleHeight => {
                "Knee extension at the bottom of the pedal stroke should sit within the ideal \
                 range. Too little extension means the saddle is too low; too much risks \
                 hyperextension."
            }
            Self::SaddleSetback => {
                "Hip angle at the top of the pedal stroke affects power output and comfort. \
                 Too closed restricts breathing and power; too open reduces efficiency."
            }
            Self::HandlebarHeight => {
                "Back angle determines aerodynamics versus comfort. A lower angle is more \
                 aerodynamic but requires flexibility."
            }
            Self::CleatPosition => {
                "Ankle angle through the pedal stroke indicates cleat position and pedaling \
                 technique."
            }
            Self::StemLength => {
                "Elbow angle indicates reach. Slightly bent elbows absorb road vibration and \
                 reduce upper body fatigue."
            }
            Self::HandlebarReach => {
                "Shoulder angle between torso and upper arm shows how stretched the rider is \
                 toward the bars."
            }
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// =============================================================================
// Recommendation
// =============================================================================

/// One scored area with guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Component to adjust.
    pub component: Component,
    /// Angle the recommendation is based on.
    pub angle: AngleKind,
    /// Severity of the deviation.
    pub severity: Severity,
    /// Area score in [0, 100].
    pub score: f64,
    /// Measured value in degrees.
    pub measured: f64,
    /// Ideal lower bound in degrees.
    pub ideal_min: f64,
    /// Ideal upper bound in degrees.
    pub ideal_max: f64,
    /// Configured weight of the area.
    pub weight: f64,
    /// Signed deviation in degrees: negative below range, positive above.
    pub deviation: f64,
    /// Suggested adjustment size in millimetres; `None` when in range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_mm: Option<f64>,
    /// Formatted current value, e.g. `"145.0°"`.
    pub current_value: String,
    /// Formatted ideal range, e.g. `"140–150°"`.
    pub ideal_range: String,
    /// Directional guidance.
    pub adjustment: String,
    /// Why this angle matters.
    pub explanation: String,
}

fn ordering(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.weight.partial_cmp(&a.weight).unwrap_or(Ordering::Equal))
}

/// Builds recommendations from aggregated angles and their scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One recommendation per entry of `area_scores`, ordered by descending
    /// severity then descending weight. Ties keep canonical angle order.
    #[must_use]
    pub fn generate(
        &self,
        angles: &CyclingAngles,
        profile: &RangeProfile,
        area_scores: &BTreeMap<AngleKind, f64>,
    ) -> Vec<Recommendation> {
        let mut out: Vec<Recommendation> = area_scores
            .iter()
            .filter_map(|(&kind, &score)| {
                let range = profile.range(kind)?;
                let measured = measured_value(kind, angles.get(kind)?);
                let deviation = Deviation::of(measured, range);
                let component = Component::for_angle(kind);
                let signed = match deviation {
                    Deviation::Within => 0.0,
                    Deviation::Below(d) => -d,
                    Deviation::Above(d) => d,
                };
                Some(Recommendation {
                    component,
                    angle: kind,
                    severity: severity_for(deviation.magnitude(), range.width()),
                    score,
                    measured,
                    ideal_min: range.min(),
                    ideal_max: range.max(),
                    weight: range.weight(),
                    deviation: signed,
                    adjustment_mm: (deviation != Deviation::Within)
                        .then(|| deviation.magnitude() * component.mm_per_degree()),
                    current_value: format!("{measured:.1}°"),
                    ideal_range: format!("{}–{}°", range.min(), range.max()),
                    adjustment: component.guidance(deviation),
                    explanation: component.explanation().to_string(),
                })
            })
            .collect();
        out.sort_by(ordering);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AngleStats;
    use crate::profile::AngleRange;

    fn stats(v: f64) -> AngleStats {
        AngleStats {
            min: v,
            max: v,
            mean: v,
            samples: 10,
        }
    }

    fn profile() -> RangeProfile {
        RangeProfile::new(
            crate::profile::RidingStyle::Road,
            [
                (AngleKind::KneeExtension, AngleRange::new(140.0, 150.0, 30.0).unwrap()),
                (AngleKind::Hip, AngleRange::new(40.0, 55.0, 20.0).unwrap()),
                (AngleKind::Back, AngleRange::new(35.0, 45.0, 15.0).unwrap()),
                (AngleKind::Elbow, AngleRange::new(150.0, 165.0, 10.0).unwrap()),
            ],
        )
    }

    #[test]
    fn test_low_knee_extension_raises_saddle() {
        let angles = CyclingAngles {
            knee_extension: Some(stats(120.0)),
            ..CyclingAngles::default()
        };
        let scores = BTreeMap::from([(AngleKind::KneeExtension, 20.0)]);
        let recs = RecommendationGenerator::new().generate(&angles, &profile(), &scores);
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];
        assert_eq!(rec.component, Component::SaddleHeight);
        assert_eq!(rec.severity, Severity::Critical);
        assert!((rec.adjustment_mm.unwrap() - 50.0).abs() < 1e-10);
        assert_eq!(rec.adjustment, "Raise saddle by approximately 50 mm");
        assert_eq!(rec.current_value, "120.0°");
        assert_eq!(rec.ideal_range, "140–150°");
        assert!((rec.deviation + 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_high_knee_extension_lowers_saddle() {
        let angles = CyclingAngles {
            knee_extension: Some(stats(154.0)),
            ..CyclingAngles::default()
        };
        let scores = BTreeMap::from([(AngleKind::KneeExtension, 84.0)]);
        let recs = RecommendationGenerator::new().generate(&angles, &profile(), &scores);
        assert_eq!(recs[0].adjustment, "Lower saddle by approximately 10 mm");
        assert_eq!(recs[0].severity, Severity::Minor);
    }

    #[test]
    fn test_optimal_areas_are_reported() {
        let angles = CyclingAngles {
            knee_extension: Some(stats(145.0)),
            hip_angle: Some(stats(45.0)),
            ..CyclingAngles::default()
        };
        let scores = BTreeMap::from([(AngleKind::KneeExtension, 100.0), (AngleKind::Hip, 100.0)]);
        let recs = RecommendationGenerator::new().generate(&angles, &profile(), &scores);
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.severity == Severity::Optimal));
        assert!(recs.iter().all(|r| r.adjustment_mm.is_none()));
        // Equal severity: heavier knee area first.
        assert_eq!(recs[0].angle, AngleKind::KneeExtension);
    }

    #[test]
    fn test_ordering_by_severity_then_weight() {
        let angles = CyclingAngles {
            knee_extension: Some(stats(148.0)),
            hip_angle: Some(stats(30.0)),
            back_angle: Some(stats(50.0)),
            elbow_angle: Some(stats(130.0)),
            ..CyclingAngles::default()
        };
        let scores = BTreeMap::from([
            (AngleKind::KneeExtension, 100.0),
            (AngleKind::Hip, 73.3),
            (AngleKind::Back, 80.0),
            (AngleKind::Elbow, 46.7),
        ]);
        let recs = RecommendationGenerator::new().generate(&angles, &profile(), &scores);
        let order: Vec<_> = recs.iter().map(|r| r.angle).collect();
        // Elbow: 20/15 > 1 critical. Hip: 10/15 moderate. Back: 5/10 minor.
        assert_eq!(
            order,
            vec![AngleKind::Elbow, AngleKind::Hip, AngleKind::Back, AngleKind::KneeExtension]
        );
    }

    #[test]
    fn test_serialized_ids() {
        let json = serde_json::to_string(&Component::HandlebarHeight).unwrap();
        assert_eq!(json, "\"handlebar_height\"");
        let sev = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(sev, "\"critical\"");
    }
}
