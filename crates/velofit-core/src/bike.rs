//! Bike geometry as currently set up.
//!
//! Every measurement is optional in practice: a value of `0.0` means "not
//! measured" and is skipped by validation. When the saddle height is known,
//! a saddle recommendation can be turned into a concrete target height.

use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};
use crate::recommend::{Component, Recommendation};

/// Current bike setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BikeGeometry {
    /// Seat tube length, centre of bottom bracket to top, in centimetres.
    pub frame_size_cm: f64,
    /// Centre of bottom bracket to top of saddle, in centimetres.
    pub saddle_height_cm: f64,
    /// Horizontal saddle offset behind the bottom bracket, in centimetres.
    pub saddle_setback_cm: f64,
    /// Saddle nose to handlebar centre, in centimetres.
    pub handlebar_reach_cm: f64,
    /// Vertical saddle-to-handlebar drop in centimetres; positive is a drop.
    pub handlebar_drop_cm: f64,
    /// Crank arm length in millimetres.
    pub crank_length_mm: f64,
    /// Stem length in millimetres.
    pub stem_length_mm: f64,
    /// Stem angle in degrees; negative points down.
    pub stem_angle_deg: f64,
}

impl Default for BikeGeometry {
    fn default() -> Self {
        Self {
            frame_size_cm: 0.0,
            saddle_height_cm: 0.0,
            saddle_setback_cm: 0.0,
            handlebar_reach_cm: 0.0,
            handlebar_drop_cm: 0.0,
            crank_length_mm: 172.5,
            stem_length_mm: 100.0,
            stem_angle_deg: -6.0,
        }
    }
}

fn measured(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

impl BikeGeometry {
    /// Validates every measured field and returns the first failure.
    /// Fields left at `0.0` are not checked.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::Validation`] naming the offending field.
    pub fn validate(&self) -> FitResult<()> {
        let checks: [(&str, f64, f64, f64); 8] = [
            ("frame_size_cm", self.frame_size_cm, 40.0, 70.0),
            ("saddle_height_cm", self.saddle_height_cm, 55.0, 90.0),
            ("saddle_setback_cm", self.saddle_setback_cm, -5.0, 15.0),
            ("handlebar_reach_cm", self.handlebar_reach_cm, 30.0, 70.0),
            ("handlebar_drop_cm", self.handlebar_drop_cm, -5.0, 20.0),
            ("crank_length_mm", self.crank_length_mm, 140.0, 185.0),
            ("stem_length_mm", self.stem_length_mm, 50.0, 150.0),
            ("stem_angle_deg", self.stem_angle_deg, -20.0, 20.0),
        ];
        for (field, value, lo, hi) in checks {
            if let Some(v) = measured(value) {
                if !(lo..=hi).contains(&v) {
                    return Err(FitError::validation(format!(
                        "{field}: {v} outside valid range [{lo}, {hi}]"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Saddle height in centimetres, if it was measured.
    #[must_use]
    pub fn saddle_height(&self) -> Option<f64> {
        measured(self.saddle_height_cm)
    }

    /// Target saddle height after applying a saddle-height recommendation,
    /// one decimal place.
    ///
    /// `None` when the saddle height is unknown or `rec` concerns another
    /// component. An in-range recommendation returns the current height.
    #[must_use]
    pub fn target_saddle_height_cm(&self, rec: &Recommendation) -> Option<f64> {
        let current = self.saddle_height()?;
        if rec.component != Component::SaddleHeight {
            return None;
        }
        // Knee under-extended (negative deviation) means raise.
        let change_cm = rec.adjustment_mm.unwrap_or(0.0) / 10.0 * -rec.deviation.signum();
        Some(((current + change_cm) * 10.0).round() / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::aggregate::{AngleStats, CyclingAngles};
    use crate::frame::AngleKind;
    use crate::profile::for_style;
    use crate::recommend::RecommendationGenerator;

    fn knee_recommendation(knee: f64) -> Recommendation {
        let angles = CyclingAngles {
            knee_extension: Some(AngleStats {
                min: knee - 40.0,
                max: knee,
                mean: knee - 20.0,
                samples: 30,
            }),
            ..CyclingAngles::default()
        };
        let scores = BTreeMap::from([(AngleKind::KneeExtension, 50.0)]);
        let profile = for_style("road").unwrap();
        RecommendationGenerator::new()
            .generate(&angles, &profile, &scores)
            .remove(0)
    }

    #[test]
    fn test_default_is_valid() {
        assert!(BikeGeometry::default().validate().is_ok());
        assert_eq!(BikeGeometry::default().saddle_height(), None);
    }

    #[test]
    fn test_unset_fields_are_skipped() {
        let bike = BikeGeometry {
            crank_length_mm: 0.0,
            stem_length_mm: 0.0,
            stem_angle_deg: 0.0,
            ..BikeGeometry::default()
        };
        assert!(bike.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_field_is_named() {
        let bike = BikeGeometry {
            saddle_height_cm: 95.0,
            ..BikeGeometry::default()
        };
        let err = bike.validate().unwrap_err();
        assert!(err.to_string().contains("saddle_height_cm"));
        assert!(err.to_string().contains("[55, 90]"));
    }

    #[test]
    fn test_negative_values_within_range_are_valid() {
        let bike = BikeGeometry {
            saddle_setback_cm: -2.0,
            handlebar_drop_cm: -3.0,
            ..BikeGeometry::default()
        };
        assert!(bike.validate().is_ok());
    }

    #[test]
    fn test_low_knee_raises_target_saddle_height() {
        let bike = BikeGeometry {
            saddle_height_cm: 72.0,
            ..BikeGeometry::default()
        };
        // 120° is 20° under the road range: 50 mm up.
        let rec = knee_recommendation(120.0);
        assert_eq!(bike.target_saddle_height_cm(&rec), Some(77.0));
    }

    #[test]
    fn test_high_knee_lowers_target_saddle_height() {
        let bike = BikeGeometry {
            saddle_height_cm: 72.0,
            ..BikeGeometry::default()
        };
        // 154° is 4° over: 10 mm down.
        let rec = knee_recommendation(154.0);
        assert_eq!(bike.target_saddle_height_cm(&rec), Some(71.0));
    }

    #[test]
    fn test_in_range_keeps_saddle_height() {
        let bike = BikeGeometry {
            saddle_height_cm: 72.0,
            ..BikeGeometry::default()
        };
        let rec = knee_recommendation(145.0);
        assert_eq!(bike.target_saddle_height_cm(&rec), Some(72.0));
    }

    #[test]
    fn test_unknown_saddle_height_has_no_target() {
        let rec = knee_recommendation(120.0);
        assert_eq!(BikeGeometry::default().target_saddle_height_cm(&rec), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let bike: BikeGeometry = serde_json::from_str(r#"{"saddle_height_cm": 74.5}"#).unwrap();
        assert_eq!(bike.saddle_height(), Some(74.5));
        assert!((bike.crank_length_mm - 172.5).abs() < 1e-10);
    }
}
