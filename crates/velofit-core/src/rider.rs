//! Rider body measurements.
//!
//! Measurements do not change the angle analysis. They give a static
//! starting point (the LeMond saddle height) and carry the rider's preferred
//! riding style.

use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};
use crate::profile::RidingStyle;

/// LeMond saddle height multiplier applied to inseam length.
pub const LEMOND_FACTOR: f64 = 0.883;

/// Self-reported flexibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flexibility {
    /// Limited hamstring and lower back flexibility.
    Low,
    /// Typical flexibility.
    #[default]
    Medium,
    /// High flexibility.
    High,
}

/// Rider body measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderMeasurements {
    /// Optional rider name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Height in centimetres.
    pub height_cm: f64,
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// Inseam in centimetres.
    pub inseam_cm: f64,
    /// EU shoe size.
    pub foot_size_eu: f64,
    /// Arm length in centimetres.
    pub arm_length_cm: f64,
    /// Torso length in centimetres.
    pub torso_length_cm: f64,
    /// Shoulder width in centimetres.
    pub shoulder_width_cm: f64,
    /// Flexibility.
    pub flexibility: Flexibility,
    /// Preferred riding style.
    pub riding_style: RidingStyle,
}

impl Default for RiderMeasurements {
    fn default() -> Self {
        Self {
            name: None,
            height_cm: 175.0,
            weight_kg: 70.0,
            inseam_cm: 82.0,
            foot_size_eu: 42.0,
            arm_length_cm: 60.0,
            torso_length_cm: 55.0,
            shoulder_width_cm: 40.0,
            flexibility: Flexibility::Medium,
            riding_style: RidingStyle::Road,
        }
    }
}

impl RiderMeasurements {
    /// Validates every measurement and returns the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`FitError::Validation`] naming the offending field.
    pub fn validate(&self) -> FitResult<()> {
        let checks: [(&str, f64, f64, f64, &str); 7] = [
            ("height_cm", self.height_cm, 100.0, 250.0, "cm"),
            ("weight_kg", self.weight_kg, 30.0, 200.0, "kg"),
            ("inseam_cm", self.inseam_cm, 50.0, 120.0, "cm"),
            ("foot_size_eu", self.foot_size_eu, 30.0, 55.0, "EU"),
            ("arm_length_cm", self.arm_length_cm, 40.0, 90.0, "cm"),
            ("torso_length_cm", self.torso_length_cm, 30.0, 80.0, "cm"),
            ("shoulder_width_cm", self.shoulder_width_cm, 25.0, 60.0, "cm"),
        ];
        for (field, value, lo, hi, unit) in checks {
            if !(lo..=hi).contains(&value) {
                return Err(FitError::validation(format!(
                    "{field} must be between {lo} and {hi} {unit}, got {value}"
                )));
            }
        }
        if self.inseam_cm >= self.height_cm {
            return Err(FitError::validation(format!(
                "inseam_cm ({}) must be less than height_cm ({})",
                self.inseam_cm, self.height_cm
            )));
        }
        Ok(())
    }

    /// Static saddle height estimate (LeMond method), one decimal place.
    #[must_use]
    pub fn estimated_saddle_height_cm(&self) -> f64 {
        (self.inseam_cm * LEMOND_FACTOR * 10.0).round() / 10.0
    }
}
