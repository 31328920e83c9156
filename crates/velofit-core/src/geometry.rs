//! Angle primitives and the derived cycling angles.
//!
//! All functions are pure and operate on 2D positions only; depth is ignored.
//! Angles are returned in degrees.
//!
//! # Example
//!
//! ```rust
//! use velofit_core::geometry::angle_at_vertex;
//! use velofit_core::types::Point2;
//!
//! let a = Point2::new(0.0, 1.0);
//! let b = Point2::new(0.0, 0.0);
//! let c = Point2::new(1.0, 0.0);
//! let angle = angle_at_vertex(a, b, c).unwrap();
//! assert!((angle - 90.0).abs() < 1e-10);
//! ```

use crate::error::GeometryError;
use crate::types::Point2;

/// Rays shorter than this (in normalized units) have no usable direction.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-9;

fn ray(from: Point2, to: Point2) -> Result<(f64, f64, f64), GeometryError> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if !(dx.is_finite() && dy.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    let length = dx.hypot(dy);
    if length < MIN_SEGMENT_LENGTH {
        return Err(GeometryError::DegenerateGeometry { length });
    }
    Ok((dx, dy, length))
}

/// Angle at `b` between rays `b→a` and `b→c`, in [0°, 180°].
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateGeometry`] if either ray is shorter than
/// [`MIN_SEGMENT_LENGTH`].
pub fn angle_at_vertex(a: Point2, b: Point2, c: Point2) -> Result<f64, GeometryError> {
    let (ax, ay, la) = ray(b, a)?;
    let (cx, cy, lc) = ray(b, c)?;
    let cosine = (ax * cx + ay * cy) / (la * lc);
    Ok(cosine.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Absolute angle of segment `p1→p2` against the horizontal, in [0°, 90°].
///
/// Direction does not matter: a segment pointing left and slightly up has
/// the same angle as one pointing right and slightly down.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateGeometry`] for a zero-length segment.
pub fn angle_to_horizontal(p1: Point2, p2: Point2) -> Result<f64, GeometryError> {
    let (dx, dy, _) = ray(p1, p2)?;
    let angle = dy.atan2(dx).abs().to_degrees();
    Ok(if angle > 90.0 { 180.0 - angle } else { angle })
}

// ---------------------------------------------------------------------------
// Derived angles
// ---------------------------------------------------------------------------

/// Knee extension: interior angle hip–knee–ankle. 180° is a straight leg.
pub fn knee_extension(hip: Point2, knee: Point2, ankle: Point2) -> Result<f64, GeometryError> {
    angle_at_vertex(hip, knee, ankle)
}

/// Hip angle: shoulder–hip–knee.
pub fn hip_angle(shoulder: Point2, hip: Point2, knee: Point2) -> Result<f64, GeometryError> {
    angle_at_vertex(shoulder, hip, knee)
}

/// Torso inclination: hip→shoulder against the horizontal.
pub fn back_angle(shoulder: Point2, hip: Point2) -> Result<f64, GeometryError> {
    angle_to_horizontal(hip, shoulder)
}

/// Ankle angle: knee–ankle–toe.
pub fn ankle_angle(knee: Point2, ankle: Point2, toe: Point2) -> Result<f64, GeometryError> {
    angle_at_vertex(knee, ankle, toe)
}

/// Elbow angle: shoulder–elbow–wrist.
pub fn elbow_angle(shoulder: Point2, elbow: Point2, wrist: Point2) -> Result<f64, GeometryError> {
    angle_at_vertex(shoulder, elbow, wrist)
}

/// Shoulder angle: hip–shoulder–elbow.
pub fn shoulder_angle(hip: Point2, shoulder: Point2, elbow: Point2) -> Result<f64, GeometryError> {
    angle_at_vertex(hip, shoulder, elbow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_at_vertex(p(0.0, 1.0), p(0.0, 0.0), p(1.0, 0.0)).unwrap();
        assert!((angle - 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_collinear_is_straight() {
        let angle = angle_at_vertex(p(0.1, 0.1), p(0.3, 0.3), p(0.6, 0.6)).unwrap();
        assert!((angle - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_folded_back_is_zero() {
        let angle = angle_at_vertex(p(0.5, 0.5), p(0.2, 0.2), p(0.8, 0.8)).unwrap();
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_ray_fails() {
        let err = angle_at_vertex(p(0.2, 0.2), p(0.2, 0.2), p(0.8, 0.8)).unwrap_err();
        assert!(matches!(err, GeometryError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_non_finite_fails() {
        let err = angle_at_vertex(p(f64::NAN, 0.2), p(0.2, 0.2), p(0.8, 0.8)).unwrap_err();
        assert_eq!(err, GeometryError::NonFinite);
    }

    #[test]
    fn test_horizontal_folding() {
        let flat = angle_to_horizontal(p(0.0, 0.0), p(1.0, 0.0)).unwrap();
        let reversed = angle_to_horizontal(p(1.0, 0.0), p(0.0, 0.0)).unwrap();
        let vertical = angle_to_horizontal(p(0.0, 0.0), p(0.0, 1.0)).unwrap();
        let diag = angle_to_horizontal(p(0.5, 0.5), p(0.0, 0.0)).unwrap();
        assert!(flat.abs() < 1e-10);
        assert!(reversed.abs() < 1e-10);
        assert!((vertical - 90.0).abs() < 1e-10);
        assert!((diag - 45.0).abs() < 1e-10);
    }

    #[test]
    fn test_back_angle_uses_hip_to_shoulder() {
        // Shoulder forward and up from the hip at 40 degrees.
        let hip = p(0.4, 0.6);
        let r = 0.3;
        let theta = 40.0_f64.to_radians();
        let shoulder = p(hip.x + r * theta.cos(), hip.y - r * theta.sin());
        let angle = back_angle(shoulder, hip).unwrap();
        assert!((angle - 40.0).abs() < 1e-9);
    }
}
