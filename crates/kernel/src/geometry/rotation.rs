//! Immutable unit-quaternion rotations.
//!
//! Every operation returns a new [`Rotation`]; composition is explicit via
//! [`Rotation::then`], so a chain of alignment steps reads in application order.

use nalgebra::{Quaternion as NaQuaternion, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use super::vector::Vec3;

/// Dot-product band inside which two unit vectors count as parallel or antiparallel.
const PARALLEL_EPS: f64 = 1e-12;

/// Errors from building a rotation out of degenerate input.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RotationError {
    #[error("cannot derive a rotation from a zero-length vector")]
    AmbiguousZeroVector,

    #[error("quaternion has zero norm")]
    DegenerateQuaternion,
}

/// Plain `(x, y, z, w)` quaternion components, the wire shape of a [`Rotation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// A rotation about the origin, stored as a unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Quaternion", into = "Quaternion")]
pub struct Rotation {
    q: UnitQuaternion<f64>,
}

impl Rotation {
    pub fn identity() -> Self {
        Self {
            q: UnitQuaternion::identity(),
        }
    }

    /// Rotation of `angle` radians about `axis` (right-handed).
    pub fn about_axis(axis: Vec3, angle: f64) -> Result<Self, RotationError> {
        let axis = Unit::try_new(Vector3::from(axis), 1e-15).ok_or(RotationError::AmbiguousZeroVector)?;
        Ok(Self {
            q: UnitQuaternion::from_axis_angle(&axis, angle),
        })
    }

    pub fn about_x(angle: f64) -> Self {
        Self {
            q: UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle),
        }
    }

    pub fn about_y(angle: f64) -> Self {
        Self {
            q: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle),
        }
    }

    pub fn about_z(angle: f64) -> Self {
        Self {
            q: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
        }
    }

    /// Shortest rotation taking the direction of `from` onto the direction of `to`.
    ///
    /// Exactly antiparallel inputs have no unique shortest rotation; a half turn
    /// about an arbitrary axis orthogonal to `from` is returned instead.
    pub fn between(from: Vec3, to: Vec3) -> Result<Self, RotationError> {
        let a = from.normalized().ok_or(RotationError::AmbiguousZeroVector)?;
        let b = to.normalized().ok_or(RotationError::AmbiguousZeroVector)?;
        let d = a.dot(&b).clamp(-1.0, 1.0);

        if d >= 1.0 - PARALLEL_EPS {
            return Ok(Self::identity());
        }
        if d <= -1.0 + PARALLEL_EPS {
            let axis = orthogonal_axis(a);
            debug!(?from, ?to, ?axis, "antiparallel vectors, using half turn");
            return Self::about_axis(axis, PI);
        }

        let cross = a.cross(&b);
        let angle = cross.length().atan2(d);
        Self::about_axis(cross, angle)
    }

    /// Euler angles in degrees, applied intrinsically in X, Y, Z order.
    pub fn from_euler_degrees(angles: Vec3) -> Self {
        let rx = Self::about_x(angles.x.to_radians());
        let ry = Self::about_y(angles.y.to_radians());
        let rz = Self::about_z(angles.z.to_radians());
        Self {
            q: rx.q * ry.q * rz.q,
        }
    }

    /// Composite rotation: apply `self` first, then `next`.
    pub fn then(&self, next: &Rotation) -> Rotation {
        Rotation { q: next.q * self.q }
    }

    pub fn inverse(&self) -> Rotation {
        Rotation { q: self.q.inverse() }
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        (self.q * Vector3::from(v)).into()
    }

    /// Rotation angle in radians, in `[0, pi]`.
    pub fn angle(&self) -> f64 {
        self.q.angle()
    }

    /// Angle of the relative rotation between `self` and `other`.
    pub fn angle_to(&self, other: &Rotation) -> f64 {
        self.q.angle_to(&other.q)
    }

    pub fn as_quaternion(&self) -> Quaternion {
        let q = self.q.quaternion();
        Quaternion {
            x: q.i,
            y: q.j,
            z: q.k,
            w: q.w,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<UnitQuaternion<f64>> for Rotation {
    fn from(q: UnitQuaternion<f64>) -> Self {
        Self { q }
    }
}

impl TryFrom<Quaternion> for Rotation {
    type Error = RotationError;

    fn try_from(c: Quaternion) -> Result<Self, Self::Error> {
        let q = UnitQuaternion::try_new(NaQuaternion::new(c.w, c.x, c.y, c.z), 1e-12)
            .ok_or(RotationError::DegenerateQuaternion)?;
        Ok(Self { q })
    }
}

impl From<Rotation> for Quaternion {
    fn from(r: Rotation) -> Self {
        r.as_quaternion()
    }
}

/// Signed angle (radians) that rotates `from` onto `to` about `axis`, after
/// projecting both into the plane perpendicular to `axis`.
///
/// `axis` must be unit length. Returns `None` when either projection vanishes,
/// i.e. the vector is parallel to the axis and carries no in-plane direction.
pub fn signed_angle_about(from: Vec3, to: Vec3, axis: Vec3) -> Option<f64> {
    let u = from.reject_from(&axis).normalized()?;
    let v = to.reject_from(&axis).normalized()?;
    Some(axis.dot(&u.cross(&v)).atan2(u.dot(&v)))
}

fn orthogonal_axis(v: Vec3) -> Vec3 {
    let helper = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    // v is unit length and helper is not parallel to it, so the cross product is well away from zero.
    let c = v.cross(&helper);
    c / c.length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_rotation_z_90() {
        let r = Rotation::about_z(FRAC_PI_2);
        assert_vec_eq(r.apply(Vec3::X), Vec3::Y);
        assert_vec_eq(r.apply(Vec3::Y), -Vec3::X);
    }

    #[test]
    fn test_between_general() {
        let from = Vec3::new(1.0, 0.0, 0.0);
        let to = Vec3::new(0.0, 1.0, 1.0);
        let r = Rotation::between(from, to).unwrap();
        assert_vec_eq(r.apply(from), to.normalized().unwrap());
    }

    #[test]
    fn test_between_parallel_is_identity() {
        let r = Rotation::between(Vec3::Z, Vec3::Z * 3.0).unwrap();
        assert_relative_eq!(r.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_between_antiparallel_is_half_turn() {
        for v in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(1.0, 1.0, 1.0)] {
            let r = Rotation::between(v, -v).unwrap();
            let q = r.as_quaternion();
            assert!(q.x.is_finite() && q.y.is_finite() && q.z.is_finite() && q.w.is_finite());
            assert_relative_eq!(r.angle(), PI, epsilon = 1e-9);
            assert_vec_eq(r.apply(v.normalized().unwrap()), -v.normalized().unwrap());
        }
    }

    #[test]
    fn test_between_zero_vector_is_error() {
        assert_eq!(
            Rotation::between(Vec3::ZERO, Vec3::Z),
            Err(RotationError::AmbiguousZeroVector)
        );
        assert_eq!(
            Rotation::about_axis(Vec3::ZERO, 1.0),
            Err(RotationError::AmbiguousZeroVector)
        );
    }

    #[test]
    fn test_then_applies_in_order() {
        let a = Rotation::about_z(FRAC_PI_2);
        let b = Rotation::about_x(FRAC_PI_2);
        // X -> Y under a, then Y -> Z under b.
        assert_vec_eq(a.then(&b).apply(Vec3::X), Vec3::Z);
    }

    #[test]
    fn test_inverse_undoes_rotation() {
        let r = Rotation::about_axis(Vec3::new(1.0, 2.0, 3.0), 0.7).unwrap();
        let v = Vec3::new(-4.0, 5.0, 0.5);
        assert_vec_eq(r.inverse().apply(r.apply(v)), v);
    }

    #[test]
    fn test_euler_degrees_single_axis() {
        let r = Rotation::from_euler_degrees(Vec3::new(0.0, 0.0, 90.0));
        assert_vec_eq(r.apply(Vec3::X), Vec3::Y);
        let r = Rotation::from_euler_degrees(Vec3::new(90.0, 0.0, 0.0));
        assert_vec_eq(r.apply(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn test_signed_angle_about() {
        let a = signed_angle_about(Vec3::X, Vec3::Y, Vec3::Z).unwrap();
        assert_relative_eq!(a, FRAC_PI_2, epsilon = 1e-12);
        let b = signed_angle_about(Vec3::Y, Vec3::X, Vec3::Z).unwrap();
        assert_relative_eq!(b, -FRAC_PI_2, epsilon = 1e-12);
        assert!(signed_angle_about(Vec3::Z, Vec3::X, Vec3::Z).is_none());
    }

    #[test]
    fn test_quaternion_serde_shape() {
        let r = Rotation::about_z(PI);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"w\""));
        let back: Rotation = serde_json::from_str(&json).unwrap();
        assert!(back.angle_to(&r) < 1e-12);
    }

    #[test]
    fn test_degenerate_quaternion_rejected() {
        let zero = Quaternion { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
        assert_eq!(Rotation::try_from(zero), Err(RotationError::DegenerateQuaternion));
    }
}
