use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// Tolerance for the unit-norm debug checks; quaternion products drift
/// slowly away from unit norm without renormalization.
const UNIT_TOLERANCE: f64 = 1e-3;

/// Reads the orientation quaternion stored at `x[3..7]` of a generalized
/// coordinate vector (w, x, y, z order).
///
/// The stored components are kept unit-norm by construction: every update
/// composes a unit rotation onto a unit orientation, so no renormalization
/// is performed here.
#[inline]
pub fn orientation_of(x: &[f64]) -> UnitQuaternion<f64> {
    let q = Quaternion::new(x[3], x[4], x[5], x[6]);
    debug_assert!(is_unit(&q));
    UnitQuaternion::new_unchecked(q)
}

/// Writes an orientation quaternion into `x[3..7]` (w, x, y, z order).
#[inline]
pub fn store_orientation(x: &mut [f64], q: &UnitQuaternion<f64>) {
    x[3] = q.w;
    x[4] = q.i;
    x[5] = q.j;
    x[6] = q.k;
}

/// Rotation of `angle` radians about a unit `axis`.
#[inline]
pub fn axis_angle(axis: &Vector3<f64>, angle: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), angle)
}

/// Rotation encoded as a tangent-space rotation vector: the angle is the
/// vector's norm and the axis its direction. A zero vector is the identity.
#[inline]
pub fn from_rotation_vector(v: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_scaled_axis(*v)
}

#[inline]
pub fn is_unit(q: &Quaternion<f64>) -> bool {
    (q.norm() - 1.0).abs() < UNIT_TOLERANCE
}
