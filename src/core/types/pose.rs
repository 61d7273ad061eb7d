//! 6-DOF rigid pose type and its algebra.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A rigid transform in 3-D: position, unit-norm orientation, and the
/// acquisition timestamp of the underlying measurement.
///
/// Poses are immutable values. Every operation returns a new pose; the
/// orientation is renormalized after each composition so numerical drift
/// stays bounded.
///
/// The algebra is non-commutative:
/// ```text
/// C = A ∘ B      apply B after A, with B expressed in A's local frame
/// B = A⁻¹ ∘ C    difference(A, C) recovers B
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose6DOF {
    /// Position in meters.
    pub position: Vector3<f64>,
    /// Orientation as a unit quaternion.
    pub orientation: UnitQuaternion<f64>,
    /// Timestamp in microseconds since epoch.
    pub timestamp_us: u64,
}

impl Pose6DOF {
    /// Create a new pose. The orientation is renormalized on entry.
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>, timestamp_us: u64) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::new_normalize(orientation.into_inner()),
            timestamp_us,
        }
    }

    /// Identity pose at the origin.
    pub fn identity(timestamp_us: u64) -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            timestamp_us,
        }
    }

    /// Pose from position components with identity orientation.
    pub fn from_xyz(x: f64, y: f64, z: f64, timestamp_us: u64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            orientation: UnitQuaternion::identity(),
            timestamp_us,
        }
    }

    /// Compose two poses: apply `other` after `self`, with `other`
    /// expressed in `self`'s local frame.
    ///
    /// The result carries `other`'s timestamp.
    pub fn compose(&self, other: &Pose6DOF) -> Pose6DOF {
        Pose6DOF {
            position: self.position + self.orientation * other.position,
            orientation: UnitQuaternion::new_normalize(
                (self.orientation * other.orientation).into_inner(),
            ),
            timestamp_us: other.timestamp_us,
        }
    }

    /// Relative pose that, composed onto `self`, yields `other`:
    /// `self.compose(&self.difference(&other)) ≈ other`.
    pub fn difference(&self, other: &Pose6DOF) -> Pose6DOF {
        let inv_rot = self.orientation.inverse();
        Pose6DOF {
            position: inv_rot * (other.position - self.position),
            orientation: UnitQuaternion::new_normalize(
                (inv_rot * other.orientation).into_inner(),
            ),
            timestamp_us: other.timestamp_us,
        }
    }

    /// The pose undoing this one: `self.compose(&self.inverse())` is identity.
    pub fn inverse(&self) -> Pose6DOF {
        let inv_rot = self.orientation.inverse();
        Pose6DOF {
            position: -(inv_rot * self.position),
            orientation: inv_rot,
            timestamp_us: self.timestamp_us,
        }
    }

    /// Euclidean norm of the position difference. Ignores orientation.
    pub fn distance_euclidean(a: &Pose6DOF, b: &Pose6DOF) -> f64 {
        (a.position - b.position).norm()
    }

    /// Shortest-arc angular distance between orientations in radians.
    ///
    /// Quaternion double cover is handled: `q` and `-q` compare equal.
    pub fn distance_angular(a: &Pose6DOF, b: &Pose6DOF) -> f64 {
        a.orientation.angle_to(&b.orientation)
    }

    /// Build a pose from a 4×4 homogeneous transform matrix.
    ///
    /// The rotation block is re-orthonormalized, so a slightly noisy
    /// registration result still yields a unit-norm orientation.
    pub fn from_matrix(m: &Matrix4<f64>, timestamp_us: u64) -> Pose6DOF {
        let rotation = m.fixed_view::<3, 3>(0, 0).into_owned();
        Pose6DOF {
            position: Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]),
            orientation: UnitQuaternion::from_matrix(&rotation),
            timestamp_us,
        }
    }

    /// Express this pose as a 4×4 homogeneous transform matrix.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(self.orientation.to_rotation_matrix().matrix());
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.position);
        m
    }
}

impl Default for Pose6DOF {
    fn default() -> Self {
        Self::identity(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample_pose(x: f64, yaw: f64, ts: u64) -> Pose6DOF {
        Pose6DOF::new(
            Vector3::new(x, 0.5, -0.2),
            UnitQuaternion::from_euler_angles(0.1, -0.2, yaw),
            ts,
        )
    }

    #[test]
    fn test_compose_identity() {
        let p = sample_pose(1.0, 0.7, 10);
        let result = p.compose(&Pose6DOF::identity(20));
        assert_relative_eq!(result.position, p.position, epsilon = 1e-12);
        assert_relative_eq!(
            Pose6DOF::distance_angular(&result, &p),
            0.0,
            epsilon = 1e-12
        );
        assert_eq!(result.timestamp_us, 20);
    }

    #[test]
    fn test_difference_compose_roundtrip() {
        let a = sample_pose(1.0, 0.7, 10);
        let b = sample_pose(-2.0, -1.3, 20);
        let delta = a.difference(&b);
        let back = a.compose(&delta);
        assert_relative_eq!(back.position, b.position, epsilon = 1e-6);
        assert_relative_eq!(Pose6DOF::distance_angular(&back, &b), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_difference_of_composition_recovers_operand() {
        let a = sample_pose(0.4, 1.1, 5);
        let b = sample_pose(2.5, -0.4, 6);
        let recovered = a.difference(&a.compose(&b));
        assert_relative_eq!(recovered.position, b.position, epsilon = 1e-6);
        assert_relative_eq!(
            Pose6DOF::distance_angular(&recovered, &b),
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_inverse_roundtrip() {
        let p = sample_pose(3.0, -0.9, 42);
        let result = p.compose(&p.inverse());
        assert_relative_eq!(result.position.norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(result.orientation.angle(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_euclidean_symmetric() {
        let a = sample_pose(1.0, 0.3, 0);
        let b = sample_pose(-4.0, 2.1, 0);
        assert_relative_eq!(
            Pose6DOF::distance_euclidean(&a, &b),
            Pose6DOF::distance_euclidean(&b, &a)
        );
        assert_eq!(Pose6DOF::distance_euclidean(&a, &a), 0.0);
    }

    #[test]
    fn test_unit_norm_after_long_composition_chain() {
        let step = Pose6DOF::new(
            Vector3::new(0.01, 0.02, 0.0),
            UnitQuaternion::from_euler_angles(0.001, 0.002, 0.03),
            0,
        );
        let mut pose = Pose6DOF::identity(0);
        for _ in 0..1000 {
            pose = pose.compose(&step);
        }
        assert_relative_eq!(pose.orientation.into_inner().norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angular_distance_double_cover() {
        let a = Pose6DOF::identity(0);
        // Same rotation, opposite quaternion sign.
        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, 1.0);
        let negated = UnitQuaternion::new_unchecked(-q.into_inner());
        let b = Pose6DOF::new(Vector3::zeros(), negated, 0);
        let c = Pose6DOF::new(Vector3::zeros(), q, 0);
        assert_relative_eq!(
            Pose6DOF::distance_angular(&a, &b),
            Pose6DOF::distance_angular(&a, &c),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_matrix_roundtrip() {
        let p = sample_pose(1.5, 0.8, 99);
        let back = Pose6DOF::from_matrix(&p.to_matrix(), 99);
        assert_relative_eq!(back.position, p.position, epsilon = 1e-9);
        assert_relative_eq!(Pose6DOF::distance_angular(&back, &p), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_compose_order_matters() {
        let forward = Pose6DOF::from_xyz(1.0, 0.0, 0.0, 0);
        let turn = Pose6DOF::new(
            Vector3::zeros(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2),
            0,
        );
        let a = forward.compose(&turn);
        let b = turn.compose(&forward);
        assert_relative_eq!(a.position, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(b.position, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-9);
    }
}
