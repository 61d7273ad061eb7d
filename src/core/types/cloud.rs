//! 3-D point cloud type.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::pose::Pose6DOF;

/// A single 3-D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// Create a new point.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// An unordered 3-D point set, one per lidar sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud3D {
    /// The points, in the frame the sweep was acquired in.
    pub points: Vec<Point3>,
}

impl PointCloud3D {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a cloud from raw points.
    pub fn from_points(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cloud contains no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a point.
    #[inline]
    pub fn push(&mut self, point: Point3) {
        self.points.push(point);
    }

    /// Iterate over points.
    pub fn iter(&self) -> impl Iterator<Item = &Point3> {
        self.points.iter()
    }

    /// Return a copy of this cloud with every point rigidly transformed.
    pub fn transform(&self, pose: &Pose6DOF) -> PointCloud3D {
        let points = self
            .points
            .iter()
            .map(|p| {
                let v = pose.position + pose.orientation * p.as_vector();
                Point3::new(v.x, v.y, v.z)
            })
            .collect();
        PointCloud3D { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_transform_rotates_and_translates() {
        let cloud = PointCloud3D::from_points(vec![Point3::new(1.0, 0.0, 0.0)]);
        let pose = Pose6DOF::new(
            Vector3::new(0.0, 0.0, 1.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, FRAC_PI_2),
            0,
        );
        let out = cloud.transform(&pose);
        assert_relative_eq!(out.points[0].x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.points[0].y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(out.points[0].z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_inverse_roundtrip() {
        let cloud = PointCloud3D::from_points(vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-0.5, 0.1, 0.7),
        ]);
        let pose = Pose6DOF::new(
            Vector3::new(0.3, -0.6, 0.9),
            UnitQuaternion::from_euler_angles(0.2, 0.4, -0.8),
            0,
        );
        let back = cloud.transform(&pose).transform(&pose.inverse());
        for (a, b) in back.iter().zip(cloud.iter()) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
            assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
        }
    }
}
