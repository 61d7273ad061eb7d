//! Voxel-grid downsampling for 3-D sweeps.
//!
//! Reduces point count while preserving sweep structure. Points are binned
//! into a fixed cubic grid and each occupied voxel is replaced by the
//! centroid of its points, so identical input always yields identical
//! output regardless of point order within a voxel.

use std::collections::BTreeMap;

use crate::core::types::{Point3, PointCloud3D};
use crate::interfaces::CloudDownsampler;

/// Configuration for voxel-grid downsampling.
#[derive(Debug, Clone, Copy)]
pub struct VoxelGridConfig {
    /// Edge length of a voxel in meters.
    ///
    /// Default: 0.05 m.
    pub leaf_size: f64,
}

impl Default for VoxelGridConfig {
    fn default() -> Self {
        Self { leaf_size: 0.05 }
    }
}

/// Deterministic centroid-per-voxel downsampler.
#[derive(Debug, Clone)]
pub struct VoxelGridDownsampler {
    config: VoxelGridConfig,
}

impl VoxelGridDownsampler {
    /// Create a new downsampler with the given configuration.
    pub fn new(config: VoxelGridConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &VoxelGridConfig {
        &self.config
    }

    #[inline]
    fn voxel_index(&self, p: &Point3) -> (i64, i64, i64) {
        let inv = 1.0 / self.config.leaf_size;
        (
            (p.x * inv).floor() as i64,
            (p.y * inv).floor() as i64,
            (p.z * inv).floor() as i64,
        )
    }
}

impl CloudDownsampler for VoxelGridDownsampler {
    fn downsample(&self, cloud: &PointCloud3D) -> PointCloud3D {
        if cloud.is_empty() {
            return cloud.clone();
        }

        // Accumulate (sum, count) per voxel. BTreeMap keeps the output in
        // voxel-index order, independent of input ordering across voxels.
        let mut bins: BTreeMap<(i64, i64, i64), (f64, f64, f64, usize)> = BTreeMap::new();
        for p in cloud.iter() {
            let entry = bins.entry(self.voxel_index(p)).or_insert((0.0, 0.0, 0.0, 0));
            entry.0 += p.x;
            entry.1 += p.y;
            entry.2 += p.z;
            entry.3 += 1;
        }

        let points = bins
            .values()
            .map(|&(sx, sy, sz, n)| {
                let inv = 1.0 / n as f64;
                Point3::new(sx * inv, sy * inv, sz * inv)
            })
            .collect();
        PointCloud3D::from_points(points)
    }
}

/// Downsampler that returns the input unchanged.
///
/// Useful when sweeps are already sparse, and as a deterministic stand-in
/// in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDownsampler;

impl CloudDownsampler for PassthroughDownsampler {
    fn downsample(&self, cloud: &PointCloud3D) -> PointCloud3D {
        cloud.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dense_line() -> PointCloud3D {
        let mut cloud = PointCloud3D::new();
        for i in 0..100 {
            cloud.push(Point3::new(i as f64 * 0.001, 0.0, 0.0));
        }
        cloud
    }

    #[test]
    fn test_reduces_dense_cloud() {
        let down = VoxelGridDownsampler::new(VoxelGridConfig { leaf_size: 0.05 });
        let out = down.downsample(&dense_line());
        // 100 points over 0.1m collapse to two 0.05m voxels.
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_centroid_per_voxel() {
        let down = VoxelGridDownsampler::new(VoxelGridConfig { leaf_size: 1.0 });
        let cloud = PointCloud3D::from_points(vec![
            Point3::new(0.2, 0.2, 0.2),
            Point3::new(0.4, 0.4, 0.4),
        ]);
        let out = down.downsample(&cloud);
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out.points[0].x, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_deterministic_under_reordering() {
        let down = VoxelGridDownsampler::new(VoxelGridConfig::default());
        let cloud = dense_line();
        let mut reversed = cloud.clone();
        reversed.points.reverse();
        assert_eq!(down.downsample(&cloud), down.downsample(&reversed));
    }

    #[test]
    fn test_empty_cloud_passthrough() {
        let down = VoxelGridDownsampler::new(VoxelGridConfig::default());
        assert!(down.downsample(&PointCloud3D::new()).is_empty());
    }
}
