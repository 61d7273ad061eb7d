//! Published output streams.
//!
//! The front end publishes a handful of observable streams: the raw
//! localization path, the map-frame ("true") path, the registration-corrected
//! pose and path, debug clouds, and graph markers. Transport is out of scope
//! here; `OutputSink` is the seam behind which a real publisher would sit.

use crate::core::types::{PointCloud3D, PosePath, Pose6DOF};

/// Consumer of the front end's published streams.
///
/// The raw localization path is published unconditionally; everything else
/// is gated by the implementation's verbosity policy.
pub trait OutputSink {
    /// Raw localization path. Published on every accepted sample.
    fn publish_raw_path(&self, path: &PosePath);

    /// Localization history re-expressed in the map frame.
    fn publish_true_path(&self, path: &PosePath);

    /// Latest registration-corrected pose.
    fn publish_corrected_pose(&self, pose: &Pose6DOF);

    /// Full registration-corrected path.
    fn publish_corrected_path(&self, path: &PosePath);

    /// Reference sweep and the reference aligned into the current sweep's
    /// frame, for registration debugging.
    fn publish_debug_clouds(&self, reference: &PointCloud3D, aligned: &PointCloud3D);

    /// Pose-graph visualization markers.
    fn publish_graph_markers(&self, vertices: &[Pose6DOF], edge_count: usize);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn publish_raw_path(&self, _path: &PosePath) {}
    fn publish_true_path(&self, _path: &PosePath) {}
    fn publish_corrected_pose(&self, _pose: &Pose6DOF) {}
    fn publish_corrected_path(&self, _path: &PosePath) {}
    fn publish_debug_clouds(&self, _reference: &PointCloud3D, _aligned: &PointCloud3D) {}
    fn publish_graph_markers(&self, _vertices: &[Pose6DOF], _edge_count: usize) {}
}

/// Sink that writes human-readable stream summaries through `log`.
///
/// Verbosity levels:
/// - 0: raw path only (always published)
/// - 1: pose and debug streams
/// - 2: additional per-pose diagnostics
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    verbosity: u8,
}

impl LogSink {
    /// Create a sink with the given verbosity level (0, 1, or 2).
    pub fn new(verbosity: u8) -> Self {
        Self { verbosity }
    }
}

fn fmt_pose(pose: &Pose6DOF) -> String {
    let (roll, pitch, yaw) = pose.orientation.euler_angles();
    format!(
        "pos [{:.3} {:.3} {:.3}] rpy [{:.3} {:.3} {:.3}] t={}us",
        pose.position.x, pose.position.y, pose.position.z, roll, pitch, yaw, pose.timestamp_us
    )
}

impl OutputSink for LogSink {
    fn publish_raw_path(&self, path: &PosePath) {
        if let Some(pose) = path.last() {
            log::debug!("raw path ({} poses), latest {}", path.len(), fmt_pose(pose));
        }
    }

    fn publish_true_path(&self, path: &PosePath) {
        if self.verbosity >= 1 {
            log::debug!("true path in map frame ({} poses)", path.len());
        }
    }

    fn publish_corrected_pose(&self, pose: &Pose6DOF) {
        if self.verbosity >= 1 {
            log::debug!("corrected pose {}", fmt_pose(pose));
        }
        if self.verbosity >= 2 {
            log::debug!(
                "  corrected orientation quat [{:.6} {:.6} {:.6} {:.6}]",
                pose.orientation.w,
                pose.orientation.i,
                pose.orientation.j,
                pose.orientation.k
            );
        }
    }

    fn publish_corrected_path(&self, path: &PosePath) {
        if self.verbosity >= 1 {
            log::debug!("corrected path ({} poses)", path.len());
        }
    }

    fn publish_debug_clouds(&self, reference: &PointCloud3D, aligned: &PointCloud3D) {
        if self.verbosity >= 1 {
            log::debug!(
                "debug clouds: reference {} pts, aligned {} pts",
                reference.len(),
                aligned.len()
            );
        }
    }

    fn publish_graph_markers(&self, vertices: &[Pose6DOF], edge_count: usize) {
        if self.verbosity >= 1 {
            log::debug!(
                "graph markers: {} vertices, {} edges",
                vertices.len(),
                edge_count
            );
        }
    }
}
