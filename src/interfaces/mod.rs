//! Collaborator adapter traits.
//!
//! The tracker and graph builder depend only on these seams. Production
//! wiring injects real transform lookup, registration, and back-end
//! implementations; tests inject deterministic fakes.

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::core::types::{PointCloud3D, Pose6DOF};

/// Answers whether a rigid transform between two frames is known at a given
/// time, and returns it.
///
/// `resolve` is only called after `can_resolve` has returned true for the
/// same query.
pub trait FrameTransformResolver {
    /// Whether the `target ← source` transform is known at `timestamp_us`.
    fn can_resolve(&self, target: &str, source: &str, timestamp_us: u64) -> bool;

    /// The `target ← source` rigid transform at `timestamp_us`.
    fn resolve(&self, target: &str, source: &str, timestamp_us: u64) -> Pose6DOF;
}

/// Fixed parameters for a registration attempt.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationParams {
    /// Maximum solver iterations.
    pub max_iterations: u32,
    /// Convergence epsilon on the incremental transform.
    pub epsilon: f64,
    /// Maximum correspondence distance in meters.
    pub max_correspondence_distance: f64,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            epsilon: 1e-6,
            max_correspondence_distance: 0.5,
        }
    }
}

/// Outcome of aligning a source cloud against a target cloud.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
    /// Whether the solver converged.
    pub converged: bool,
    /// Homogeneous transform aligning source onto target. Only meaningful
    /// when `converged` is true.
    pub transform: Matrix4<f64>,
}

impl RegistrationResult {
    /// A non-converged result with an identity transform.
    pub fn failed() -> Self {
        Self {
            converged: false,
            transform: Matrix4::identity(),
        }
    }
}

/// Aligns two point sets and reports convergence plus the rigid transform.
///
/// Randomized sampling is disabled by contract; given the same inputs an
/// implementation must return the same result.
pub trait ScanRegistration {
    /// Align `source` against `target`.
    fn align(
        &mut self,
        source: &PointCloud3D,
        target: &PointCloud3D,
        params: &RegistrationParams,
    ) -> RegistrationResult;
}

/// Deterministic point-cloud reduction.
pub trait CloudDownsampler {
    /// Downsample a sweep. Must be deterministic for identical input.
    fn downsample(&self, cloud: &PointCloud3D) -> PointCloud3D;
}

/// Opaque identifier for a vertex owned by the back-end optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u64);

/// The external pose-graph back end.
///
/// Vertices and edges are owned entirely by the implementation; the front
/// end only supplies the inputs needed to create them and receives back
/// opaque vertex identifiers.
pub trait PoseGraphOptimizer {
    /// Fix the graph origin to the given pose. Called exactly once, before
    /// any factor is added.
    fn set_initial_pose(&mut self, pose: &Pose6DOF);

    /// Add a new vertex constrained to the previous one by `relative`, with
    /// `absolute` as its initial estimate. A cloud payload is attached only
    /// for keyframes.
    fn add_factor(
        &mut self,
        cloud: Option<&PointCloud3D>,
        relative: &Pose6DOF,
        absolute: &Pose6DOF,
        is_keyframe: bool,
    ) -> VertexId;

    /// Run a refinement pass and republish the refined map/trajectory.
    fn refine_and_publish(&mut self);

    /// Republish the graph visualization markers.
    fn publish_graph_visualization(&self);
}
