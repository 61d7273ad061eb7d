//! In-memory pose graph store.
//!
//! Accumulates the vertices and edges the builder submits and republishes
//! them on request. No refinement algorithm runs here; a real nonlinear
//! optimizer plugs in behind the same [`PoseGraphOptimizer`] trait.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::types::{PointCloud3D, Pose6DOF};
use crate::interfaces::{PoseGraphOptimizer, VertexId};
use crate::io::sinks::OutputSink;

/// Type of constraint an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeType {
    /// Fixed origin constraint.
    Prior,
    /// Sequential constraint between consecutive vertices.
    Odometry,
}

/// A vertex in the pose graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphVertex {
    /// Vertex identifier.
    pub id: VertexId,
    /// Pose estimate at creation time.
    pub pose: Pose6DOF,
    /// Retained sweep payload, present only for keyframes.
    pub cloud: Option<PointCloud3D>,
    /// Whether this vertex is a keyframe.
    pub is_keyframe: bool,
}

/// An edge constraining two vertices by a relative transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source vertex.
    pub from: VertexId,
    /// Target vertex.
    pub to: VertexId,
    /// Relative transform from `from` to `to`.
    pub relative: Pose6DOF,
    /// Kind of constraint.
    pub edge_type: EdgeType,
}

/// Accumulating pose-graph back end.
pub struct PoseGraph {
    sink: Arc<dyn OutputSink + Send + Sync>,
    vertices: Vec<GraphVertex>,
    edges: Vec<GraphEdge>,
    next_id: u64,
}

impl PoseGraph {
    /// Create an empty graph publishing through the given sink.
    pub fn new(sink: Arc<dyn OutputSink + Send + Sync>) -> Self {
        Self {
            sink,
            vertices: Vec::new(),
            edges: Vec::new(),
            next_id: 0,
        }
    }

    /// All vertices in insertion order.
    pub fn vertices(&self) -> &[GraphVertex] {
        &self.vertices
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Number of keyframe vertices.
    pub fn keyframe_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_keyframe).count()
    }

    fn alloc_id(&mut self) -> VertexId {
        let id = VertexId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl PoseGraphOptimizer for PoseGraph {
    fn set_initial_pose(&mut self, pose: &Pose6DOF) {
        let id = self.alloc_id();
        self.vertices.push(GraphVertex {
            id,
            pose: *pose,
            cloud: None,
            is_keyframe: false,
        });
        self.edges.push(GraphEdge {
            from: id,
            to: id,
            relative: Pose6DOF::identity(pose.timestamp_us),
            edge_type: EdgeType::Prior,
        });
    }

    fn add_factor(
        &mut self,
        cloud: Option<&PointCloud3D>,
        relative: &Pose6DOF,
        absolute: &Pose6DOF,
        is_keyframe: bool,
    ) -> VertexId {
        let id = self.alloc_id();
        if let Some(prev) = self.vertices.last() {
            self.edges.push(GraphEdge {
                from: prev.id,
                to: id,
                relative: *relative,
                edge_type: EdgeType::Odometry,
            });
        }
        self.vertices.push(GraphVertex {
            id,
            pose: *absolute,
            cloud: cloud.cloned(),
            is_keyframe,
        });
        id
    }

    fn refine_and_publish(&mut self) {
        // Refinement itself is delegated to a real back end; here we only
        // republish the accumulated trajectory.
        log::info!(
            "refinement requested: {} vertices ({} keyframes), {} edges",
            self.vertices.len(),
            self.keyframe_count(),
            self.edges.len()
        );
        self.publish_graph_visualization();
    }

    fn publish_graph_visualization(&self) {
        let poses: Vec<Pose6DOF> = self.vertices.iter().map(|v| v.pose).collect();
        self.sink.publish_graph_markers(&poses, self.edges.len());
    }
}
