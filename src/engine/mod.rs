//! Front-end engine: odometry tracking and pose-graph construction.

pub mod builder;
pub mod graph;
pub mod tracker;

pub use builder::{BuilderConfig, GraphBuilder, TickAction};
pub use graph::{EdgeType, GraphEdge, GraphVertex, PoseGraph};
pub use tracker::{EstimateSnapshot, OdometryTracker, TrackerConfig, TrackerState};
