//! MargaSLAM - Pose-graph front end for a spinning-lidar mapping pipeline
//!
//! # Architecture
//!
//! The crate is organized into logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      main                           │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    threads/                         │  ← Thread harness
//! │            (tracker thread, builder thread)         │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Infrastructure
//! │              (sinks, synthetic scenario)            │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │          (tracker, graph builder, pose graph)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Sensor processing
//! │                  (preprocessing)                    │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                     (types)                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Pipeline
//!
//! Two asynchronous inputs drive the system: localization samples in the
//! odometry frame and point-cloud sweeps from a spinning lidar. The
//! odometry tracker resolves samples into the map frame, registers each
//! sweep against a periodically rotated reference, and maintains raw and
//! drift-corrected pose streams. A fixed-rate builder thread reads
//! consume-and-clear estimate snapshots and grows a pose graph: keyframes
//! above a travel threshold keep their sweep, smaller motions become plain
//! vertices, and refinement is requested on a keyframe-count window.

// Layer 1: Core foundation (no internal deps)
pub mod core;

// Layer 2: Sensor processing (depends on core)
pub mod sensors;

// Layer 3: Collaborator seams (depends on core)
pub mod interfaces;

// Layer 4: I/O infrastructure (depends on core, interfaces)
pub mod io;

// Layer 5: Engine (depends on all lower layers)
pub mod engine;

// Layer 6: Thread infrastructure
pub mod threads;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use crate::core::types::{Point3, PointCloud3D, PosePath, Pose6DOF, Timestamped};

// Collaborator seams
pub use interfaces::{
    CloudDownsampler, FrameTransformResolver, PoseGraphOptimizer, RegistrationParams,
    RegistrationResult, ScanRegistration, VertexId,
};

// Sensors - Preprocessing
pub use sensors::preprocessing::{PassthroughDownsampler, VoxelGridConfig, VoxelGridDownsampler};

// Engine
pub use engine::{
    BuilderConfig, EdgeType, EstimateSnapshot, GraphBuilder, GraphEdge, GraphVertex,
    OdometryTracker, PoseGraph, TickAction, TrackerConfig, TrackerState,
};

// I/O
pub use io::sim::{OracleRegistration, Scenario, ScenarioConfig, ScenarioEvent, StaticFrameResolver};
pub use io::sinks::{LogSink, NullSink, OutputSink};

// Threads
pub use threads::{BuilderThread, SharedTracker, TrackerThread};
