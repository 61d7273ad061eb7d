//! Pose-graph construction policy.
//!
//! The builder polls the tracker's estimate snapshot once per tick and
//! decides which estimates become graph vertices, which vertices are
//! keyframes, and when the back end should run a refinement pass.

use crate::core::types::Pose6DOF;
use crate::engine::tracker::EstimateSnapshot;
use crate::interfaces::{PoseGraphOptimizer, VertexId};

/// Configuration for the graph builder.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Minimum corrected-pose displacement from the previous keyframe for a
    /// fresh correction to become a keyframe (meters).
    pub kfs_dist_thresh: f64,
    /// Minimum raw-odometry displacement for the fallback vertex path
    /// (meters).
    pub vertex_dist_thresh: f64,
    /// Number of keyframes between refinement passes.
    pub keyframes_window: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            kfs_dist_thresh: 0.3,
            vertex_dist_thresh: 0.05,
            keyframes_window: 3,
        }
    }
}

/// What a builder tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// No factor submitted.
    Idle,
    /// Graph origin initialized from the raw pose.
    Initialized,
    /// Keyframe vertex submitted (cloud payload retained).
    Keyframe(VertexId),
    /// Plain registration vertex submitted.
    RegistrationVertex(VertexId),
    /// Fallback vertex from raw odometry submitted.
    FallbackVertex(VertexId),
}

/// Keyframe/vertex/optimization decision loop.
pub struct GraphBuilder {
    config: BuilderConfig,
    optimizer: Box<dyn PoseGraphOptimizer + Send>,

    prev_raw_pose: Pose6DOF,
    prev_keyframe_pose: Pose6DOF,
    num_keyframes: u64,
    num_vertices: u64,
    pending_optimization: bool,
}

impl GraphBuilder {
    /// Create a builder driving the given back end.
    pub fn new(config: BuilderConfig, optimizer: Box<dyn PoseGraphOptimizer + Send>) -> Self {
        Self {
            config,
            optimizer,
            prev_raw_pose: Pose6DOF::default(),
            prev_keyframe_pose: Pose6DOF::default(),
            num_keyframes: 0,
            num_vertices: 0,
            pending_optimization: false,
        }
    }

    /// Number of keyframes created so far.
    pub fn num_keyframes(&self) -> u64 {
        self.num_keyframes
    }

    /// Number of vertices submitted so far (including the origin).
    pub fn num_vertices(&self) -> u64 {
        self.num_vertices
    }

    /// Run one decision tick on a freshly consumed snapshot.
    ///
    /// A fresh registration correction always takes priority over the
    /// raw-odometry fallback, even when the raw delta alone would also
    /// exceed its threshold.
    pub fn tick(&mut self, snapshot: &EstimateSnapshot) -> TickAction {
        let raw_pose = snapshot.raw_pose;

        if self.num_vertices == 0 {
            // First tick: the raw pose becomes the graph origin and this
            // tick does nothing else.
            log::info!("graph origin initialized at {:?}", raw_pose.position);
            self.optimizer.set_initial_pose(&raw_pose);
            self.num_vertices = 1;
            self.prev_keyframe_pose = snapshot.corrected_pose;
            self.prev_raw_pose = raw_pose;
            return TickAction::Initialized;
        }

        let action = if snapshot.fresh_correction {
            let keyframe_dist =
                Pose6DOF::distance_euclidean(&snapshot.corrected_pose, &self.prev_keyframe_pose);
            let is_keyframe = keyframe_dist > self.config.kfs_dist_thresh
                && !snapshot.reference_cloud.is_empty();

            if is_keyframe {
                self.num_keyframes += 1;
                self.prev_keyframe_pose = snapshot.corrected_pose;
                if self.num_keyframes % self.config.keyframes_window == 0 {
                    self.pending_optimization = true;
                }
            }

            let cloud = is_keyframe.then_some(&snapshot.reference_cloud);
            let id = self.optimizer.add_factor(
                cloud,
                &snapshot.registration_transform,
                &snapshot.corrected_pose,
                is_keyframe,
            );
            self.num_vertices += 1;
            self.prev_raw_pose = raw_pose;

            if is_keyframe {
                log::info!(
                    "keyframe {} inserted as vertex {:?} ({:.3}m from previous)",
                    self.num_keyframes,
                    id,
                    keyframe_dist
                );
                TickAction::Keyframe(id)
            } else {
                log::debug!("registration vertex {:?} inserted", id);
                TickAction::RegistrationVertex(id)
            }
        } else if Pose6DOF::distance_euclidean(&raw_pose, &self.prev_raw_pose)
            > self.config.vertex_dist_thresh
            && self.num_keyframes > 0
        {
            // Degradation path: registration has stalled but raw odometry
            // moved enough to be worth a constraint.
            let raw_delta = self.prev_raw_pose.difference(&raw_pose);
            let id = self.optimizer.add_factor(None, &raw_delta, &raw_pose, false);
            self.num_vertices += 1;
            self.prev_raw_pose = raw_pose;
            log::debug!("fallback odometry vertex {:?} inserted", id);
            TickAction::FallbackVertex(id)
        } else {
            TickAction::Idle
        };

        if self.pending_optimization {
            self.optimizer.refine_and_publish();
            self.pending_optimization = false;
        }

        self.optimizer.publish_graph_visualization();
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Point3, PointCloud3D};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Shared record of back-end calls, inspectable after the optimizer is
    /// moved into the builder.
    #[derive(Default)]
    struct Record {
        initial_pose: Option<Pose6DOF>,
        factors: Vec<(bool, bool)>, // (has_cloud, is_keyframe)
        refine_calls: u64,
        marker_calls: u64,
    }

    #[derive(Default)]
    struct RecordingOptimizer {
        next_id: u64,
        record: Arc<Mutex<Record>>,
    }

    impl PoseGraphOptimizer for RecordingOptimizer {
        fn set_initial_pose(&mut self, pose: &Pose6DOF) {
            self.record.lock().initial_pose = Some(*pose);
        }

        fn add_factor(
            &mut self,
            cloud: Option<&PointCloud3D>,
            _relative: &Pose6DOF,
            _absolute: &Pose6DOF,
            is_keyframe: bool,
        ) -> VertexId {
            self.record.lock().factors.push((cloud.is_some(), is_keyframe));
            self.next_id += 1;
            VertexId(self.next_id)
        }

        fn refine_and_publish(&mut self) {
            self.record.lock().refine_calls += 1;
        }

        fn publish_graph_visualization(&self) {
            self.record.lock().marker_calls += 1;
        }
    }

    fn snapshot(
        raw: Pose6DOF,
        corrected: Pose6DOF,
        fresh: bool,
        cloud_points: usize,
    ) -> EstimateSnapshot {
        let mut cloud = PointCloud3D::new();
        for i in 0..cloud_points {
            cloud.push(Point3::new(i as f64, 0.0, 0.0));
        }
        EstimateSnapshot {
            reference_cloud: cloud,
            registration_transform: Pose6DOF::default(),
            corrected_pose: corrected,
            raw_pose: raw,
            fresh_correction: fresh,
        }
    }

    fn builder_with(config: BuilderConfig) -> (GraphBuilder, Arc<Mutex<Record>>) {
        let record = Arc::new(Mutex::new(Record::default()));
        let optimizer = RecordingOptimizer {
            next_id: 0,
            record: record.clone(),
        };
        (GraphBuilder::new(config, Box::new(optimizer)), record)
    }

    fn initialized_builder(config: BuilderConfig) -> (GraphBuilder, Arc<Mutex<Record>>) {
        let (mut builder, record) = builder_with(config);
        let origin = Pose6DOF::from_xyz(0.0, 0.0, 0.0, 0);
        assert_eq!(
            builder.tick(&snapshot(origin, origin, false, 0)),
            TickAction::Initialized
        );
        (builder, record)
    }

    #[test]
    fn test_first_tick_initializes_and_stops() {
        let (mut builder, record) = builder_with(BuilderConfig::default());
        let origin = Pose6DOF::from_xyz(1.0, 2.0, 0.0, 5);
        // Even with a fresh correction pending, the first tick only
        // initializes the origin.
        let action = builder.tick(&snapshot(origin, origin, true, 10));
        assert_eq!(action, TickAction::Initialized);
        assert_eq!(builder.num_vertices(), 1);
        assert_eq!(builder.num_keyframes(), 0);

        let rec = record.lock();
        assert!(rec.initial_pose.is_some());
        assert!(rec.factors.is_empty());
        // The first tick takes no further action, markers included.
        assert_eq!(rec.marker_calls, 0);
    }

    #[test]
    fn test_keyframe_threshold() {
        let (mut builder, _) = initialized_builder(BuilderConfig {
            kfs_dist_thresh: 0.3,
            ..BuilderConfig::default()
        });

        // Distance 0.29 from previous keyframe pose: plain vertex.
        let near = Pose6DOF::from_xyz(0.29, 0.0, 0.0, 1);
        let action = builder.tick(&snapshot(near, near, true, 10));
        assert!(matches!(action, TickAction::RegistrationVertex(_)));
        assert_eq!(builder.num_keyframes(), 0);

        // Distance 0.31: keyframe.
        let far = Pose6DOF::from_xyz(0.31, 0.0, 0.0, 2);
        let action = builder.tick(&snapshot(far, far, true, 10));
        assert!(matches!(action, TickAction::Keyframe(_)));
        assert_eq!(builder.num_keyframes(), 1);
    }

    #[test]
    fn test_empty_cloud_demotes_keyframe() {
        let (mut builder, _) = initialized_builder(BuilderConfig::default());
        let pose = Pose6DOF::from_xyz(1.0, 0.0, 0.0, 1);
        let action = builder.tick(&snapshot(pose, pose, true, 0));
        assert!(matches!(action, TickAction::RegistrationVertex(_)));
        assert_eq!(builder.num_keyframes(), 0);
    }

    #[test]
    fn test_optimization_window_cadence() {
        let (mut builder, record) = initialized_builder(BuilderConfig {
            keyframes_window: 3,
            ..BuilderConfig::default()
        });

        for k in 1..=9u64 {
            let pose = Pose6DOF::from_xyz(k as f64, 0.0, 0.0, k);
            builder.tick(&snapshot(pose, pose, true, 10));
            // Refinement fires exactly once after the 3rd, 6th, 9th keyframe.
            assert_eq!(record.lock().refine_calls, k / 3, "after keyframe {}", k);
        }
        assert_eq!(builder.num_keyframes(), 9);
    }

    #[test]
    fn test_fallback_requires_existing_keyframe() {
        let (mut builder, _) = initialized_builder(BuilderConfig::default());

        // Large raw delta but no keyframe yet: no fallback vertex.
        let moved = Pose6DOF::from_xyz(1.0, 0.0, 0.0, 1);
        let action = builder.tick(&snapshot(moved, moved, false, 0));
        assert_eq!(action, TickAction::Idle);

        // Create a keyframe, then the fallback path opens up.
        let kf = Pose6DOF::from_xyz(1.0, 0.0, 0.0, 2);
        builder.tick(&snapshot(kf, kf, true, 10));
        let moved2 = Pose6DOF::from_xyz(2.0, 0.0, 0.0, 3);
        let action = builder.tick(&snapshot(moved2, moved2, false, 0));
        assert!(matches!(action, TickAction::FallbackVertex(_)));
    }

    #[test]
    fn test_fallback_requires_raw_displacement() {
        let (mut builder, _) = initialized_builder(BuilderConfig {
            vertex_dist_thresh: 0.05,
            ..BuilderConfig::default()
        });
        let kf = Pose6DOF::from_xyz(1.0, 0.0, 0.0, 1);
        builder.tick(&snapshot(kf, kf, true, 10));

        // Raw delta below threshold: idle.
        let barely = Pose6DOF::from_xyz(1.04, 0.0, 0.0, 2);
        assert_eq!(builder.tick(&snapshot(barely, barely, false, 0)), TickAction::Idle);
    }

    #[test]
    fn test_fresh_correction_wins_over_fallback() {
        let (mut builder, _) = initialized_builder(BuilderConfig::default());
        let kf = Pose6DOF::from_xyz(1.0, 0.0, 0.0, 1);
        builder.tick(&snapshot(kf, kf, true, 10));

        // Raw delta exceeds the fallback threshold, but the fresh correction
        // takes the registration path.
        let raw = Pose6DOF::from_xyz(5.0, 0.0, 0.0, 2);
        let corrected = Pose6DOF::from_xyz(1.1, 0.0, 0.0, 2);
        let action = builder.tick(&snapshot(raw, corrected, true, 10));
        assert!(matches!(action, TickAction::RegistrationVertex(_)));
    }

    #[test]
    fn test_keyframe_carries_cloud_payload() {
        let (mut builder, record) = initialized_builder(BuilderConfig::default());

        let kf = Pose6DOF::from_xyz(1.0, 0.0, 0.0, 1);
        builder.tick(&snapshot(kf, kf, true, 10));
        let plain = Pose6DOF::from_xyz(1.1, 0.0, 0.0, 2);
        builder.tick(&snapshot(plain, plain, true, 10));

        let rec = record.lock();
        // Keyframe factor carries the cloud; the plain vertex does not.
        assert_eq!(rec.factors, vec![(true, true), (false, false)]);
        assert_eq!(builder.num_keyframes(), 1);
        assert_eq!(builder.num_vertices(), 3);
    }
}
