//! Synthetic scenario source.
//!
//! Generates a deterministic trajectory with noisy localization samples and
//! synthetic room sweeps, plus drop-in collaborator implementations
//! (`StaticFrameResolver`, `OracleRegistration`) so the full pipeline can run
//! and be tested without hardware or a real registration solver.

use std::collections::VecDeque;

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::types::{Point3, PointCloud3D, Pose6DOF, Timestamped};
use crate::interfaces::{
    FrameTransformResolver, RegistrationParams, RegistrationResult, ScanRegistration,
};

/// Frame resolver returning one fixed transform for every query.
#[derive(Debug, Clone)]
pub struct StaticFrameResolver {
    transform: Option<Pose6DOF>,
}

impl StaticFrameResolver {
    /// Resolver with a fixed `target ← source` transform.
    pub fn new(transform: Pose6DOF) -> Self {
        Self {
            transform: Some(transform),
        }
    }

    /// Resolver with the identity transform.
    pub fn identity() -> Self {
        Self::new(Pose6DOF::default())
    }

    /// Resolver that never resolves anything.
    pub fn unavailable() -> Self {
        Self { transform: None }
    }
}

impl FrameTransformResolver for StaticFrameResolver {
    fn can_resolve(&self, _target: &str, _source: &str, _timestamp_us: u64) -> bool {
        self.transform.is_some()
    }

    fn resolve(&self, _target: &str, _source: &str, _timestamp_us: u64) -> Pose6DOF {
        // Contract: only called after can_resolve returned true.
        self.transform.unwrap_or_default()
    }
}

/// Registration engine that replays a queue of prepared transforms.
///
/// Each `align` call pops the next transform and reports convergence; an
/// empty queue reports non-convergence. Deterministic by construction.
#[derive(Debug, Default)]
pub struct OracleRegistration {
    queue: VecDeque<Matrix4<f64>>,
}

impl OracleRegistration {
    /// Engine with an empty queue (every alignment fails).
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transform for the next alignment.
    pub fn push_transform(&mut self, transform: Matrix4<f64>) {
        self.queue.push_back(transform);
    }
}

impl ScanRegistration for OracleRegistration {
    fn align(
        &mut self,
        _source: &PointCloud3D,
        _target: &PointCloud3D,
        _params: &RegistrationParams,
    ) -> RegistrationResult {
        match self.queue.pop_front() {
            Some(transform) => RegistrationResult {
                converged: true,
                transform,
            },
            None => RegistrationResult::failed(),
        }
    }
}

/// Shape of the generated scenario.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Number of localization samples.
    pub num_samples: usize,
    /// Time between samples in microseconds.
    pub sample_period_us: u64,
    /// Forward motion per sample in meters.
    pub step_translation: f64,
    /// Yaw change per sample in radians.
    pub step_yaw: f64,
    /// Uniform noise amplitude on sample positions in meters.
    pub odom_noise: f64,
    /// One sweep is emitted every this many samples.
    pub sweep_every: usize,
    /// Points per generated sweep.
    pub points_per_sweep: usize,
    /// Radius of the synthetic room in meters.
    pub room_radius: f64,
    /// RNG seed for the localization noise.
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            num_samples: 200,
            sample_period_us: 100_000,
            step_translation: 0.1,
            step_yaw: 0.01,
            odom_noise: 0.01,
            sweep_every: 2,
            points_per_sweep: 180,
            room_radius: 4.0,
            seed: 7,
        }
    }
}

/// One input event, in arrival order.
#[derive(Debug, Clone)]
pub enum ScenarioEvent {
    /// A localization sample in the odometry frame.
    Odometry(Pose6DOF),
    /// A point-cloud sweep in the sensor frame.
    Sweep(Timestamped<PointCloud3D>),
}

/// A generated scenario: the event stream, the matching oracle engine, and
/// the ground-truth trajectory for evaluation.
pub struct Scenario {
    /// Interleaved input events in arrival order.
    pub events: Vec<ScenarioEvent>,
    /// Registration engine preloaded with the true inter-sweep motion.
    pub oracle: OracleRegistration,
    /// Ground-truth pose per sample.
    pub ground_truth: Vec<Pose6DOF>,
}

/// Generate a deterministic scenario.
///
/// The robot follows a gentle arc; sweeps observe a fixed cylindrical room
/// re-expressed in the sensor frame. The oracle is preloaded with the true
/// motion between consecutive sweeps, so corrected odometry telescopes back
/// onto the ground truth while raw samples carry noise.
pub fn generate(config: &ScenarioConfig) -> Scenario {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let room = room_cloud(config.points_per_sweep, config.room_radius);

    let step = Pose6DOF::new(
        Vector3::new(config.step_translation, 0.0, 0.0),
        UnitQuaternion::from_euler_angles(0.0, 0.0, config.step_yaw),
        0,
    );

    let mut events = Vec::new();
    let mut ground_truth = Vec::new();
    let mut oracle = OracleRegistration::new();

    let mut pose = Pose6DOF::identity(0);
    let mut last_sweep_pose: Option<Pose6DOF> = None;

    for k in 0..config.num_samples {
        let timestamp_us = 1_000_000 + k as u64 * config.sample_period_us;
        if k > 0 {
            pose = pose.compose(&step);
        }
        pose.timestamp_us = timestamp_us;
        ground_truth.push(pose);

        let noise = |rng: &mut StdRng| {
            if config.odom_noise > 0.0 {
                rng.gen_range(-config.odom_noise..config.odom_noise)
            } else {
                0.0
            }
        };
        let sample = Pose6DOF {
            position: pose.position
                + Vector3::new(noise(&mut rng), noise(&mut rng), noise(&mut rng)),
            ..pose
        };
        events.push(ScenarioEvent::Odometry(sample));

        if k % config.sweep_every == 0 {
            let sweep = room.transform(&pose.inverse());
            events.push(ScenarioEvent::Sweep(Timestamped::new(sweep, timestamp_us + 1)));
            if let Some(prev) = last_sweep_pose {
                // True motion since the sweep that produced the previous
                // correction; composing these telescopes onto ground truth.
                oracle.push_transform(prev.difference(&pose).to_matrix());
            }
            last_sweep_pose = Some(pose);
        }
    }

    Scenario {
        events,
        oracle,
        ground_truth,
    }
}

/// A fixed cylindrical "room" point set in the map frame.
fn room_cloud(points: usize, radius: f64) -> PointCloud3D {
    let mut cloud = PointCloud3D::new();
    let rings = 3;
    let per_ring = points.div_ceil(rings);
    for ring in 0..rings {
        let z = ring as f64 * 0.5;
        for i in 0..per_ring {
            let angle = i as f64 / per_ring as f64 * std::f64::consts::TAU;
            cloud.push(Point3::new(radius * angle.cos(), radius * angle.sin(), z));
        }
    }
    cloud
}
