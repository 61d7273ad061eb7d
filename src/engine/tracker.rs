//! Drift-corrected odometry tracking.
//!
//! The tracker fuses two asynchronous inputs:
//! - localization samples in the odometry frame, resolved into the map frame
//! - point-cloud sweeps, registered against a periodically rotated reference
//!
//! It maintains the raw-localization history and the registration-corrected
//! history in parallel and exposes a consume-and-clear snapshot that tells
//! the graph builder when a fresh registration correction exists.

use std::sync::Arc;

use crate::core::types::{PointCloud3D, PosePath, Pose6DOF};
use crate::interfaces::{
    CloudDownsampler, FrameTransformResolver, RegistrationParams, ScanRegistration,
};
use crate::io::sinks::OutputSink;

/// Tracker lifecycle state. The transition is irreversible: once tracking
/// begins the tracker never returns to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    /// No localization sample has been resolved into the map frame yet.
    #[default]
    Uninitialized,
    /// Origin recorded; both pose streams are live.
    Tracking,
}

/// Configuration for the odometry tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Fixed map frame identifier.
    pub map_frame: String,
    /// Moving odometry frame identifier.
    pub odom_frame: String,
    /// Robot body frame identifier.
    pub robot_frame: String,
    /// Sensor frame identifier.
    pub sensor_frame: String,
    /// Minimum position delta for a localization sample to be appended
    /// rather than discarded as noise (meters).
    pub pose_dist_thresh: f64,
    /// Number of sweeps between reference-sweep replacements.
    pub num_clouds_skip: u32,
    /// Fixed registration parameters.
    pub registration: RegistrationParams,
    /// Verbosity level: 0 silent, 1 pose/debug streams, 2 diagnostics.
    pub verbosity: u8,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            map_frame: "map".to_string(),
            odom_frame: "odom".to_string(),
            robot_frame: "base_link".to_string(),
            sensor_frame: "laser".to_string(),
            pose_dist_thresh: 0.05,
            num_clouds_skip: 2,
            registration: RegistrationParams::default(),
            verbosity: 1,
        }
    }
}

/// Transient estimate read by the graph builder.
///
/// `fresh_correction` is consumed by the read that produced this snapshot:
/// a second read without an intervening reference rotation reports false.
#[derive(Debug, Clone)]
pub struct EstimateSnapshot {
    /// Copy of the current reference sweep.
    pub reference_cloud: PointCloud3D,
    /// Latest registration-derived relative transform.
    pub registration_transform: Pose6DOF,
    /// Latest corrected pose; falls back to the latest raw pose while no
    /// registration correction has ever been produced.
    pub corrected_pose: Pose6DOF,
    /// Latest raw-localization pose in the map frame.
    pub raw_pose: Pose6DOF,
    /// Whether a new registration correction arrived since the last read.
    pub fresh_correction: bool,
}

/// Odometry tracker: turns localization samples and sweeps into a
/// drift-corrected pose stream.
pub struct OdometryTracker {
    config: TrackerConfig,
    state: TrackerState,

    resolver: Box<dyn FrameTransformResolver + Send>,
    registration: Box<dyn ScanRegistration + Send>,
    downsampler: Box<dyn CloudDownsampler + Send>,
    sink: Arc<dyn OutputSink + Send + Sync>,

    /// Raw localization history, resolved into the map frame.
    raw_path: PosePath,
    /// Registration-corrected history.
    corrected_path: PosePath,
    /// First resolved pose; the tracker's origin.
    origin: Option<Pose6DOF>,

    /// Latest registration-derived relative transform.
    latest_registration: Pose6DOF,
    /// Sweep the next registration runs against.
    reference_cloud: Option<PointCloud3D>,
    /// Sweeps processed since the last reference replacement.
    clouds_skipped: u32,
    /// One-shot "new correction available" signal.
    fresh_correction: bool,
}

impl OdometryTracker {
    /// Create a tracker with injected collaborators.
    pub fn new(
        config: TrackerConfig,
        resolver: Box<dyn FrameTransformResolver + Send>,
        registration: Box<dyn ScanRegistration + Send>,
        downsampler: Box<dyn CloudDownsampler + Send>,
        sink: Arc<dyn OutputSink + Send + Sync>,
    ) -> Self {
        Self {
            config,
            state: TrackerState::Uninitialized,
            resolver,
            registration,
            downsampler,
            sink,
            raw_path: PosePath::new(),
            corrected_path: PosePath::new(),
            origin: None,
            latest_registration: Pose6DOF::default(),
            reference_cloud: None,
            clouds_skipped: 0,
            fresh_correction: false,
        }
    }

    /// Whether the tracker has resolved its first localization sample.
    pub fn is_ready(&self) -> bool {
        self.state == TrackerState::Tracking
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// First resolved pose, if tracking has started.
    pub fn origin(&self) -> Option<&Pose6DOF> {
        self.origin.as_ref()
    }

    /// Raw localization history in the map frame.
    pub fn raw_path(&self) -> &PosePath {
        &self.raw_path
    }

    /// Registration-corrected history.
    pub fn corrected_path(&self) -> &PosePath {
        &self.corrected_path
    }

    /// Ingest one localization sample, given in the odometry frame.
    ///
    /// Samples that cannot be resolved into the map frame are dropped
    /// silently. Samples whose position delta from the last accepted sample
    /// is below `pose_dist_thresh` are discarded as noise.
    pub fn handle_odometry_sample(&mut self, sample: Pose6DOF) {
        if !self.resolver.can_resolve(
            &self.config.map_frame,
            &self.config.odom_frame,
            sample.timestamp_us,
        ) {
            log::debug!(
                "dropping localization sample at {}us: {} <- {} unresolved",
                sample.timestamp_us,
                self.config.map_frame,
                self.config.odom_frame
            );
            return;
        }
        let map_from_odom = self.resolver.resolve(
            &self.config.map_frame,
            &self.config.odom_frame,
            sample.timestamp_us,
        );
        let pose_in_map = map_from_odom.compose(&sample);

        if let Some(last) = self.raw_path.last() {
            let delta = last.difference(&pose_in_map);
            if delta.position.norm() < self.config.pose_dist_thresh {
                // Noise: neither stream advances, nothing published.
                return;
            }
        } else {
            // First resolved sample: record the origin and seed the
            // corrected stream with it.
            self.origin = Some(pose_in_map);
            self.corrected_path.push(pose_in_map);
            self.state = TrackerState::Tracking;
            log::info!("tracking started, origin {:?}", pose_in_map.position);
        }

        self.raw_path.push(pose_in_map);
        self.sink.publish_raw_path(&self.raw_path);
        self.sink.publish_true_path(&self.raw_path);
    }

    /// Ingest one point-cloud sweep.
    pub fn handle_sweep(&mut self, sweep: &PointCloud3D, timestamp_us: u64) {
        let current = self.downsampler.downsample(sweep);

        let reference = match &self.reference_cloud {
            Some(reference) if self.is_ready() => reference,
            _ => {
                // No reference yet (or tracking not started): adopt this
                // sweep and wait for the next one.
                self.reference_cloud = Some(current);
                self.clouds_skipped = 0;
                return;
            }
        };

        let result =
            self.registration
                .align(&current, reference, &self.config.registration);
        if result.converged {
            self.apply_correction(Pose6DOF::from_matrix(&result.transform, timestamp_us));
        } else {
            log::debug!("registration did not converge at {}us", timestamp_us);
        }

        // Reference rotation runs on a fixed cadence regardless of
        // convergence. Registration above always used the current reference,
        // which may be up to `num_clouds_skip` sweeps stale.
        if self.clouds_skipped >= self.config.num_clouds_skip {
            self.fresh_correction = true;
            self.reference_cloud = Some(current);
            self.clouds_skipped = 0;
        } else {
            self.clouds_skipped += 1;
        }
    }

    /// Compose a converged registration transform onto the latest corrected
    /// pose and publish the result.
    fn apply_correction(&mut self, transform: Pose6DOF) {
        self.latest_registration = transform;

        // Registration only runs while tracking, and the corrected stream is
        // seeded with the origin, so a latest pose always exists.
        let Some(prev) = self.corrected_path.last().copied() else {
            return;
        };
        let corrected = prev.compose(&transform);
        self.corrected_path.push(corrected);

        self.sink.publish_corrected_pose(&corrected);
        self.sink.publish_corrected_path(&self.corrected_path);

        if self.config.verbosity >= 1 {
            if let Some(reference) = &self.reference_cloud {
                let aligned = reference.transform(&transform.inverse());
                self.sink.publish_debug_clouds(reference, &aligned);
            }
        }
    }

    /// Consume-and-clear estimate read.
    ///
    /// Returns `None` until the first localization sample has been resolved.
    /// The fresh-correction flag is returned and atomically cleared; callers
    /// must hold the tracker lock across the read (single consumer).
    pub fn estimate_snapshot(&mut self) -> Option<EstimateSnapshot> {
        let raw_pose = *self.raw_path.last()?;
        let corrected_pose = self.corrected_path.last().copied().unwrap_or(raw_pose);
        let fresh = self.fresh_correction;
        self.fresh_correction = false;
        Some(EstimateSnapshot {
            reference_cloud: self.reference_cloud.clone().unwrap_or_default(),
            registration_transform: self.latest_registration,
            corrected_pose,
            raw_pose,
            fresh_correction: fresh,
        })
    }
}
