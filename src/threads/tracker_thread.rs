//! Tracker thread - ingests localization samples and sweeps.
//!
//! Event-driven via crossbeam channels:
//! - localization samples and sweeps arrive on separate channels
//! - `crossbeam::select!` waits on both; each event is handled under the
//!   shared tracker lock and the lock is released before the next wait
//! - exits when the shutdown flag clears or both producers hang up

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, never, select};
use parking_lot::Mutex;

use crate::core::types::{PointCloud3D, Pose6DOF, Timestamped};
use crate::engine::OdometryTracker;

/// Tracker shared between the ingest thread and the builder thread.
pub type SharedTracker = Arc<Mutex<OdometryTracker>>;

/// Tracker thread handle.
pub struct TrackerThread {
    handle: JoinHandle<()>,
}

impl TrackerThread {
    /// Spawn the tracker thread.
    pub fn spawn(
        tracker: SharedTracker,
        sample_rx: Receiver<Pose6DOF>,
        sweep_rx: Receiver<Timestamped<PointCloud3D>>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("tracker".into())
            .spawn(move || run_loop(tracker, sample_rx, sweep_rx, running))
            .expect("Failed to spawn tracker thread");

        Self { handle }
    }

    /// Wait for the thread to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_loop(
    tracker: SharedTracker,
    mut sample_rx: Receiver<Pose6DOF>,
    mut sweep_rx: Receiver<Timestamped<PointCloud3D>>,
    running: Arc<AtomicBool>,
) {
    log::info!("tracker thread starting");

    let mut samples_open = true;
    let mut sweeps_open = true;

    while running.load(Ordering::Relaxed) && (samples_open || sweeps_open) {
        select! {
            recv(sample_rx) -> result => match result {
                Ok(sample) => tracker.lock().handle_odometry_sample(sample),
                Err(_) => {
                    samples_open = false;
                    sample_rx = never();
                }
            },
            recv(sweep_rx) -> result => match result {
                Ok(sweep) => tracker.lock().handle_sweep(&sweep.data, sweep.timestamp_us),
                Err(_) => {
                    sweeps_open = false;
                    sweep_rx = never();
                }
            },
            // Timeout to allow checking the running flag.
            default(Duration::from_millis(10)) => {}
        }
    }

    log::info!("tracker thread shutdown complete");
}
