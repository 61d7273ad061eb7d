//! Builder thread - fixed-rate graph construction.
//!
//! Polls the shared tracker at a fixed rate. The snapshot is taken under the
//! tracker lock (the consume-and-clear read must not interleave with sweep
//! handling) and the graph work runs with the lock released, so ingest is
//! never blocked on optimization.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::engine::{GraphBuilder, TickAction};
use crate::threads::tracker_thread::SharedTracker;

/// Builder thread handle. Joining returns the builder so final graph
/// statistics survive shutdown.
pub struct BuilderThread {
    handle: JoinHandle<GraphBuilder>,
}

impl BuilderThread {
    /// Spawn the builder thread ticking at `tick_period_ms`.
    pub fn spawn(
        mut builder: GraphBuilder,
        tracker: SharedTracker,
        tick_period_ms: u64,
        running: Arc<AtomicBool>,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("builder".into())
            .spawn(move || {
                log::info!("builder thread starting ({}ms period)", tick_period_ms);

                while running.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_millis(tick_period_ms));

                    let snapshot = tracker.lock().estimate_snapshot();
                    let Some(snapshot) = snapshot else {
                        // Tracking has not started yet.
                        continue;
                    };

                    match builder.tick(&snapshot) {
                        TickAction::Idle => {}
                        action => log::debug!("builder tick: {:?}", action),
                    }
                }

                log::info!(
                    "builder thread shutdown complete ({} vertices, {} keyframes)",
                    builder.num_vertices(),
                    builder.num_keyframes()
                );
                builder
            })
            .expect("Failed to spawn builder thread");

        Self { handle }
    }

    /// Wait for the thread to finish and recover the builder.
    pub fn join(self) -> thread::Result<GraphBuilder> {
        self.handle.join()
    }
}
