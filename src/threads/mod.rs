//! Thread harness: one ingest thread, one fixed-rate builder thread.

pub mod builder_thread;
pub mod tracker_thread;

pub use builder_thread::BuilderThread;
pub use tracker_thread::{SharedTracker, TrackerThread};
