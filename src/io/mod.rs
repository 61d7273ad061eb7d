//! Input/output: publication sinks and the synthetic scenario source.

pub mod sim;
pub mod sinks;

pub use sim::{OracleRegistration, Scenario, ScenarioConfig, ScenarioEvent, StaticFrameResolver};
pub use sinks::{LogSink, NullSink, OutputSink};
