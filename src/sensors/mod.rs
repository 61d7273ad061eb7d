//! Sensor processing layer.

pub mod preprocessing;
