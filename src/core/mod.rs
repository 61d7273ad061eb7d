//! Core foundation layer: value types with no internal dependencies.

pub mod types;
