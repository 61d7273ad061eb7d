//! Deterministic sweep preprocessing.

mod voxel;

pub use voxel::{PassthroughDownsampler, VoxelGridConfig, VoxelGridDownsampler};
