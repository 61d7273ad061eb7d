//! Foundation value types: poses, clouds, paths.

mod cloud;
mod path;
mod pose;
mod timestamped;

pub use cloud::{Point3, PointCloud3D};
pub use path::PosePath;
pub use pose::Pose6DOF;
pub use timestamped::Timestamped;
