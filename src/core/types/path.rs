//! Append-only pose history.

use serde::{Deserialize, Serialize};

use super::pose::Pose6DOF;

/// An ordered, append-only sequence of poses.
///
/// Used for both the raw-localization history and the registration-corrected
/// history. Grows monotonically and is never truncated, so the full path
/// stays available for publication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosePath {
    poses: Vec<Pose6DOF>,
}

impl PosePath {
    /// Create an empty path.
    pub fn new() -> Self {
        Self { poses: Vec::new() }
    }

    /// Append a pose.
    pub fn push(&mut self, pose: Pose6DOF) {
        self.poses.push(pose);
    }

    /// First appended pose, if any.
    pub fn first(&self) -> Option<&Pose6DOF> {
        self.poses.first()
    }

    /// Most recently appended pose, if any.
    pub fn last(&self) -> Option<&Pose6DOF> {
        self.poses.last()
    }

    /// Number of poses in the path.
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Whether the path is empty.
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// All poses in insertion order.
    pub fn poses(&self) -> &[Pose6DOF] {
        &self.poses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut path = PosePath::new();
        assert!(path.is_empty());
        path.push(Pose6DOF::from_xyz(1.0, 0.0, 0.0, 10));
        path.push(Pose6DOF::from_xyz(2.0, 0.0, 0.0, 20));
        assert_eq!(path.len(), 2);
        assert_eq!(path.first().unwrap().timestamp_us, 10);
        assert_eq!(path.last().unwrap().timestamp_us, 20);
    }
}
