//! Perspective camera with per-frame pose keyframes
//!
//! The renderer reads the camera pose for every rendered frame from a
//! [`CameraTrack`]. Poses are always inserted as a pair of keyframes
//! (position and orientation) so that a frame can never end up with one
//! channel animated and the other left at a stale value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::foundation::math::{look_at_rotation, world_up, Quat, Vec3};

/// Intrinsics of the pinhole camera used for every challenge scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    /// Focal length in millimetres
    pub focal_length: f32,
    /// Sensor width in millimetres
    pub sensor_width: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            focal_length: 35.0,
            sensor_width: 32.0,
        }
    }
}

impl PerspectiveCamera {
    /// Horizontal field of view in radians
    pub fn field_of_view(&self) -> f32 {
        2.0 * (self.sensor_width / (2.0 * self.focal_length)).atan()
    }

    /// Project a world point seen from `pose` to normalised image coordinates.
    ///
    /// `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right one. The
    /// sensor width spans the image width; `aspect` is width over height.
    /// Points behind the camera have no projection.
    pub fn project(&self, pose: &CameraPose, point: Vec3, aspect: f32) -> Option<[f32; 2]> {
        let local = pose.rotation.inverse() * (point - pose.position);
        let depth = -local.z;
        if depth <= f32::EPSILON {
            return None;
        }
        let sensor_height = self.sensor_width / aspect;
        let x = 0.5 + self.focal_length / self.sensor_width * local.x / depth;
        let y = 0.5 - self.focal_length / sensor_height * local.y / depth;
        Some([x, y])
    }
}

/// Camera pose at one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Frame index this pose is keyframed at
    pub frame: i32,
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera faces
    pub look_at: Vec3,
    /// Camera-to-world rotation derived from `position` and `look_at`
    pub rotation: Quat,
}

impl CameraPose {
    /// Pose at `position` facing `target`, with world +Z as up
    pub fn looking_at(frame: i32, position: Vec3, target: Vec3) -> Self {
        Self {
            frame,
            position,
            look_at: target,
            rotation: look_at_rotation(position, target, world_up()),
        }
    }

    /// Unit viewing direction
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 0.0, -1.0)
    }
}

/// Camera with keyframed position and orientation channels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraTrack {
    /// Camera intrinsics
    pub camera: PerspectiveCamera,
    positions: BTreeMap<i32, Vec3>,
    rotations: BTreeMap<i32, Quat>,
}

impl CameraTrack {
    /// Create an empty track for `camera`
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self {
            camera,
            positions: BTreeMap::new(),
            rotations: BTreeMap::new(),
        }
    }

    /// Keyframe both channels of `pose`. A later insert for the same frame
    /// overwrites the earlier one.
    pub fn insert_pose(&mut self, pose: &CameraPose) {
        log::trace!("Camera keyframe {}: position {:?}", pose.frame, pose.position);
        self.positions.insert(pose.frame, pose.position);
        self.rotations.insert(pose.frame, pose.rotation);
    }

    /// Keyframe every pose in `poses`
    pub fn insert_poses<'a>(&mut self, poses: impl IntoIterator<Item = &'a CameraPose>) {
        for pose in poses {
            self.insert_pose(pose);
        }
    }

    /// Pose at `frame` if both channels are keyframed there
    pub fn pose_at(&self, frame: i32) -> Option<CameraPose> {
        let position = *self.positions.get(&frame)?;
        let rotation = *self.rotations.get(&frame)?;
        Some(CameraPose {
            frame,
            position,
            look_at: Vec3::zeros(),
            rotation,
        })
    }

    /// Keyframed frames in ascending order
    pub fn frames(&self) -> impl Iterator<Item = i32> + '_ {
        self.positions.keys().copied()
    }

    /// Number of keyframed frames
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when nothing is keyframed
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Drop all keyframes, keeping the intrinsics
    pub fn clear(&mut self) {
        self.positions.clear();
        self.rotations.clear();
    }

    /// Check that every frame carries both a position and a rotation keyframe
    pub fn validate(&self) -> Result<(), SceneError> {
        if let Some(frame) = self
            .positions
            .keys()
            .find(|frame| !self.rotations.contains_key(frame))
        {
            return Err(SceneError::IncompleteKeyframe(*frame));
        }
        if let Some(frame) = self
            .rotations
            .keys()
            .find(|frame| !self.positions.contains_key(frame))
        {
            return Err(SceneError::IncompleteKeyframe(*frame));
        }
        Ok(())
    }

    /// Poses for `frames`, skipping frames that are not keyframed
    pub fn poses(&self, frames: impl IntoIterator<Item = i32>) -> Vec<CameraPose> {
        frames.into_iter().filter_map(|frame| self.pose_at(frame)).collect()
    }
}
