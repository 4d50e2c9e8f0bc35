//! Scene arena
//!
//! All objects of a scene live in one slot map and are addressed by stable
//! [`ObjectKey`]s. Objects are never removed during a scene's lifetime, so the
//! insertion order doubles as the raw segmentation index order: the `i`-th
//! inserted object (0-based) is drawn with index `i + 1`, index 0 being the
//! background.
//!
//! ```text
//! Camera Path Generator ──► CameraTrack
//! Placement Planner ──────► objects (static, then dynamic)
//! Simulation Controller ──► positions / velocities / keyframes
//! Renderer ───────────────► segmentation ──► Visibility Postprocessor
//! ```

mod bounds;
mod camera;
mod object;

pub use bounds::Aabb;
pub use camera::{CameraPose, CameraTrack, PerspectiveCamera};
pub use object::{ObjectRole, SceneObject};

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde_json::Value;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle of an object inside a [`Scene`]
    pub struct ObjectKey;
}

/// A scene: objects, camera and global settings
#[derive(Debug, Clone)]
pub struct Scene {
    objects: SlotMap<ObjectKey, SceneObject>,
    order: Vec<ObjectKey>,

    /// Keyframed camera
    pub camera: CameraTrack,

    /// First recorded frame
    pub frame_start: i32,

    /// Last recorded frame (inclusive)
    pub frame_end: i32,

    /// Frames per second
    pub frame_rate: u32,

    /// Output resolution (width, height)
    pub resolution: (u32, u32),

    /// Ambient illumination colour (RGB)
    pub ambient_illumination: [f32; 3],

    /// Scene-level metadata written to `metadata.json`
    pub metadata: BTreeMap<String, Value>,
}

impl Scene {
    /// Create an empty scene recording `[frame_start, frame_end]`
    pub fn new(frame_start: i32, frame_end: i32, frame_rate: u32, resolution: (u32, u32)) -> Self {
        Self {
            objects: SlotMap::with_key(),
            order: Vec::new(),
            camera: CameraTrack::default(),
            frame_start,
            frame_end,
            frame_rate,
            resolution,
            ambient_illumination: [0.0; 3],
            metadata: BTreeMap::new(),
        }
    }

    /// Number of recorded frames
    pub fn num_frames(&self) -> usize {
        (self.frame_end - self.frame_start + 1).max(0) as usize
    }

    /// Recorded frame indices
    pub fn frames(&self) -> RangeInclusive<i32> {
        self.frame_start..=self.frame_end
    }

    /// Add an object, returning its handle
    pub fn add(&mut self, object: SceneObject) -> ObjectKey {
        let key = self.objects.insert(object);
        self.order.push(key);
        key
    }

    /// Look up an object
    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    /// Look up an object mutably
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.objects.get_mut(key)
    }

    /// Number of objects, background included
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the scene has no objects
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All object handles in insertion order
    pub fn keys(&self) -> &[ObjectKey] {
        &self.order
    }

    /// Objects with their handles in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> + '_ {
        self.order.iter().map(move |key| (*key, &self.objects[*key]))
    }

    /// Handles of foreground (static and dynamic) objects in insertion order
    pub fn foreground_keys(&self) -> Vec<ObjectKey> {
        self.iter()
            .filter(|(_, object)| object.role.is_foreground())
            .map(|(key, _)| key)
            .collect()
    }

    /// Handles of objects with the given role in insertion order
    pub fn keys_with_role(&self, role: ObjectRole) -> Vec<ObjectKey> {
        self.iter()
            .filter(|(_, object)| object.role == role)
            .map(|(key, _)| key)
            .collect()
    }

    /// Raw segmentation index of an object (1-based)
    pub fn segmentation_index(&self, key: ObjectKey) -> Option<u32> {
        self.order
            .iter()
            .position(|candidate| *candidate == key)
            .map(|position| position as u32 + 1)
    }

    /// Object handle drawn with raw segmentation index `index`
    pub fn key_for_segmentation_index(&self, index: u32) -> Option<ObjectKey> {
        let position = (index as usize).checked_sub(1)?;
        self.order.get(position).copied()
    }

    /// Record a scene-level metadata entry
    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_corners([-0.5; 3], [0.5; 3])
    }

    #[test]
    fn test_segmentation_indices_follow_insertion_order() {
        let mut scene = Scene::new(1, 24, 12, (256, 256));
        let dome =
            scene.add(SceneObject::new("dome", unit_box()).with_role(ObjectRole::Background));
        let first = scene.add(SceneObject::new("a", unit_box()));
        let second = scene.add(SceneObject::new("b", unit_box()).with_role(ObjectRole::Dynamic));

        assert_eq!(scene.segmentation_index(dome), Some(1));
        assert_eq!(scene.segmentation_index(second), Some(3));
        assert_eq!(scene.key_for_segmentation_index(2), Some(first));
        assert_eq!(scene.key_for_segmentation_index(0), None);
        assert_eq!(scene.key_for_segmentation_index(9), None);
        assert_eq!(scene.foreground_keys(), vec![first, second]);
        assert_eq!(scene.keys_with_role(ObjectRole::Dynamic), vec![second]);
    }

    #[test]
    fn test_num_frames() {
        let scene = Scene::new(1, 24, 12, (256, 256));
        assert_eq!(scene.num_frames(), 24);
        assert_eq!(scene.frames().count(), 24);
    }
}
