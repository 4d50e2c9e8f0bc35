//! Scene objects and their physical parameters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bounds::Aabb;
use crate::foundation::math::{Quat, Vec3};

/// What an object is for in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRole {
    /// Distractor placed before the settle phase
    Static,
    /// Tossed object added after the settle phase
    Dynamic,
    /// Dome / floor; never moves and never counts as an instance
    Background,
}

impl ObjectRole {
    /// Static and dynamic objects are foreground; the dome is not
    pub fn is_foreground(self) -> bool {
        !matches!(self, Self::Background)
    }
}

/// A physical object living in the scene arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Identifier of the asset this object was created from
    pub asset_id: String,

    /// Role in the scene
    pub role: ObjectRole,

    /// Uniform scale applied to the asset geometry
    pub scale: f32,

    /// World position of the asset origin
    pub position: Vec3,

    /// World rotation
    pub rotation: Quat,

    /// Linear velocity
    pub velocity: Vec3,

    /// Friction coefficient
    pub friction: f32,

    /// Restitution (bounciness)
    pub restitution: f32,

    /// Asset-space bounds at scale 1
    pub bounds: Aabb,

    /// Free-form key/value metadata written next to the instance
    pub metadata: BTreeMap<String, Value>,

    /// Per-frame position keyframes written by the simulator
    pub keyframes: BTreeMap<i32, Vec3>,
}

impl SceneObject {
    /// Create an object at the origin with default physical parameters
    pub fn new(asset_id: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            asset_id: asset_id.into(),
            role: ObjectRole::Static,
            scale: 1.0,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            velocity: Vec3::zeros(),
            friction: 0.5,
            restitution: 0.5,
            bounds,
            metadata: BTreeMap::new(),
            keyframes: BTreeMap::new(),
        }
    }

    /// Builder pattern: set role
    pub fn with_role(mut self, role: ObjectRole) -> Self {
        self.role = role;
        self
    }

    /// Builder pattern: set uniform scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Builder pattern: set friction and restitution
    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    /// Builder pattern: set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Bounds after scaling, before translation
    pub fn scaled_bounds(&self) -> Aabb {
        self.bounds.scaled(self.scale)
    }

    /// World-space bounds at the current position
    pub fn world_bounds(&self) -> Aabb {
        self.scaled_bounds().translated(self.position)
    }

    /// World-space bounds at a given frame, falling back to the current
    /// position when the frame has no keyframe
    pub fn world_bounds_at(&self, frame: i32) -> Aabb {
        self.scaled_bounds().translated(self.position_at(frame))
    }

    /// Keyframed position at `frame`, or the current position
    pub fn position_at(&self, frame: i32) -> Vec3 {
        self.keyframes.get(&frame).copied().unwrap_or(self.position)
    }

    /// Record a metadata entry
    pub fn set_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }
}
