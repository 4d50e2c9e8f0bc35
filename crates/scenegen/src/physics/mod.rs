//! Physics collaborator interface
//!
//! Placement and the settle/toss phases never integrate motion themselves;
//! they delegate to a [`Physics`] implementation. The interface is kept to
//! the three calls the pipeline actually makes, so an external engine can be
//! bridged in without touching the core. [`ReferencePhysics`] is a small
//! deterministic box simulator used by the drivers and the test-suite.

mod reference;

pub use reference::{ReferencePhysics, ReferencePhysicsConfig};

use std::path::Path;

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use thiserror::Error;

use crate::foundation::math::{Quat, Vec3};
use crate::foundation::rng::SceneRng;
use crate::scene::{Aabb, ObjectKey, Scene, SceneObject};

/// Errors reported by a physics collaborator
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// No collision-free pose was found within the retry budget
    #[error("no collision-free pose for '{asset_id}' after {trials} trials")]
    NoFreeSpace {
        /// Asset that could not be placed
        asset_id: String,
        /// Number of poses tried
        trials: u32,
    },

    /// The handle does not refer to an object of the scene
    #[error("object is not part of the scene")]
    UnknownObject,

    /// `run` was called with an empty frame range
    #[error("invalid simulation range [{start}, {end}]")]
    InvalidRange {
        /// Requested first frame
        start: i32,
        /// Requested last frame
        end: i32,
    },

    /// The integration produced non-finite state
    #[error("simulation diverged for '{asset_id}' at frame {frame}")]
    Diverged {
        /// Asset whose state became non-finite
        asset_id: String,
        /// Frame being simulated
        frame: i32,
    },

    /// Failure reported by an external engine
    #[error("physics backend error: {0}")]
    Backend(String),

    /// IO error while persisting state
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Per-frame state of one simulated object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTrack {
    /// Frame of the first recorded sample
    pub frame_start: i32,
    /// Positions per frame
    pub positions: Vec<Vec3>,
    /// Rotations per frame
    pub quaternions: Vec<Quat>,
    /// Linear velocities per frame
    pub velocities: Vec<Vec3>,
    /// Angular velocities per frame
    pub angular_velocities: Vec<Vec3>,
}

impl ObjectTrack {
    /// Number of recorded frames
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position at an absolute frame index
    pub fn position_at(&self, frame: i32) -> Option<Vec3> {
        let offset = usize::try_from(frame - self.frame_start).ok()?;
        self.positions.get(offset).copied()
    }
}

/// Animation of every simulated object over one `run`
#[derive(Debug, Clone, Default)]
pub struct AnimationTrace {
    tracks: SecondaryMap<ObjectKey, ObjectTrack>,
}

impl AnimationTrace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the current state of `object` to its track
    pub fn record(&mut self, key: ObjectKey, frame: i32, object: &SceneObject) {
        if !self.tracks.contains_key(key) {
            self.tracks.insert(key, ObjectTrack { frame_start: frame, ..ObjectTrack::default() });
        }
        if let Some(track) = self.tracks.get_mut(key) {
            track.positions.push(object.position);
            track.quaternions.push(object.rotation);
            track.velocities.push(object.velocity);
            track.angular_velocities.push(Vec3::zeros());
        }
    }

    /// Track of one object
    pub fn get(&self, key: ObjectKey) -> Option<&ObjectTrack> {
        self.tracks.get(key)
    }

    /// Number of objects with a track
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True when no object was recorded
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// A contact between two objects during a simulation run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// The two objects in contact
    pub instances: (ObjectKey, ObjectKey),
    /// Frame at which the contact happened
    pub frame: i32,
    /// Magnitude of the contact impulse
    pub force: f32,
    /// Contact point in world space
    pub position: Vec3,
    /// Contact normal, pointing from the first to the second instance
    pub contact_normal: Vec3,
}

/// Result of one simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationOutput {
    /// Per-object animation
    pub animation: AnimationTrace,
    /// Contacts in the order they happened
    pub collisions: Vec<CollisionEvent>,
}

/// Physics collaborator
pub trait Physics {
    /// Move `key` to a pose inside `spawn_region` that does not overlap any
    /// other object or the ground, and return the chosen position. Retrying is
    /// the implementation's business; giving up is an error.
    fn move_until_no_overlap(
        &mut self,
        scene: &mut Scene,
        key: ObjectKey,
        spawn_region: &Aabb,
        rng: &mut SceneRng,
    ) -> Result<Vec3, PhysicsError>;

    /// Simulate `[frame_start, frame_end]`, leaving the scene at the state of
    /// `frame_end` and keyframing every frame on the objects.
    fn run(
        &mut self,
        scene: &mut Scene,
        frame_start: i32,
        frame_end: i32,
    ) -> Result<SimulationOutput, PhysicsError>;

    /// Persist the simulator state
    fn save_state(&self, _scene: &Scene, path: &Path) -> Result<(), PhysicsError> {
        log::warn!("Physics backend cannot save state; skipping '{}'", path.display());
        Ok(())
    }
}
