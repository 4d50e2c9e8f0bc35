//! Reference rigid-box simulator
//!
//! A deliberately small simulator: every foreground object is an
//! axis-aligned box that falls under gravity, bounces on the ground plane and
//! is pushed out of other boxes along the axis of least penetration. Rotation
//! is not integrated. It is deterministic for a given scene and generator, so
//! it serves the drivers and the tests where a full engine is unavailable.
//!
//! Contact handling follows the classic broad/narrow split: all pairs are
//! tested (scenes hold a few dozen objects), and pairs are reported at most
//! once per frame.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AnimationTrace, CollisionEvent, Physics, PhysicsError, SimulationOutput};
use crate::foundation::math::Vec3;
use crate::foundation::rng::SceneRng;
use crate::scene::{Aabb, ObjectKey, ObjectRole, Scene};

/// Horizontal velocity lost per second of ground contact at friction 1.0
const FRICTION_RATE: f32 = 8.0;

/// Tunables of the reference simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencePhysicsConfig {
    /// Gravity acceleration
    pub gravity: Vec3,
    /// Integration steps per rendered frame
    pub substeps: u32,
    /// Poses tried by `move_until_no_overlap` before giving up
    pub max_placement_trials: u32,
    /// Height of the ground plane
    pub ground_height: f32,
    /// Overlap below this depth counts as resting contact
    pub contact_tolerance: f32,
    /// Impacts slower than this are not reported as collision events
    pub min_impact_speed: f32,
}

impl Default for ReferencePhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
            substeps: 10,
            max_placement_trials: 100,
            ground_height: 0.0,
            contact_tolerance: 1e-4,
            min_impact_speed: 0.05,
        }
    }
}

/// Collision pair, always stored with the lower segmentation slot first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContactPair {
    first: usize,
    second: usize,
}

impl ContactPair {
    fn new(a: usize, b: usize) -> Self {
        if a < b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

/// Ground material taken from the background object, if any
#[derive(Debug, Clone, Copy)]
struct GroundMaterial {
    key: Option<ObjectKey>,
    friction: f32,
    restitution: f32,
}

/// Deterministic box simulator implementing [`Physics`]
#[derive(Debug, Clone, Default)]
pub struct ReferencePhysics {
    config: ReferencePhysicsConfig,
}

#[derive(Serialize)]
struct BodySnapshot<'a> {
    asset_id: &'a str,
    role: ObjectRole,
    scale: f32,
    position: Vec3,
    velocity: Vec3,
    friction: f32,
    restitution: f32,
}

#[derive(Serialize)]
struct PhysicsSnapshot<'a> {
    config: &'a ReferencePhysicsConfig,
    frame_rate: u32,
    bodies: Vec<BodySnapshot<'a>>,
}

impl ReferencePhysics {
    /// Create a simulator with the given tunables
    pub fn new(config: ReferencePhysicsConfig) -> Self {
        Self { config }
    }

    /// Active tunables
    pub fn config(&self) -> &ReferencePhysicsConfig {
        &self.config
    }

    fn ground_material(scene: &Scene) -> GroundMaterial {
        scene
            .iter()
            .find(|(_, object)| object.role == ObjectRole::Background)
            .map_or(
                GroundMaterial { key: None, friction: 0.5, restitution: 0.5 },
                |(key, object)| GroundMaterial {
                    key: Some(key),
                    friction: object.friction,
                    restitution: object.restitution,
                },
            )
    }

    /// Integrate one substep for every body
    fn step(
        &self,
        scene: &mut Scene,
        bodies: &[ObjectKey],
        dt: f32,
        frame: i32,
        ground: GroundMaterial,
        reported: &mut HashSet<ContactPair>,
        collisions: &mut Vec<CollisionEvent>,
    ) -> Result<(), PhysicsError> {
        let ground_height = self.config.ground_height;

        for (slot, key) in bodies.iter().enumerate() {
            let object = scene.get_mut(*key).ok_or(PhysicsError::UnknownObject)?;
            object.velocity += self.config.gravity * dt;
            object.position += object.velocity * dt;

            let bottom = object.world_bounds().min.z;
            if bottom < ground_height {
                object.position.z += ground_height - bottom;
                let impact_speed = -object.velocity.z;
                if impact_speed > 0.0 {
                    object.velocity.z = impact_speed * object.restitution * ground.restitution;
                }
                let damping =
                    (1.0 - object.friction * ground.friction * FRICTION_RATE * dt).max(0.0);
                object.velocity.x *= damping;
                object.velocity.y *= damping;

                if impact_speed > self.config.min_impact_speed {
                    if let Some(ground_key) = ground.key {
                        // Ground contacts use slot usize::MAX so they never clash with body pairs
                        if reported.insert(ContactPair::new(slot, usize::MAX)) {
                            let contact =
                                Vec3::new(object.position.x, object.position.y, ground_height);
                            collisions.push(CollisionEvent {
                                instances: (*key, ground_key),
                                frame,
                                force: impact_speed,
                                position: contact,
                                contact_normal: Vec3::new(0.0, 0.0, -1.0),
                            });
                        }
                    }
                }
            }

            if !(object.position.iter().all(|c| c.is_finite())
                && object.velocity.iter().all(|c| c.is_finite()))
            {
                return Err(PhysicsError::Diverged {
                    asset_id: object.asset_id.clone(),
                    frame,
                });
            }
        }

        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                self.resolve_pair(
                    scene,
                    (i, bodies[i]),
                    (j, bodies[j]),
                    frame,
                    reported,
                    collisions,
                )?;
            }
        }
        Ok(())
    }

    /// Separate two penetrating boxes and exchange momentum along the
    /// separating axis (equal masses)
    fn resolve_pair(
        &self,
        scene: &mut Scene,
        (slot_a, key_a): (usize, ObjectKey),
        (slot_b, key_b): (usize, ObjectKey),
        frame: i32,
        reported: &mut HashSet<ContactPair>,
        collisions: &mut Vec<CollisionEvent>,
    ) -> Result<(), PhysicsError> {
        let a = scene.get(key_a).ok_or(PhysicsError::UnknownObject)?;
        let b = scene.get(key_b).ok_or(PhysicsError::UnknownObject)?;
        let (bounds_a, bounds_b) = (a.world_bounds(), b.world_bounds());
        let Some(depth) = bounds_a.penetration(&bounds_b, self.config.contact_tolerance) else {
            return Ok(());
        };

        let axis = depth.imin();
        // +1 when b lies on the positive side of a along `axis`
        let direction = if bounds_a.center()[axis] <= bounds_b.center()[axis] { 1.0 } else { -1.0 };
        let restitution = a.restitution * b.restitution;
        let mut velocity_a = a.velocity;
        let mut velocity_b = b.velocity;
        let mut position_a = a.position;
        let mut position_b = b.position;

        if axis == 2 {
            // Vertical contact: lift the upper box only, the lower one rests on something
            if direction > 0.0 {
                position_b.z += depth.z;
            } else {
                position_a.z += depth.z;
            }
        } else {
            position_a[axis] -= direction * depth[axis] * 0.5;
            position_b[axis] += direction * depth[axis] * 0.5;
        }

        let approach_speed = (velocity_a[axis] - velocity_b[axis]) * direction;
        if approach_speed > 0.0 {
            let impulse = 0.5 * (1.0 + restitution) * approach_speed;
            velocity_a[axis] -= impulse * direction;
            velocity_b[axis] += impulse * direction;

            if approach_speed > self.config.min_impact_speed
                && reported.insert(ContactPair::new(slot_a, slot_b))
            {
                let overlap = Aabb::new(
                    bounds_a.min.sup(&bounds_b.min),
                    bounds_a.max.inf(&bounds_b.max),
                );
                let mut normal = Vec3::zeros();
                normal[axis] = direction;
                collisions.push(CollisionEvent {
                    instances: (key_a, key_b),
                    frame,
                    force: impulse,
                    position: overlap.center(),
                    contact_normal: normal,
                });
            }
        }

        if let Some(object) = scene.get_mut(key_a) {
            object.position = position_a;
            object.velocity = velocity_a;
        }
        if let Some(object) = scene.get_mut(key_b) {
            object.position = position_b;
            object.velocity = velocity_b;
        }
        Ok(())
    }
}

impl Physics for ReferencePhysics {
    fn move_until_no_overlap(
        &mut self,
        scene: &mut Scene,
        key: ObjectKey,
        spawn_region: &Aabb,
        rng: &mut SceneRng,
    ) -> Result<Vec3, PhysicsError> {
        let object = scene.get(key).ok_or(PhysicsError::UnknownObject)?;
        let local = object.scaled_bounds();
        let asset_id = object.asset_id.clone();

        // Positions for which the whole box stays inside the region
        let mut low = spawn_region.min - local.min;
        let mut high = spawn_region.max - local.max;
        for axis in 0..3 {
            if low[axis] > high[axis] {
                let middle = 0.5 * (low[axis] + high[axis]);
                low[axis] = middle;
                high[axis] = middle;
            }
        }

        let obstacles: Vec<Aabb> = scene
            .iter()
            .filter(|(other, candidate)| *other != key && candidate.role.is_foreground())
            .map(|(_, candidate)| candidate.world_bounds())
            .collect();

        let tolerance = self.config.contact_tolerance;
        for trial in 0..self.config.max_placement_trials {
            let position = rng.uniform_vec3(&low, &high);
            let candidate = local.translated(position);
            let above_ground = candidate.min.z >= self.config.ground_height - tolerance;
            let free = obstacles
                .iter()
                .all(|obstacle| candidate.penetration(obstacle, tolerance).is_none());

            if above_ground && free {
                log::trace!("Placed '{}' after {} trials", asset_id, trial + 1);
                let object = scene.get_mut(key).ok_or(PhysicsError::UnknownObject)?;
                object.position = position;
                return Ok(position);
            }
        }

        Err(PhysicsError::NoFreeSpace {
            asset_id,
            trials: self.config.max_placement_trials,
        })
    }

    fn run(
        &mut self,
        scene: &mut Scene,
        frame_start: i32,
        frame_end: i32,
    ) -> Result<SimulationOutput, PhysicsError> {
        if frame_end < frame_start {
            return Err(PhysicsError::InvalidRange { start: frame_start, end: frame_end });
        }

        let substeps = self.config.substeps.max(1);
        let dt = 1.0 / (scene.frame_rate.max(1) as f32 * substeps as f32);
        let ground = Self::ground_material(scene);
        let bodies = scene.foreground_keys();
        log::debug!(
            "Simulating {} bodies over frames [{}, {}]",
            bodies.len(),
            frame_start,
            frame_end
        );

        let mut output = SimulationOutput {
            animation: AnimationTrace::new(),
            collisions: Vec::new(),
        };

        for frame in frame_start..=frame_end {
            if frame > frame_start {
                let mut reported = HashSet::new();
                for _ in 0..substeps {
                    self.step(
                        scene,
                        &bodies,
                        dt,
                        frame,
                        ground,
                        &mut reported,
                        &mut output.collisions,
                    )?;
                }
            }
            for key in &bodies {
                let object = scene.get_mut(*key).ok_or(PhysicsError::UnknownObject)?;
                object.keyframes.insert(frame, object.position);
                output.animation.record(*key, frame, object);
            }
        }

        Ok(output)
    }

    fn save_state(&self, scene: &Scene, path: &Path) -> Result<(), PhysicsError> {
        let snapshot = PhysicsSnapshot {
            config: &self.config,
            frame_rate: scene.frame_rate,
            bodies: scene
                .iter()
                .map(|(_, object)| BodySnapshot {
                    asset_id: &object.asset_id,
                    role: object.role,
                    scale: object.scale,
                    position: object.position,
                    velocity: object.velocity,
                    friction: object.friction,
                    restitution: object.restitution,
                })
                .collect(),
        };
        let contents = ron::ser::to_string_pretty(&snapshot, ron::ser::PrettyConfig::default())
            .map_err(|e| PhysicsError::Serialize(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        log::info!("Saved simulator state to '{}'", path.display());
        Ok(())
    }
}
