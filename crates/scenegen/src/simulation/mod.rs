//! Simulation phase controller
//!
//! The physics of a scene runs in two passes with a re-parameterisation in
//! between:
//!
//! ```text
//! Settling ──settle()──► Resetting ──reset()──► Tossing ──toss()──► Done
//!     │                                            │
//!     └──────────── physics error ─────────────────┴──► aborted
//! ```
//!
//! * **Settling** – only static objects exist; they fall and come to rest
//!   over a window that ends at frame 0, before the recorded range.
//! * **Resetting** – velocities are zeroed, the settled objects get calmer
//!   material parameters and the floor gets the configured ones. No time
//!   passes.
//! * **Tossing** – dynamic objects have been added with an initial velocity;
//!   the recorded range (plus one frame) is simulated.
//!
//! Transitions are guarded: calling a phase out of order is an error, and a
//! physics failure leaves the controller aborted with the phase attributed.

use std::fmt;
use std::path::Path;

use crate::error::SceneError;
use crate::physics::{Physics, SimulationOutput};
use crate::scene::{ObjectRole, Scene};

/// Settle window: 100 steps ending at frame 0
pub const SETTLE_WINDOW: (i32, i32) = (-100, 0);

/// Friction given to settled objects
pub const SETTLED_FRICTION: f32 = 0.5;

/// Restitution given to settled objects
pub const SETTLED_RESTITUTION: f32 = 0.5;

/// Phases of the two-pass simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationPhase {
    /// Static objects come to rest before the recorded range
    Settling,
    /// Velocities and materials are reset
    Resetting,
    /// Dynamic objects are simulated over the recorded range
    Tossing,
    /// Terminal state
    Done,
}

impl fmt::Display for SimulationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Settling => "settling",
            Self::Resetting => "resetting",
            Self::Tossing => "tossing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Floor material applied during the reset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorMaterial {
    /// Floor friction
    pub friction: f32,
    /// Floor restitution
    pub restitution: f32,
}

impl Default for FloorMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.5,
        }
    }
}

/// Drives the settle / reset / toss state machine
#[derive(Debug, Clone)]
pub struct SimulationController {
    phase: SimulationPhase,
    aborted_in: Option<SimulationPhase>,
    settle_window: (i32, i32),
    floor: FloorMaterial,
}

impl SimulationController {
    /// Controller in the `Settling` phase
    pub fn new(floor: FloorMaterial) -> Self {
        Self {
            phase: SimulationPhase::Settling,
            aborted_in: None,
            settle_window: SETTLE_WINDOW,
            floor,
        }
    }

    /// Override the settle window
    pub fn with_settle_window(mut self, frame_start: i32, frame_end: i32) -> Self {
        self.settle_window = (frame_start, frame_end);
        self
    }

    /// Current phase
    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Phase the simulation failed in, if it did
    pub fn aborted_in(&self) -> Option<SimulationPhase> {
        self.aborted_in
    }

    /// True while dynamic objects may be added (after the reset)
    pub fn accepts_dynamic_objects(&self) -> bool {
        self.aborted_in.is_none() && self.phase == SimulationPhase::Tossing
    }

    fn enter(&self, requested: SimulationPhase) -> Result<(), SceneError> {
        if let Some(phase) = self.aborted_in {
            return Err(SceneError::Aborted(phase));
        }
        if self.phase != requested {
            return Err(SceneError::PhaseOrder {
                current: self.phase,
                requested,
            });
        }
        Ok(())
    }

    fn fail(&mut self, source: crate::physics::PhysicsError) -> SceneError {
        log::error!("Simulation failed during {}: {}", self.phase, source);
        self.aborted_in = Some(self.phase);
        SceneError::Simulation {
            phase: self.phase,
            source,
        }
    }

    /// Let the static objects come to rest
    pub fn settle(
        &mut self,
        scene: &mut Scene,
        physics: &mut dyn Physics,
    ) -> Result<(), SceneError> {
        self.enter(SimulationPhase::Settling)?;
        if !scene.keys_with_role(ObjectRole::Dynamic).is_empty() {
            return Err(SceneError::Config(
                "dynamic objects must be added after the settle phase".to_string(),
            ));
        }

        let (start, end) = self.settle_window;
        log::info!(
            "Running {} frames of simulation to let static objects settle ...",
            end - start
        );
        physics.run(scene, start, end).map_err(|e| self.fail(e))?;

        self.phase = SimulationPhase::Resetting;
        Ok(())
    }

    /// Stop anything still moving and apply the post-settle materials
    pub fn reset(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        self.enter(SimulationPhase::Resetting)?;

        for key in scene.keys().to_vec() {
            let Some(object) = scene.get_mut(key) else { continue };
            if object.role.is_foreground() {
                object.velocity.fill(0.0);
                object.friction = SETTLED_FRICTION;
                object.restitution = SETTLED_RESTITUTION;
            } else {
                object.friction = self.floor.friction;
                object.restitution = self.floor.restitution;
            }
        }

        self.phase = SimulationPhase::Tossing;
        Ok(())
    }

    /// Simulate the recorded range `[0, frame_end + 1]`.
    ///
    /// Dynamic objects must have been added since [`reset`](Self::reset).
    /// When `save_state` is given the simulator state is persisted there
    /// before stepping.
    pub fn toss(
        &mut self,
        scene: &mut Scene,
        physics: &mut dyn Physics,
        save_state: Option<&Path>,
    ) -> Result<SimulationOutput, SceneError> {
        self.enter(SimulationPhase::Tossing)?;

        if let Some(path) = save_state {
            log::info!(
                "Saving the simulator state to '{}' prior to the simulation.",
                path.display()
            );
            physics.save_state(scene, path).map_err(|e| self.fail(e))?;
        }

        log::info!("Running the simulation ...");
        let output = physics
            .run(scene, 0, scene.frame_end + 1)
            .map_err(|e| self.fail(e))?;
        log::info!(
            "Simulation finished with {} collision events",
            output.collisions.len()
        );

        self.phase = SimulationPhase::Done;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::{PhysicsError, ReferencePhysics};
    use crate::scene::{Aabb, SceneObject};
    use crate::testing::FailingPhysics;

    fn settled_scene() -> Scene {
        let mut scene = Scene::new(1, 6, 12, (32, 32));
        scene.add(
            SceneObject::new("dome", Aabb::from_corners([-40.0, -40.0, 0.0], [40.0, 40.0, 40.0]))
                .with_role(ObjectRole::Background)
                .with_material(1.0, 0.0),
        );
        for (i, height) in [0.5, 3.0, 6.0].iter().enumerate() {
            let bounds = Aabb::from_corners([-0.5; 3], [0.5; 3]);
            let mut object = SceneObject::new(format!("static_{i}"), bounds)
                .with_position(Vec3::new(3.0 * i as f32, 0.0, *height))
                .with_material(0.9 + i as f32, 0.1 * i as f32);
            object.velocity = Vec3::new(1.0, -2.0, 0.5);
            scene.add(object);
        }
        scene
    }

    #[test]
    fn test_reset_zeroes_velocity_and_materials() {
        let mut scene = settled_scene();
        let mut physics = ReferencePhysics::default();
        let mut controller = SimulationController::new(FloorMaterial {
            friction: 0.3,
            restitution: 0.7,
        });

        controller.settle(&mut scene, &mut physics).unwrap();
        assert_eq!(controller.phase(), SimulationPhase::Resetting);
        controller.reset(&mut scene).unwrap();

        for (_, object) in scene.iter() {
            if object.role.is_foreground() {
                assert_eq!(object.velocity, Vec3::zeros());
                assert_eq!(object.friction, SETTLED_FRICTION);
                assert_eq!(object.restitution, SETTLED_RESTITUTION);
            } else {
                assert_eq!(object.friction, 0.3);
                assert_eq!(object.restitution, 0.7);
            }
        }
        assert!(controller.accepts_dynamic_objects());
    }

    #[test]
    fn test_toss_runs_recorded_range_plus_one() {
        let mut scene = settled_scene();
        let mut physics = ReferencePhysics::default();
        let mut controller = SimulationController::new(FloorMaterial::default());
        controller.settle(&mut scene, &mut physics).unwrap();
        controller.reset(&mut scene).unwrap();

        let output = controller.toss(&mut scene, &mut physics, None).unwrap();
        let key = scene.foreground_keys()[0];
        let track = output.animation.get(key).unwrap();
        assert_eq!(track.frame_start, 0);
        assert_eq!(track.len(), 8);
        assert_eq!(controller.phase(), SimulationPhase::Done);
    }

    #[test]
    fn test_phases_must_run_in_order() {
        let mut scene = settled_scene();
        let mut physics = ReferencePhysics::default();
        let mut controller = SimulationController::new(FloorMaterial::default());

        assert!(matches!(
            controller.reset(&mut scene),
            Err(SceneError::PhaseOrder {
                current: SimulationPhase::Settling,
                requested: SimulationPhase::Resetting
            })
        ));
        assert!(matches!(
            controller.toss(&mut scene, &mut physics, None),
            Err(SceneError::PhaseOrder { .. })
        ));
        controller.settle(&mut scene, &mut physics).unwrap();
        assert!(matches!(
            controller.settle(&mut scene, &mut physics),
            Err(SceneError::PhaseOrder { .. })
        ));
    }

    #[test]
    fn test_dynamic_objects_rejected_while_settling() {
        let mut scene = settled_scene();
        scene.add(
            SceneObject::new("thrown", Aabb::from_corners([-0.5; 3], [0.5; 3]))
                .with_role(ObjectRole::Dynamic),
        );
        let mut controller = SimulationController::new(FloorMaterial::default());
        let result = controller.settle(&mut scene, &mut ReferencePhysics::default());
        assert!(matches!(result, Err(SceneError::Config(_))));
    }

    #[test]
    fn test_physics_failure_is_attributed_and_aborts() {
        let mut scene = settled_scene();
        let mut controller = SimulationController::new(FloorMaterial::default());
        let mut physics = FailingPhysics::default();

        let err = controller.settle(&mut scene, &mut physics).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Simulation {
                phase: SimulationPhase::Settling,
                source: PhysicsError::Backend(_)
            }
        ));
        assert_eq!(controller.aborted_in(), Some(SimulationPhase::Settling));
        assert!(matches!(
            controller.reset(&mut scene),
            Err(SceneError::Aborted(SimulationPhase::Settling))
        ));
    }
}
