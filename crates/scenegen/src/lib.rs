//! # Scenegen
//!
//! Synthetic scene generation for multi-view datasets: camera trajectories,
//! collision-free object placement, a two-phase settle / toss simulation and
//! visibility-based postprocessing of the rendered segmentation.
//!
//! ## Features
//!
//! - **Camera paths**: orbit, random look-at, half-shell and fixed novel-view schemes
//! - **Placement**: randomly scaled assets dropped into spawn regions
//! - **Simulation phases**: settle, reset and toss as a guarded state machine
//! - **Postprocessing**: visibility ranking and segmentation remapping
//! - **Collaborators**: physics, renderer, asset source and image output behind traits
//!
//! Every random draw comes from one [`SceneRng`](foundation::rng::SceneRng)
//! passed by `&mut`, so a seed fully determines a scene.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scenegen::prelude::*;
//!
//! let mut rng = SceneRng::seed_from_u64(42);
//! let mut scene = Scene::new(1, 24, 12, (256, 256));
//! let scheme =
//!     TrajectoryScheme::from_name(CameraSchemeName::LinearMovement, (15.0, 20.0), &mut rng);
//! CameraPathGenerator::new(1, 24)
//!     .generate_into(&scheme, &mut scene.camera, &mut rng)
//!     .unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Foundations
pub mod config;
pub mod error;
pub mod foundation;

// Scene model and collaborators
pub mod assets;
pub mod physics;
pub mod render;
pub mod scene;

// Scene generation
pub mod camera_path;
pub mod metadata;
pub mod pipeline;
pub mod placement;
pub mod postprocess;
pub mod simulation;

#[cfg(test)]
mod testing;

pub use error::SceneError;

/// Common imports for scenegen users
pub mod prelude {
    pub use crate::{
        assets::{AssetSource, ManifestAssetSource},
        camera_path::{CameraPathGenerator, CameraSchemeName, TrajectoryScheme},
        config::{Config, GsoConfig, SceneConfig},
        error::SceneError,
        foundation::{
            math::{Quat, Vec3},
            rng::SceneRng,
        },
        physics::{Physics, ReferencePhysics},
        pipeline::{Collaborators, MulticaptureAssets, MulticapturePipeline, NovelViewPipeline},
        placement::{PlacementPlanner, PlacementRequest},
        postprocess::VisibilityPostprocessor,
        render::{ImageWriter, LayerStack, RenderLayers, Renderer},
        scene::{Aabb, ObjectKey, ObjectRole, Scene, SceneObject},
        simulation::{SimulationController, SimulationPhase},
    };
}
