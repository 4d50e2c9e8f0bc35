//! Multi-capture scene: settle, toss, then render a training and a held-out
//! test camera over the same simulated motion.

use std::path::PathBuf;

use super::{render_and_write, Collaborators, RenderSummary};
use crate::assets::AssetSource;
use crate::camera_path::{CameraPathGenerator, CameraSchemeName, OrbitParams, TrajectoryScheme};
use crate::config::challenge::TEST_SPLIT_FRACTION;
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::foundation::rng::SceneRng;
use crate::placement::{sample_object_count, PlacementPlanner, PlacementRequest};
use crate::scene::{CameraTrack, ObjectRole, PerspectiveCamera, Scene};
use crate::simulation::{FloorMaterial, SimulationController};

/// Asset collections used by the multi-capture scene
pub struct MulticaptureAssets<'a> {
    /// Basic shapes; must contain the `dome`
    pub kubasic: &'a dyn AssetSource,
    /// Background environment maps
    pub hdri: &'a dyn AssetSource,
    /// Scanned objects
    pub gso: &'a dyn AssetSource,
}

/// What one multi-capture run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticaptureOutput {
    /// Background HDRI id
    pub background: String,
    /// Number of static objects placed
    pub num_static_objects: usize,
    /// Number of dynamic objects placed
    pub num_dynamic_objects: usize,
    /// Training view set
    pub train: RenderSummary,
    /// Held-out view set
    pub test: RenderSummary,
}

/// Multi-capture scene generator
pub struct MulticapturePipeline<'a> {
    config: &'a SceneConfig,
    assets: MulticaptureAssets<'a>,
    planner: PlacementPlanner,
}

impl<'a> MulticapturePipeline<'a> {
    /// Pipeline for `config` drawing from `assets`
    pub fn new(config: &'a SceneConfig, assets: MulticaptureAssets<'a>) -> Self {
        Self {
            config,
            assets,
            planner: PlacementPlanner::default(),
        }
    }

    /// Output directory of the training views
    pub fn train_dir(&self) -> PathBuf {
        self.config.job_dir.join("train")
    }

    /// Output directory of the held-out views
    pub fn test_dir(&self) -> PathBuf {
        self.config.job_dir.join("test")
    }

    /// Generate, simulate, render and write one scene
    pub fn run(
        &self,
        mut collaborators: Collaborators<'_>,
        rng: &mut SceneRng,
    ) -> Result<MulticaptureOutput, SceneError> {
        let config = self.config;
        config.validate()?;

        // Configuration errors surface before anything is drawn
        let (train_backgrounds, test_backgrounds) =
            self.assets.hdri.get_test_split(TEST_SPLIT_FRACTION);
        let backgrounds = config.backgrounds_split.select(train_backgrounds, test_backgrounds);
        let (train_objects, test_objects) = self.assets.gso.get_test_split(TEST_SPLIT_FRACTION);
        let active_split = config.objects_split.select(train_objects, test_objects);
        if active_split.is_empty() {
            return Err(SceneError::Config(format!(
                "the {:?} split of '{}' is empty",
                config.objects_split,
                self.assets.gso.name()
            )));
        }

        let mut scene = Scene::new(
            config.frame_start,
            config.frame_end,
            config.frame_rate,
            config.resolution,
        );
        scene.set_metadata("seed", rng.seed());

        let motion_blur = rng.uniform(0.0, config.max_motion_blur);
        if motion_blur > 0.0 {
            log::info!("Using motion blur strength {}", motion_blur);
        }
        scene.set_metadata("motion_blur", f64::from(motion_blur));

        // Background
        log::info!(
            "Choosing one of the {} {:?} backgrounds...",
            backgrounds.len(),
            config.backgrounds_split
        );
        let hdri_id = rng.choose(&backgrounds).cloned().ok_or_else(|| {
            SceneError::Config(format!(
                "no {:?} backgrounds to choose from",
                config.backgrounds_split
            ))
        })?;
        let filename = self
            .assets
            .hdri
            .record(&hdri_id)
            .and_then(|record| record.filename.clone())
            .unwrap_or_else(|| hdri_id.clone());
        log::info!("Using background {}", hdri_id);
        scene.set_metadata("background", hdri_id.as_str());
        collaborators.renderer.set_ambient_light_hdri(&filename)?;

        // Dome
        let dome = self
            .assets
            .kubasic
            .create("dome", 1.0)?
            .with_role(ObjectRole::Background)
            .with_material(1.0, 0.0);
        scene.add(dome);

        // Camera
        log::info!("Setting up the Camera...");
        scene.camera = CameraTrack::new(PerspectiveCamera::default());
        let generator = CameraPathGenerator::new(config.frame_start, config.frame_end);
        let train_scheme = TrajectoryScheme::from_name(config.camera, config.radius_range(), rng);
        generator.generate_into(&train_scheme, &mut scene.camera, rng)?;

        // Static objects, settled before the recorded range
        let mut controller = SimulationController::new(FloorMaterial {
            friction: config.floor_friction,
            restitution: config.floor_restitution,
        });
        let num_static_objects =
            sample_object_count(rng, config.min_num_static_objects, config.max_num_static_objects);
        self.planner.place(
            &mut scene,
            &PlacementRequest::statics(num_static_objects),
            &active_split,
            self.assets.gso,
            collaborators.physics,
            rng,
        )?;
        controller.settle(&mut scene, collaborators.physics)?;
        controller.reset(&mut scene)?;

        // Dynamic objects
        let num_dynamic_objects = sample_object_count(
            rng,
            config.min_num_dynamic_objects,
            config.max_num_dynamic_objects,
        );
        self.planner.place(
            &mut scene,
            &PlacementRequest::dynamics(num_dynamic_objects),
            &active_split,
            self.assets.gso,
            collaborators.physics,
            rng,
        )?;

        let physics_state = config.save_state.then(|| config.job_dir.join("scene.physics.ron"));
        let simulation =
            controller.toss(&mut scene, collaborators.physics, physics_state.as_deref())?;

        if config.save_state {
            let path = config.job_dir.join("scene.renderer.ron");
            log::info!("Saving the renderer state to '{}'", path.display());
            collaborators.renderer.save_state(&scene, &path)?;
        }

        let flags = serde_json::to_value(config).map_err(|e| SceneError::Config(e.to_string()))?;

        log::info!("Rendering the train scene ...");
        let train = render_and_write(
            &mut scene,
            &mut collaborators,
            &flags,
            &simulation.animation,
            &simulation.collisions,
            &self.train_dir(),
        )?;

        // Held-out views: random azimuth per frame at the training elevation
        // and distance, then overwritten by half-shell samples
        scene.camera = CameraTrack::new(PerspectiveCamera::default());
        let (phi, radius) = train_scheme.orbit_shape().unwrap_or_else(|| {
            let orbit = OrbitParams::sample(rng, config.radius_range());
            (orbit.phi, orbit.radius)
        });
        let lookat = TrajectoryScheme::RandomLookat { phi, radius };
        generator.generate_into(&lookat, &mut scene.camera, rng)?;
        let shell = TrajectoryScheme::from_name(
            CameraSchemeName::HalfSphereShell,
            config.radius_range(),
            rng,
        );
        generator.generate_into(&shell, &mut scene.camera, rng)?;

        log::info!("Rendering the test scene ...");
        let test = render_and_write(
            &mut scene,
            &mut collaborators,
            &flags,
            &simulation.animation,
            &simulation.collisions,
            &self.test_dir(),
        )?;

        Ok(MulticaptureOutput {
            background: hdri_id,
            num_static_objects,
            num_dynamic_objects,
            train,
            test,
        })
    }
}
