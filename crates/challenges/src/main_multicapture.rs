//! Multi-capture scene generator
//!
//! ```text
//! multicapture --seed 3 --camera linear_movement --job-dir output/scene_3
//! ```

use anyhow::{Context, Result};
use challenges::cli::{multicapture_command, scene_config_from_matches};
use challenges::{BoxSplatRenderer, PngImageWriter};
use scenegen::assets::ManifestAssetSource;
use scenegen::foundation::logging;
use scenegen::foundation::rng::SceneRng;
use scenegen::physics::ReferencePhysics;
use scenegen::pipeline::{Collaborators, MulticaptureAssets, MulticapturePipeline};

fn main() -> Result<()> {
    logging::init();

    let matches = multicapture_command().get_matches();
    let config = scene_config_from_matches(&matches)?;

    let mut rng = config.seed.map_or_else(SceneRng::from_entropy, SceneRng::seed_from_u64);
    log::info!("Generating scene with seed {} into '{}'", rng.seed(), config.job_dir.display());

    let kubasic = ManifestAssetSource::open(&config.kubasic_assets)
        .with_context(|| format!("Failed to open KuBasic manifest '{}'", config.kubasic_assets))?;
    let hdri = ManifestAssetSource::open(&config.hdri_assets)
        .with_context(|| format!("Failed to open HDRI manifest '{}'", config.hdri_assets))?;
    let gso = ManifestAssetSource::open(&config.gso_assets)
        .with_context(|| format!("Failed to open GSO manifest '{}'", config.gso_assets))?;

    let pipeline = MulticapturePipeline::new(
        &config,
        MulticaptureAssets {
            kubasic: &kubasic,
            hdri: &hdri,
            gso: &gso,
        },
    );

    let mut physics = ReferencePhysics::default();
    let mut renderer = BoxSplatRenderer::new();
    let mut writer = PngImageWriter;
    let output = pipeline
        .run(
            Collaborators {
                physics: &mut physics,
                renderer: &mut renderer,
                writer: &mut writer,
            },
            &mut rng,
        )
        .context("Scene generation failed")?;

    log::info!(
        "Done: background {}, {} static + {} dynamic, {} train / {} test instances, {} collisions",
        output.background,
        output.num_static_objects,
        output.num_dynamic_objects,
        output.train.num_instances,
        output.test.num_instances,
        output.train.num_collisions
    );
    Ok(())
}
