//! Novel views of one scanned object
//!
//! ```text
//! gso_views --job-dir output/gso/12
//! ```

use anyhow::{Context, Result};
use challenges::cli::{gso_command, gso_config_from_matches};
use challenges::{BoxSplatRenderer, PngImageWriter};
use scenegen::assets::ManifestAssetSource;
use scenegen::foundation::logging;
use scenegen::foundation::rng::SceneRng;
use scenegen::physics::ReferencePhysics;
use scenegen::pipeline::{Collaborators, NovelViewPipeline};

fn main() -> Result<()> {
    logging::init();

    let matches = gso_command().get_matches();
    let config = gso_config_from_matches(&matches)?;

    let mut rng = config.seed.map_or_else(SceneRng::from_entropy, SceneRng::seed_from_u64);
    let gso = ManifestAssetSource::open(&config.gso_assets)
        .with_context(|| format!("Failed to open GSO manifest '{}'", config.gso_assets))?;

    let mut physics = ReferencePhysics::default();
    let mut renderer = BoxSplatRenderer::new();
    let mut writer = PngImageWriter;
    let output = NovelViewPipeline::new(&config, &gso)
        .run(
            Collaborators {
                physics: &mut physics,
                renderer: &mut renderer,
                writer: &mut writer,
            },
            &mut rng,
        )
        .context("Novel-view generation failed")?;

    log::info!(
        "Rendered {} views of '{}' (scale {:.4}) into '{}'",
        output.num_frames,
        output.asset_id,
        output.scale,
        config.job_dir.display()
    );
    Ok(())
}
