//! Novel views of a single scanned object
//!
//! The object is picked by index from the sorted asset ids, scaled so that
//! its largest coordinate sits at `0.3 * 1.3` and rendered (colour only) from
//! the 22 fixed novel-view cameras.

use std::path::PathBuf;

use super::Collaborators;
use crate::assets::AssetSource;
use crate::camera_path::{
    fixed_novel_view_positions, CameraPathGenerator, PoseArchive, TrajectoryScheme,
    ARCHIVE_DISTANCE,
};
use crate::config::GsoConfig;
use crate::error::SceneError;
use crate::foundation::rng::SceneRng;
use crate::metadata::{
    get_camera_info, get_instance_info, get_scene_metadata, write_json, MetadataDocument,
};
use crate::postprocess::{InstanceBoxes, RetainedInstance, VisibilityRecord};
use crate::render::RenderLayers;
use crate::scene::{CameraTrack, PerspectiveCamera, Scene};

/// Camera distance the object is normalised against
pub const VIEW_DISTANCE: f32 = 1.3;

/// Fraction of the view distance the object's extent is scaled to
pub const OBJECT_EXTENT_FRACTION: f32 = 0.30;

/// Ambient light of the novel-view scenes
pub const AMBIENT_ILLUMINATION: [f32; 3] = [0.05, 0.05, 0.05];

/// Views in the stored pose archive
pub const ARCHIVE_VIEWS: usize = 16;

/// Elevation of the stored pose archive, in degrees
pub const ARCHIVE_ELEVATION: f32 = 30.0;

/// What one novel-view run produced
#[derive(Debug, Clone, PartialEq)]
pub struct NovelViewOutput {
    /// Rendered asset
    pub asset_id: String,
    /// Scale applied to the asset
    pub scale: f32,
    /// Number of rendered frames
    pub num_frames: usize,
}

/// Novel-view generator
pub struct NovelViewPipeline<'a> {
    config: &'a GsoConfig,
    gso: &'a dyn AssetSource,
}

impl<'a> NovelViewPipeline<'a> {
    /// Pipeline for `config` drawing from `gso`
    pub fn new(config: &'a GsoConfig, gso: &'a dyn AssetSource) -> Self {
        Self { config, gso }
    }

    /// Output directory
    pub fn output_dir(&self) -> PathBuf {
        self.config.job_dir.clone()
    }

    fn archive(&self) -> Result<PoseArchive, SceneError> {
        match &self.config.pose_archive {
            Some(path) => Ok(PoseArchive::load(path)?),
            None => Ok(PoseArchive::orbit_ring(ARCHIVE_VIEWS, ARCHIVE_ELEVATION, ARCHIVE_DISTANCE)),
        }
    }

    /// Render the selected object from every fixed view
    pub fn run(
        &self,
        collaborators: Collaborators<'_>,
        rng: &mut SceneRng,
    ) -> Result<NovelViewOutput, SceneError> {
        let config = self.config;
        config.validate()?;

        let asset_index = config.resolve_asset_index()?;
        let asset_ids = self.gso.asset_ids();
        let asset_id = asset_ids.get(asset_index).cloned().ok_or_else(|| {
            SceneError::Config(format!(
                "asset index {} is out of range for {} assets",
                asset_index,
                asset_ids.len()
            ))
        })?;

        let mut scene = Scene::new(
            config.frame_start,
            config.frame_end,
            config.frame_rate,
            config.resolution,
        );
        scene.set_metadata("seed", rng.seed());
        scene.ambient_illumination = AMBIENT_ILLUMINATION;

        scene.camera = CameraTrack::new(PerspectiveCamera::default());
        let positions = fixed_novel_view_positions(&self.archive()?);
        CameraPathGenerator::new(config.frame_start, config.frame_end)
            .with_pad(0)
            .generate_into(&TrajectoryScheme::FixedList { positions }, &mut scene.camera, rng)?;

        let unit = self.gso.create(&asset_id, 1.0)?;
        let extent = unit.world_bounds().max_abs_coordinate();
        if extent <= 0.0 {
            return Err(SceneError::Config(format!("asset '{asset_id}' has degenerate bounds")));
        }
        let scale = VIEW_DISTANCE / extent * OBJECT_EXTENT_FRACTION;
        log::info!("Rendering '{}' at scale {}", asset_id, scale);
        let key = scene.add(self.gso.create(&asset_id, scale)?);

        let stack = collaborators.renderer.render(&scene, RenderLayers::RGBA)?;
        stack.validate_resolution(scene.resolution.0, scene.resolution.1)?;
        let directory = self.output_dir();
        collaborators.writer.write_image_dict(&stack, &directory)?;

        let instance = RetainedInstance {
            key,
            visibility: VisibilityRecord {
                index: scene.segmentation_index(key).unwrap_or(1),
                per_frame: Vec::new(),
                total: 0,
            },
            boxes: InstanceBoxes::default(),
        };
        write_json(
            &directory.join("metadata.json"),
            &MetadataDocument {
                flags: None,
                metadata: get_scene_metadata(&scene),
                camera: get_camera_info(&scene),
                instances: get_instance_info(&scene, &[instance], None),
            },
        )?;

        Ok(NovelViewOutput {
            asset_id,
            scale,
            num_frames: stack.frames.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ManifestAssetSource;
    use crate::physics::ReferencePhysics;
    use crate::testing::{MemoryWriter, StripeRenderer};
    use approx::assert_relative_eq;

    #[test]
    fn test_renders_selected_asset_from_22_views() {
        let job_dir = std::env::temp_dir()
            .join(format!("scenegen_gso_{}", std::process::id()))
            .join("3");
        let config = GsoConfig {
            resolution: (16, 16),
            job_dir: job_dir.clone(),
            ..GsoConfig::default()
        };
        let gso = ManifestAssetSource::shapes();
        let mut renderer = StripeRenderer::default();
        let mut writer = MemoryWriter::default();

        let output = NovelViewPipeline::new(&config, &gso)
            .run(
                Collaborators {
                    physics: &mut ReferencePhysics::default(),
                    renderer: &mut renderer,
                    writer: &mut writer,
                },
                &mut SceneRng::seed_from_u64(0),
            )
            .unwrap();

        assert_eq!(output.asset_id, gso.asset_ids()[3]);
        assert_eq!(output.num_frames, 22);
        assert_eq!(renderer.camera_positions.len(), 22);
        for position in &renderer.camera_positions {
            assert_relative_eq!(position.norm(), 1.3, epsilon = 1e-4);
        }
        assert_eq!(writer.layers, vec![vec!["rgba"]]);

        let unit = gso.create(&output.asset_id, 1.0).unwrap();
        let scaled = unit.with_scale(output.scale);
        assert_relative_eq!(scaled.world_bounds().max_abs_coordinate(), 0.39, epsilon = 1e-5);

        let contents = std::fs::read_to_string(job_dir.join("metadata.json")).unwrap();
        let metadata: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(metadata["instances"][0]["asset_id"], output.asset_id.as_str());
        assert!(metadata.get("flags").is_none());

        std::fs::remove_dir_all(job_dir.parent().unwrap()).ok();
    }

    #[test]
    fn test_asset_index_out_of_range() {
        let config = GsoConfig {
            asset_index: Some(400),
            ..GsoConfig::default()
        };
        let gso = ManifestAssetSource::shapes();
        let result = NovelViewPipeline::new(&config, &gso).run(
            Collaborators {
                physics: &mut ReferencePhysics::default(),
                renderer: &mut StripeRenderer::default(),
                writer: &mut MemoryWriter::default(),
            },
            &mut SceneRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(SceneError::Config(_))));
    }
}
