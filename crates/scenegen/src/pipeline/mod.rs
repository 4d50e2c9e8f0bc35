//! # Scene Pipelines
//!
//! End-to-end generation of one scene, wiring the core components to the
//! collaborators:
//!
//! - [`multicapture`]: static distractors settle, dynamic objects are
//!   tossed, the scene is rendered once along the training camera and once
//!   along a held-out test camera
//! - [`novel_view`]: a single scanned object rendered from 22 fixed views

pub mod multicapture;
pub mod novel_view;

pub use multicapture::{MulticaptureAssets, MulticaptureOutput, MulticapturePipeline};
pub use novel_view::{NovelViewOutput, NovelViewPipeline};

use std::path::Path;

use crate::error::SceneError;
use crate::metadata::{
    get_camera_info, get_instance_info, get_scene_metadata, process_collisions, write_json,
    EventsDocument, MetadataDocument,
};
use crate::physics::{AnimationTrace, CollisionEvent, Physics};
use crate::postprocess::{PostprocessOutput, VisibilityPostprocessor};
use crate::render::{ImageWriter, RenderLayers, Renderer};
use crate::scene::Scene;

/// The collaborators a pipeline drives
pub struct Collaborators<'a> {
    /// Physics engine
    pub physics: &'a mut dyn Physics,
    /// Renderer
    pub renderer: &'a mut dyn Renderer,
    /// Image output
    pub writer: &'a mut dyn ImageWriter,
}

/// Summary of one rendered view set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    /// Number of rendered frames
    pub num_frames: usize,
    /// Number of retained instances
    pub num_instances: usize,
    /// Number of collision events written
    pub num_collisions: usize,
}

/// Render `scene` with segmentation, postprocess, and write images plus
/// `metadata.json` / `events.json` below `directory`.
pub(crate) fn render_and_write(
    scene: &mut Scene,
    collaborators: &mut Collaborators<'_>,
    flags: &serde_json::Value,
    animation: &AnimationTrace,
    collisions: &[CollisionEvent],
    directory: &Path,
) -> Result<RenderSummary, SceneError> {
    scene.camera.validate()?;
    let mut stack = collaborators
        .renderer
        .render(scene, RenderLayers::RGBA | RenderLayers::SEGMENTATION)?;
    stack.validate_resolution(scene.resolution.0, scene.resolution.1)?;

    let PostprocessOutput { instances, .. } = VisibilityPostprocessor.process(scene, &mut stack)?;

    collaborators.writer.write_image_dict(&stack, directory)?;

    log::info!("Collecting and storing metadata for each object.");
    let keys: Vec<_> = instances.iter().map(|instance| instance.key).collect();
    write_json(
        &directory.join("metadata.json"),
        &MetadataDocument {
            flags: Some(flags.clone()),
            metadata: get_scene_metadata(scene),
            camera: get_camera_info(scene),
            instances: get_instance_info(scene, &instances, Some(animation)),
        },
    )?;
    let events = EventsDocument {
        collisions: process_collisions(collisions, scene, &keys),
    };
    write_json(&directory.join("events.json"), &events)?;

    Ok(RenderSummary {
        num_frames: stack.frames.len(),
        num_instances: instances.len(),
        num_collisions: events.collisions.len(),
    })
}
