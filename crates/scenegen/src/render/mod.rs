//! Renderer collaborator interface
//!
//! Rendering itself happens outside this crate. The pipeline only needs to
//! ask for a set of layers, get one image per frame back, and hand the result
//! to an [`ImageWriter`]. Segmentation frames are the input of the visibility
//! postprocessor.

mod layers;

pub use layers::{LayerStack, RenderLayers, RgbaFrame, SegmentationFrame};

use std::path::Path;

use thiserror::Error;

use crate::scene::Scene;

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failure reported by the rendering backend
    #[error("render backend error: {0}")]
    Backend(String),

    /// A layer the pipeline depends on was not produced
    #[error("renderer did not produce the '{0}' layer")]
    MissingLayer(&'static str),

    /// Frame dimensions do not match the scene resolution
    #[error("frame {frame} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        /// Offending frame index
        frame: usize,
        /// Actual width
        width: u32,
        /// Actual height
        height: u32,
        /// Scene width
        expected_width: u32,
        /// Scene height
        expected_height: u32,
    },

    /// IO error while writing images or state
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("image encoding error: {0}")]
    Encode(String),
}

/// Renderer collaborator
pub trait Renderer {
    /// Render every frame of the scene, producing the requested layers
    fn render(&mut self, scene: &Scene, layers: RenderLayers) -> Result<LayerStack, RenderError>;

    /// Light the scene with an environment map
    fn set_ambient_light_hdri(&mut self, _filename: &str) -> Result<(), RenderError> {
        Ok(())
    }

    /// Persist the renderer's scene description
    fn save_state(&self, _scene: &Scene, path: &Path) -> Result<(), RenderError> {
        log::warn!("Renderer cannot save state; skipping '{}'", path.display());
        Ok(())
    }
}

/// Output collaborator writing a layer stack to a directory
pub trait ImageWriter {
    /// Write every layer of `stack` below `directory`
    fn write_image_dict(&mut self, stack: &LayerStack, directory: &Path) -> Result<(), RenderError>;
}
