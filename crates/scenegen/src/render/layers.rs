//! Per-frame render layers

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::RenderError;

bitflags! {
    /// Layers a render call should produce
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RenderLayers: u32 {
        /// Colour image with alpha
        const RGBA = 1 << 0;
        /// Per-pixel object index
        const SEGMENTATION = 1 << 1;
    }
}

/// Per-pixel object indices of one frame, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationFrame {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl SegmentationFrame {
    /// All-background frame
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Frame from row-major indices; `None` if the length does not match
    pub fn from_indices(width: u32, height: u32, data: Vec<u32>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self { width, height, data })
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Index at pixel `(x, y)`
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Set the index at pixel `(x, y)`; out-of-range pixels are ignored
    pub fn set(&mut self, x: u32, y: u32, index: u32) {
        if x < self.width && y < self.height {
            let offset = y as usize * self.width as usize + x as usize;
            self.data[offset] = index;
        }
    }

    /// Row-major indices
    pub fn indices(&self) -> &[u32] {
        &self.data
    }

    /// Mutable row-major indices
    pub fn indices_mut(&mut self) -> &mut [u32] {
        &mut self.data
    }
}

/// RGBA pixels of one frame, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major pixels
    pub pixels: Vec<[u8; 4]>,
}

impl RgbaFrame {
    /// Frame filled with one colour
    pub fn filled(width: u32, height: u32, colour: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![colour; width as usize * height as usize],
        }
    }
}

/// Layers returned by one render call, one entry per rendered frame
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    /// Frame index of each entry
    pub frames: Vec<i32>,
    /// Colour layer
    pub rgba: Vec<RgbaFrame>,
    /// Segmentation layer, present when requested
    pub segmentation: Option<Vec<SegmentationFrame>>,
}

impl LayerStack {
    /// Names of the layers present, as used for output files
    pub fn layer_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if !self.rgba.is_empty() {
            names.push("rgba");
        }
        if self.segmentation.is_some() {
            names.push("segmentation");
        }
        names
    }

    /// Segmentation layer, or an error if it was not rendered
    pub fn segmentation_mut(&mut self) -> Result<&mut Vec<SegmentationFrame>, RenderError> {
        self.segmentation
            .as_mut()
            .ok_or(RenderError::MissingLayer("segmentation"))
    }

    /// Check every segmentation frame against the scene resolution
    pub fn validate_resolution(&self, width: u32, height: u32) -> Result<(), RenderError> {
        for (frame, seg) in self.segmentation.iter().flatten().enumerate() {
            if seg.width() != width || seg.height() != height {
                return Err(RenderError::FrameSize {
                    frame,
                    width: seg.width(),
                    height: seg.height(),
                    expected_width: width,
                    expected_height: height,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmentation_frame_access() {
        let mut frame = SegmentationFrame::new(4, 3);
        frame.set(3, 2, 7);
        frame.set(9, 9, 1);
        assert_eq!(frame.get(3, 2), Some(7));
        assert_eq!(frame.get(4, 0), None);
        assert_eq!(frame.indices().iter().filter(|i| **i != 0).count(), 1);
        assert!(SegmentationFrame::from_indices(2, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn test_missing_segmentation_layer() {
        let mut stack = LayerStack::default();
        assert!(matches!(stack.segmentation_mut(), Err(RenderError::MissingLayer("segmentation"))));
        assert!(stack.layer_names().is_empty());
    }

    #[test]
    fn test_layer_flags() {
        let layers = RenderLayers::RGBA | RenderLayers::SEGMENTATION;
        assert!(layers.contains(RenderLayers::SEGMENTATION));
        assert!(!RenderLayers::RGBA.contains(RenderLayers::SEGMENTATION));
    }
}
