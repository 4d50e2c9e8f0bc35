//! PNG output of layer stacks
//!
//! Writes `rgba_00000.png`, `rgba_00001.png`, … and, when present,
//! `segmentation_00000.png`, … (16-bit grayscale holding the instance index)
//! into one directory, numbered by position in the stack.

use std::path::Path;

use image::{ImageBuffer, Luma, RgbaImage};
use scenegen::render::{ImageWriter, LayerStack, RenderError};

/// Writes every layer of a stack as PNG files
#[derive(Debug, Clone, Copy, Default)]
pub struct PngImageWriter;

impl PngImageWriter {
    /// File name of layer `layer` at stack position `index`
    pub fn file_name(layer: &str, index: usize) -> String {
        format!("{layer}_{index:05}.png")
    }
}

impl ImageWriter for PngImageWriter {
    fn write_image_dict(
        &mut self,
        stack: &LayerStack,
        directory: &Path,
    ) -> Result<(), RenderError> {
        std::fs::create_dir_all(directory)?;

        for (index, frame) in stack.rgba.iter().enumerate() {
            let raw: Vec<u8> = frame.pixels.iter().flatten().copied().collect();
            let image: RgbaImage =
                ImageBuffer::from_raw(frame.width, frame.height, raw).ok_or_else(|| {
                    RenderError::Encode(format!("rgba frame {index} has the wrong size"))
                })?;
            image
                .save(directory.join(Self::file_name("rgba", index)))
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }

        for (index, frame) in stack.segmentation.iter().flatten().enumerate() {
            let raw = frame
                .indices()
                .iter()
                .map(|&label| u16::try_from(label))
                .collect::<Result<Vec<u16>, _>>()
                .map_err(|_| {
                    RenderError::Encode(format!(
                        "segmentation frame {index} exceeds 16-bit indices"
                    ))
                })?;
            let image: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_raw(frame.width(), frame.height(), raw).ok_or_else(|| {
                    RenderError::Encode(format!("segmentation frame {index} has the wrong size"))
                })?;
            image
                .save(directory.join(Self::file_name("segmentation", index)))
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }

        log::info!(
            "Wrote {} frames ({}) to '{}'",
            stack.frames.len(),
            stack.layer_names().join(", "),
            directory.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegen::render::{RgbaFrame, SegmentationFrame};

    #[test]
    fn test_writes_and_reads_back_layers() {
        let directory = std::env::temp_dir().join(format!("challenges_png_{}", std::process::id()));
        let mut segmentation = SegmentationFrame::new(4, 3);
        segmentation.set(2, 1, 7);
        let stack = LayerStack {
            frames: vec![1],
            rgba: vec![RgbaFrame::filled(4, 3, [10, 20, 30, 255])],
            segmentation: Some(vec![segmentation]),
        };

        PngImageWriter.write_image_dict(&stack, &directory).unwrap();

        let rgba = image::open(directory.join("rgba_00000.png")).unwrap().to_rgba8();
        assert_eq!(rgba.dimensions(), (4, 3));
        assert_eq!(rgba.get_pixel(0, 0).0, [10, 20, 30, 255]);

        let labels = image::open(directory.join("segmentation_00000.png")).unwrap().to_luma16();
        assert_eq!(labels.get_pixel(2, 1).0, [7]);
        assert_eq!(labels.get_pixel(0, 0).0, [0]);

        std::fs::remove_dir_all(&directory).ok();
    }

    #[test]
    fn test_file_names_are_zero_padded() {
        assert_eq!(PngImageWriter::file_name("rgba", 3), "rgba_00003.png");
    }
}
