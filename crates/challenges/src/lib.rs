//! Drivers for the multi-capture and GSO novel-view challenge scenes
//!
//! The binaries wire [`scenegen`] to concrete collaborators: the reference
//! box physics, a preview renderer that splats projected bounding boxes, and
//! a PNG image writer.

#![warn(missing_docs)]

pub mod cli;
pub mod image_dict;
pub mod preview;

pub use image_dict::PngImageWriter;
pub use preview::BoxSplatRenderer;
