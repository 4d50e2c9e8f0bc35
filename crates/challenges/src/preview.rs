//! Preview renderer
//!
//! Splats the projected bounding box of every foreground object into the
//! colour and segmentation layers, farthest object first. Good enough to
//! check camera paths, placement and the postprocessing end to end without
//! a path tracer.

use nalgebra::Vector2;
use scenegen::foundation::math::Vec3;
use scenegen::render::{
    LayerStack, RenderError, RenderLayers, Renderer, RgbaFrame, SegmentationFrame,
};
use scenegen::scene::{CameraPose, ObjectKey, Scene};

/// Colour of pixels not covered by any object
pub const SKY: [u8; 4] = [135, 170, 205, 255];

/// Colours cycled through by segmentation index
const PALETTE: [[u8; 3]; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

/// Renderer that draws screen-space bounding boxes
#[derive(Debug, Clone, Default)]
pub struct BoxSplatRenderer {
    hdri: Option<String>,
}

impl BoxSplatRenderer {
    /// New preview renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment map set by the scene, if any
    pub fn hdri(&self) -> Option<&str> {
        self.hdri.as_deref()
    }

    /// Pixel rectangle `(x0, y0, x1, y1)` covered by `key` at `frame`, both
    /// ends inclusive, with its distance to the camera
    fn footprint(
        scene: &Scene,
        key: ObjectKey,
        frame: i32,
        pose: &CameraPose,
    ) -> Option<(f32, [u32; 4])> {
        let object = scene.get(key)?;
        let (width, height) = scene.resolution;
        let aspect = width as f32 / height as f32;
        let bounds = object.world_bounds_at(frame);

        let mut low = Vector2::new(f32::INFINITY, f32::INFINITY);
        let mut high = Vector2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for corner in bounds.corners() {
            let [x, y] = scene.camera.camera.project(pose, corner, aspect)?;
            let pixel = Vector2::new(x * width as f32, y * height as f32);
            low = low.inf(&pixel);
            high = high.sup(&pixel);
        }

        if high.x < 0.0 || high.y < 0.0 || low.x >= width as f32 || low.y >= height as f32 {
            return None;
        }
        let clamp = |value: f32, size: u32| value.clamp(0.0, (size - 1) as f32) as u32;
        let depth = (bounds.center() - pose.position).norm();
        Some((
            depth,
            [
                clamp(low.x, width),
                clamp(low.y, height),
                clamp(high.x, width),
                clamp(high.y, height),
            ],
        ))
    }
}

/// Shade a palette colour by the distance to the camera
fn shade(index: u32, depth: f32) -> [u8; 4] {
    let base = PALETTE[index as usize % PALETTE.len()];
    let light = (1.5 - depth / 40.0).clamp(0.4, 1.0);
    [
        (f32::from(base[0]) * light) as u8,
        (f32::from(base[1]) * light) as u8,
        (f32::from(base[2]) * light) as u8,
        255,
    ]
}

impl Renderer for BoxSplatRenderer {
    fn render(&mut self, scene: &Scene, layers: RenderLayers) -> Result<LayerStack, RenderError> {
        let (width, height) = scene.resolution;
        if width == 0 || height == 0 {
            return Err(RenderError::Backend(format!("cannot render at {width}x{height}")));
        }
        log::info!("Rendering {} frames at {}x{}", scene.num_frames(), width, height);

        let mut stack = LayerStack::default();
        let mut segmentation = Vec::with_capacity(scene.num_frames());
        for frame in scene.frames() {
            let pose = scene
                .camera
                .pose_at(frame)
                .ok_or_else(|| {
                    RenderError::Backend(format!("camera has no keyframe at frame {frame}"))
                })?;

            let mut splats: Vec<(f32, u32, [u32; 4])> = scene
                .foreground_keys()
                .into_iter()
                .filter_map(|key| {
                    let index = scene.segmentation_index(key)?;
                    let (depth, rect) = Self::footprint(scene, key, frame, &pose)?;
                    Some((depth, index, rect))
                })
                .collect();
            // painter's order: far to near
            splats.sort_by(|a, b| b.0.total_cmp(&a.0));

            let mut rgba = RgbaFrame::filled(width, height, SKY);
            let mut labels = SegmentationFrame::new(width, height);
            for (depth, index, [x0, y0, x1, y1]) in splats {
                let colour = shade(index, depth);
                for y in y0..=y1 {
                    for x in x0..=x1 {
                        labels.set(x, y, index);
                        rgba.pixels[(y * width + x) as usize] = colour;
                    }
                }
            }

            stack.frames.push(frame);
            stack.rgba.push(rgba);
            segmentation.push(labels);
        }

        if layers.contains(RenderLayers::SEGMENTATION) {
            stack.segmentation = Some(segmentation);
        }
        Ok(stack)
    }

    fn set_ambient_light_hdri(&mut self, filename: &str) -> Result<(), RenderError> {
        log::debug!("Preview renderer ignores the environment map '{}'", filename);
        self.hdri = Some(filename.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegen::scene::{Aabb, ObjectRole, SceneObject};

    fn scene() -> Scene {
        let mut scene = Scene::new(1, 2, 12, (64, 48));
        scene.add(
            SceneObject::new("dome", Aabb::from_corners([-40.0, -40.0, 0.0], [40.0, 40.0, 40.0]))
                .with_role(ObjectRole::Background),
        );
        for (name, x) in [("near", 2.0), ("far", -3.0), ("behind", 30.0)] {
            scene.add(
                SceneObject::new(name, Aabb::from_corners([-0.5; 3], [0.5; 3]))
                    .with_position(Vec3::new(x, 0.0, 0.5)),
            );
        }
        for frame in 1..=2 {
            let eye = Vec3::new(12.0, 0.0, 3.0);
            scene
                .camera
                .insert_pose(&CameraPose::looking_at(frame, eye, Vec3::zeros()));
        }
        scene
    }

    #[test]
    fn test_nearer_object_wins_overlap() {
        let scene = scene();
        let stack = BoxSplatRenderer::new()
            .render(&scene, RenderLayers::RGBA | RenderLayers::SEGMENTATION)
            .unwrap();
        assert_eq!(stack.frames, vec![1, 2]);
        let frame = &stack.segmentation.as_ref().unwrap()[0];
        let labels = frame.indices();

        // the dome is never drawn, the object behind the camera neither
        assert!(!labels.contains(&1));
        assert!(!labels.contains(&4));
        // both boxes straddle the image centre, the near one is on top
        assert_eq!(frame.get(32, 24), Some(2));
        assert!(labels.contains(&3));
        assert_eq!(stack.rgba[0].pixels[0], SKY);
    }

    #[test]
    fn test_rgba_only_has_no_segmentation() {
        let stack = BoxSplatRenderer::new().render(&scene(), RenderLayers::RGBA).unwrap();
        assert!(stack.segmentation.is_none());
        assert_eq!(stack.rgba.len(), 2);
    }

    #[test]
    fn test_missing_camera_keyframe_is_an_error() {
        let mut scene = scene();
        scene.camera.clear();
        assert!(BoxSplatRenderer::new().render(&scene, RenderLayers::RGBA).is_err());
    }
}
