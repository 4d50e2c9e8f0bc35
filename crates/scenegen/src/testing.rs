//! Fake collaborators shared by the unit tests

use std::path::{Path, PathBuf};

use crate::foundation::math::Vec3;
use crate::foundation::rng::SceneRng;
use crate::physics::{Physics, PhysicsError, SimulationOutput};
use crate::render::{
    ImageWriter, LayerStack, RenderError, RenderLayers, Renderer, RgbaFrame, SegmentationFrame,
};
use crate::scene::{Aabb, ObjectKey, Scene};

/// Forwards to `inner` and counts the calls
pub struct CountingPhysics<P> {
    pub inner: P,
    pub placements: usize,
    pub runs: Vec<(i32, i32)>,
}

impl<P: Physics> CountingPhysics<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            placements: 0,
            runs: Vec::new(),
        }
    }
}

impl<P: Physics> Physics for CountingPhysics<P> {
    fn move_until_no_overlap(
        &mut self,
        scene: &mut Scene,
        key: ObjectKey,
        spawn_region: &Aabb,
        rng: &mut SceneRng,
    ) -> Result<Vec3, PhysicsError> {
        self.placements += 1;
        self.inner.move_until_no_overlap(scene, key, spawn_region, rng)
    }

    fn run(
        &mut self,
        scene: &mut Scene,
        frame_start: i32,
        frame_end: i32,
    ) -> Result<SimulationOutput, PhysicsError> {
        self.runs.push((frame_start, frame_end));
        self.inner.run(scene, frame_start, frame_end)
    }
}

/// Places objects at the centre of the region and fails every simulation run
#[derive(Default)]
pub struct FailingPhysics;

impl Physics for FailingPhysics {
    fn move_until_no_overlap(
        &mut self,
        scene: &mut Scene,
        key: ObjectKey,
        spawn_region: &Aabb,
        _rng: &mut SceneRng,
    ) -> Result<Vec3, PhysicsError> {
        let object = scene.get_mut(key).ok_or(PhysicsError::UnknownObject)?;
        object.position = spawn_region.center();
        Ok(object.position)
    }

    fn run(
        &mut self,
        _scene: &mut Scene,
        _frame_start: i32,
        _frame_end: i32,
    ) -> Result<SimulationOutput, PhysicsError> {
        Err(PhysicsError::Backend("solver did not converge".to_string()))
    }
}

/// Paints `3 * index` pixels for every foreground object, in insertion order
#[derive(Default)]
pub struct StripeRenderer {
    pub hdri: Option<String>,
    pub camera_positions: Vec<Vec3>,
}

impl Renderer for StripeRenderer {
    fn render(&mut self, scene: &Scene, layers: RenderLayers) -> Result<LayerStack, RenderError> {
        let (width, height) = scene.resolution;
        let mut stack = LayerStack::default();
        let mut segmentation = Vec::new();
        for frame in scene.frames() {
            let pose = scene
                .camera
                .pose_at(frame)
                .ok_or_else(|| RenderError::Backend(format!("no camera at frame {frame}")))?;
            self.camera_positions.push(pose.position);

            let mut labels = Vec::with_capacity((width * height) as usize);
            for key in scene.foreground_keys() {
                let index = scene.segmentation_index(key).unwrap_or(0);
                labels.extend(std::iter::repeat(index).take(3 * index as usize));
            }
            labels.resize((width * height) as usize, 0);

            stack.frames.push(frame);
            stack.rgba.push(RgbaFrame::filled(width, height, [128, 128, 128, 255]));
            let indices = SegmentationFrame::from_indices(width, height, labels)
                .ok_or_else(|| RenderError::Backend("frame too small".to_string()))?;
            segmentation.push(indices);
        }
        if layers.contains(RenderLayers::SEGMENTATION) {
            stack.segmentation = Some(segmentation);
        }
        Ok(stack)
    }

    fn set_ambient_light_hdri(&mut self, filename: &str) -> Result<(), RenderError> {
        self.hdri = Some(filename.to_string());
        Ok(())
    }
}

/// Records the directories it was asked to write to
#[derive(Default)]
pub struct MemoryWriter {
    pub directories: Vec<PathBuf>,
    pub layers: Vec<Vec<&'static str>>,
}

impl ImageWriter for MemoryWriter {
    fn write_image_dict(
        &mut self,
        stack: &LayerStack,
        directory: &Path,
    ) -> Result<(), RenderError> {
        self.directories.push(directory.to_path_buf());
        self.layers.push(stack.layer_names());
        Ok(())
    }
}
