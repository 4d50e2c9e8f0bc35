//! # Visibility Postprocessor
//!
//! Turns the raw segmentation output of the renderer into instance
//! segmentation: counts visible pixels per object, drops objects that are
//! never seen, ranks the rest by visibility and rewrites every pixel so that
//! instance `k` (1-based) is the `k`-th most visible object.
//!
//! Postprocessing a scene where nothing is visible is valid: every pixel
//! becomes background and the instance list is empty.

mod bboxes;
mod remap;
mod visibility;

pub use bboxes::{compute_bboxes, InstanceBoxes};
pub use remap::{SegmentationRemap, BACKGROUND_INDEX};
pub use visibility::{compute_visibility, rank_visible, VisibilityRecord};

use crate::error::SceneError;
use crate::render::LayerStack;
use crate::scene::{ObjectKey, Scene};

/// A visible foreground object after ranking
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedInstance {
    /// Object in the scene arena
    pub key: ObjectKey,
    /// Visible pixels per frame and in total
    pub visibility: VisibilityRecord,
    /// 2D boxes in the remapped segmentation
    pub boxes: InstanceBoxes,
}

/// Result of postprocessing one render
#[derive(Debug, Clone, PartialEq)]
pub struct PostprocessOutput {
    /// Retained instances, most visible first
    pub instances: Vec<RetainedInstance>,
    /// Remap that was applied to the segmentation layer
    pub remap: SegmentationRemap,
}

impl PostprocessOutput {
    /// Keys of the retained instances in rank order
    pub fn keys(&self) -> Vec<ObjectKey> {
        self.instances.iter().map(|instance| instance.key).collect()
    }
}

/// Scene-level visibility postprocessing
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityPostprocessor;

impl VisibilityPostprocessor {
    /// Rank the visible foreground objects of `scene`, remap the segmentation
    /// layer of `stack` in place and compute instance boxes.
    ///
    /// Per-frame visibility is also written to every object's metadata, and
    /// the instance count to the scene metadata.
    pub fn process(
        &self,
        scene: &mut Scene,
        stack: &mut LayerStack,
    ) -> Result<PostprocessOutput, SceneError> {
        let frames = stack.segmentation_mut()?;
        let records = compute_visibility(frames, scene.len());

        for record in &records {
            if let Some(object) = scene
                .key_for_segmentation_index(record.index)
                .and_then(|key| scene.get_mut(key))
            {
                object.set_metadata("visibility", record.per_frame.clone());
            }
        }

        let foreground = records.into_iter().filter(|record| {
            scene
                .key_for_segmentation_index(record.index)
                .and_then(|key| scene.get(key))
                .is_some_and(|object| object.role.is_foreground())
        });
        let ranked = rank_visible(foreground);

        let remap = SegmentationRemap::new(scene.len(), &ranked);
        remap.apply(frames);
        let boxes = compute_bboxes(frames, ranked.len());

        let instances: Vec<RetainedInstance> = ranked
            .into_iter()
            .zip(boxes)
            .filter_map(|(visibility, boxes)| {
                let key = scene.key_for_segmentation_index(visibility.index)?;
                Some(RetainedInstance { key, visibility, boxes })
            })
            .collect();

        log::info!(
            "{} of {} foreground objects are visible",
            instances.len(),
            scene.foreground_keys().len()
        );
        scene.set_metadata("num_instances", instances.len());

        Ok(PostprocessOutput { instances, remap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RgbaFrame, SegmentationFrame};
    use crate::scene::{Aabb, ObjectRole, SceneObject};

    fn scene_with(count: usize) -> Scene {
        let mut scene = Scene::new(1, 2, 12, (20, 10));
        for i in 0..count {
            let bounds = Aabb::from_corners([-0.5; 3], [0.5; 3]);
            scene.add(SceneObject::new(format!("object_{}", i + 1), bounds));
        }
        scene
    }

    /// Two frames of 20x10 pixels with `totals[i]` pixels labelled `i + 1`
    fn stack_with(totals: &[usize]) -> LayerStack {
        let mut labels: Vec<u32> = totals
            .iter()
            .enumerate()
            .flat_map(|(i, &n)| std::iter::repeat(i as u32 + 1).take(n))
            .collect();
        labels.resize(400, 0);
        let frames = labels
            .chunks(200)
            .map(|chunk| SegmentationFrame::from_indices(20, 10, chunk.to_vec()).unwrap())
            .collect();
        LayerStack {
            frames: vec![1, 2],
            rgba: vec![RgbaFrame::filled(20, 10, [0, 0, 0, 255]); 2],
            segmentation: Some(frames),
        }
    }

    fn labels(stack: &LayerStack) -> Vec<u32> {
        stack
            .segmentation
            .as_ref()
            .unwrap()
            .iter()
            .flat_map(|frame| frame.indices().to_vec())
            .collect()
    }

    #[test]
    fn test_drops_invisible_and_ranks_by_total() {
        let mut scene = scene_with(3);
        let mut stack = stack_with(&[50, 0, 120]);
        let before = labels(&stack);

        let output = VisibilityPostprocessor.process(&mut scene, &mut stack).unwrap();
        let keys = scene.keys().to_vec();
        assert_eq!(output.keys(), vec![keys[2], keys[0]]);
        assert_eq!(output.instances[0].visibility.total, 120);
        assert_eq!(output.instances[1].visibility.total, 50);

        let after = labels(&stack);
        for (raw, new) in before.iter().zip(&after) {
            let expected = match raw {
                3 => 1,
                1 => 2,
                _ => 0,
            };
            assert_eq!(*new, expected);
        }
        assert_eq!(scene.metadata["num_instances"], 2);
        assert_eq!(scene.get(keys[1]).unwrap().metadata["visibility"], serde_json::json!([0, 0]));
    }

    #[test]
    fn test_postprocessing_remapped_output_is_identity() {
        let mut scene = scene_with(4);
        let mut stack = stack_with(&[30, 90, 0, 30]);
        VisibilityPostprocessor.process(&mut scene, &mut stack).unwrap();
        let once = labels(&stack);

        let second = VisibilityPostprocessor.process(&mut scene, &mut stack).unwrap();
        assert_eq!(labels(&stack), once);
        for rank in 1..=second.remap.num_instances() as u32 {
            assert_eq!(second.remap.map(rank), rank);
        }
    }

    #[test]
    fn test_nothing_visible_yields_background() {
        let mut scene = scene_with(2);
        let mut stack = stack_with(&[]);
        let output = VisibilityPostprocessor.process(&mut scene, &mut stack).unwrap();
        assert!(output.instances.is_empty());
        assert!(labels(&stack).iter().all(|&index| index == BACKGROUND_INDEX));
        assert_eq!(scene.metadata["num_instances"], 0);
    }

    #[test]
    fn test_background_object_is_never_an_instance() {
        let mut scene = scene_with(0);
        scene.add(
            SceneObject::new("dome", Aabb::from_corners([-40.0, -40.0, 0.0], [40.0, 40.0, 40.0]))
                .with_role(ObjectRole::Background),
        );
        scene.add(SceneObject::new("object", Aabb::from_corners([-0.5; 3], [0.5; 3])));
        let mut stack = stack_with(&[300, 10]);

        let output = VisibilityPostprocessor.process(&mut scene, &mut stack).unwrap();
        assert_eq!(output.instances.len(), 1);
        assert_eq!(output.instances[0].visibility.index, 2);
        assert_eq!(labels(&stack).iter().filter(|&&i| i == 1).count(), 10);
    }

    #[test]
    fn test_missing_segmentation_layer_is_an_error() {
        let mut scene = scene_with(1);
        let mut stack = stack_with(&[5]);
        stack.segmentation = None;
        assert!(matches!(
            VisibilityPostprocessor.process(&mut scene, &mut stack),
            Err(SceneError::Render(_))
        ));
    }
}
