//! 2D bounding boxes of retained instances

use serde::Serialize;

use crate::render::SegmentationFrame;

/// Image-space boxes of one instance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstanceBoxes {
    /// Positions (0-based) of the frames the instance appears in
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bbox_frames: Vec<usize>,
    /// Normalised `[ymin, xmin, ymax, xmax]`, one per entry of `bbox_frames`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bboxes: Vec<[f32; 4]>,
}

/// Bounding boxes of the instances `1..=num_instances` of remapped frames
pub fn compute_bboxes(frames: &[SegmentationFrame], num_instances: usize) -> Vec<InstanceBoxes> {
    let mut boxes = vec![InstanceBoxes::default(); num_instances];
    for (t, frame) in frames.iter().enumerate() {
        // [ymin, xmin, ymax, xmax] in pixels, per instance
        let mut extents: Vec<Option<[u32; 4]>> = vec![None; num_instances];
        let width = frame.width();
        for (i, &index) in frame.indices().iter().enumerate() {
            if index == 0 || index as usize > num_instances {
                continue;
            }
            let (x, y) = (i as u32 % width, i as u32 / width);
            let extent = &mut extents[index as usize - 1];
            *extent = Some(match *extent {
                None => [y, x, y, x],
                Some([y0, x0, y1, x1]) => [y0.min(y), x0.min(x), y1.max(y), x1.max(x)],
            });
        }

        let (w, h) = (frame.width() as f32, frame.height() as f32);
        for (instance, extent) in boxes.iter_mut().zip(extents) {
            if let Some([y0, x0, y1, x1]) = extent {
                instance.bbox_frames.push(t);
                instance.bboxes.push([
                    y0 as f32 / h,
                    x0 as f32 / w,
                    (y1 + 1) as f32 / h,
                    (x1 + 1) as f32 / w,
                ]);
            }
        }
    }
    boxes
}
