//! Per-object visible pixel counts

use serde::Serialize;

use crate::render::SegmentationFrame;

/// Visible pixel counts of one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityRecord {
    /// Raw segmentation index of the object (scene insertion position + 1)
    pub index: u32,
    /// Visible pixels per rendered frame
    pub per_frame: Vec<u64>,
    /// Sum of `per_frame`
    pub total: u64,
}

impl VisibilityRecord {
    /// True if the object covers at least one pixel in at least one frame
    pub fn is_visible(&self) -> bool {
        self.total > 0
    }
}

/// Count, for every raw index `1..=object_count`, the pixels labelled with it
/// in each frame. Indices outside that range are ignored.
pub fn compute_visibility(
    frames: &[SegmentationFrame],
    object_count: usize,
) -> Vec<VisibilityRecord> {
    let mut counts = vec![vec![0_u64; frames.len()]; object_count];
    for (f, frame) in frames.iter().enumerate() {
        for &index in frame.indices() {
            if index == 0 {
                continue;
            }
            if let Some(per_frame) = counts.get_mut(index as usize - 1) {
                per_frame[f] += 1;
            }
        }
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, per_frame)| VisibilityRecord {
            index: i as u32 + 1,
            total: per_frame.iter().sum(),
            per_frame,
        })
        .collect()
}

/// Keep the visible records and order them by descending total. Ties keep
/// their input order.
pub fn rank_visible(records: impl IntoIterator<Item = VisibilityRecord>) -> Vec<VisibilityRecord> {
    let mut visible: Vec<VisibilityRecord> = records
        .into_iter()
        .filter(VisibilityRecord::is_visible)
        .collect();
    visible.sort_by(|a, b| b.total.cmp(&a.total));
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_frame() {
        let frames = vec![
            SegmentationFrame::from_indices(3, 2, vec![0, 1, 1, 2, 0, 7]).unwrap(),
            SegmentationFrame::from_indices(3, 2, vec![2, 2, 2, 1, 0, 0]).unwrap(),
        ];
        let records = compute_visibility(&frames, 3);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].per_frame, vec![2, 1]);
        assert_eq!(records[1].per_frame, vec![1, 3]);
        assert_eq!(records[2].per_frame, vec![0, 0]);
        assert_eq!(records[1].total, 4);
        assert!(!records[2].is_visible());
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let record = |index, total| VisibilityRecord {
            index,
            per_frame: vec![total],
            total,
        };
        let ranked = rank_visible(vec![record(1, 5), record(2, 9), record(3, 0), record(4, 5)]);
        let order: Vec<u32> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 1, 4]);
    }
}
