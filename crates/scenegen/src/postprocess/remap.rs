//! Segmentation index remapping

use serde::Serialize;

use super::visibility::VisibilityRecord;
use crate::render::SegmentationFrame;

/// Index of background pixels, before and after remapping
pub const BACKGROUND_INDEX: u32 = 0;

/// Lookup table from raw segmentation indices to visibility ranks.
///
/// The `k`-th ranked object (0-based) gets index `k + 1`; every other index,
/// including those beyond the table, maps to [`BACKGROUND_INDEX`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentationRemap {
    table: Vec<u32>,
    num_instances: usize,
}

impl SegmentationRemap {
    /// Table for `object_count` raw indices and the ranked visible objects
    pub fn new(object_count: usize, ranked: &[VisibilityRecord]) -> Self {
        let mut table = vec![BACKGROUND_INDEX; object_count + 1];
        for (rank, record) in ranked.iter().enumerate() {
            if let Some(slot) = table.get_mut(record.index as usize) {
                *slot = rank as u32 + 1;
            }
        }
        Self {
            table,
            num_instances: ranked.len(),
        }
    }

    /// New index of raw index `index`
    pub fn map(&self, index: u32) -> u32 {
        self.table.get(index as usize).copied().unwrap_or(BACKGROUND_INDEX)
    }

    /// Number of retained instances
    pub fn num_instances(&self) -> usize {
        self.num_instances
    }

    /// Lookup table indexed by raw index
    pub fn table(&self) -> &[u32] {
        &self.table
    }

    /// Rewrite every pixel of every frame
    pub fn apply(&self, frames: &mut [SegmentationFrame]) {
        for frame in frames {
            for index in frame.indices_mut() {
                *index = self.map(*index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_table_maps_to_background() {
        let ranked = vec![VisibilityRecord {
            index: 2,
            per_frame: vec![4],
            total: 4,
        }];
        let remap = SegmentationRemap::new(2, &ranked);
        assert_eq!(remap.map(0), BACKGROUND_INDEX);
        assert_eq!(remap.map(1), BACKGROUND_INDEX);
        assert_eq!(remap.map(2), 1);
        assert_eq!(remap.map(3), BACKGROUND_INDEX);
        assert_eq!(remap.map(u32::MAX), BACKGROUND_INDEX);
        assert_eq!(remap.num_instances(), 1);
    }
}
