//! Axis-aligned boxes for spawn regions and object extents

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Axis-Aligned Bounding Box
///
/// Used both for object extents (in asset space or world space) and for the
/// spawn regions that placement samples from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from `[x, y, z]` corner arrays
    pub fn from_corners(min: [f32; 3], max: [f32; 3]) -> Self {
        Self::new(Vec3::from(min), Vec3::from(max))
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Side lengths along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the longest side
    pub fn longest_side(&self) -> f32 {
        self.size().max()
    }

    /// Largest absolute coordinate of either corner
    pub fn max_abs_coordinate(&self) -> f32 {
        self.min.abs().max().max(self.max.abs().max())
    }

    /// Check if this AABB contains a point (inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies completely inside this box, up to `tolerance`
    pub fn contains_box(&self, other: &Aabb, tolerance: f32) -> bool {
        (0..3).all(|axis| {
            other.min[axis] >= self.min[axis] - tolerance
                && other.max[axis] <= self.max[axis] + tolerance
        })
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Per-axis penetration depth, `None` unless the boxes overlap by more
    /// than `tolerance` on every axis. Resting contact is not a penetration.
    pub fn penetration(&self, other: &Aabb, tolerance: f32) -> Option<Vec3> {
        let depth = Vec3::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
            self.max.z.min(other.max.z) - self.min.z.max(other.min.z),
        );
        if depth.iter().all(|d| *d > tolerance) {
            Some(depth)
        } else {
            None
        }
    }

    /// Box moved by `offset`
    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }

    /// Box scaled uniformly about the origin
    pub fn scaled(&self, factor: f32) -> Aabb {
        Aabb::new(self.min * factor, self.max * factor)
    }

    /// The eight corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}
