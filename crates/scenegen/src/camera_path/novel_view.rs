//! Fixed novel-view camera list
//!
//! The object-centric novel-view renders use 22 fixed cameras: the 16 poses
//! of a stored pose archive, rescaled, followed by 6 azimuth/elevation views.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::sampling::spherical_to_cartesian;
use crate::config::ConfigError;
use crate::foundation::math::utils::deg_to_rad;
use crate::foundation::math::{look_at_rotation, world_up, Mat3, Vec3};

/// Distance of the archived cameras from the origin
pub const ARCHIVE_DISTANCE: f32 = 1.5;

/// Distance the archived cameras are rescaled to
pub const NOVEL_VIEW_DISTANCE: f32 = 1.3;

/// Azimuths (degrees) of the extra views
pub const EXTRA_VIEW_AZIMUTHS: [f32; 6] = [30.0, 90.0, 150.0, 210.0, 270.0, 330.0];

/// Elevations (degrees) of the extra views
pub const EXTRA_VIEW_ELEVATIONS: [f32; 6] = [30.0, -20.0, 30.0, -20.0, 30.0, -20.0];

/// World-to-camera matrix, 3 rows of `[R | t]`
pub type PoseMatrix = [[f32; 4]; 3];

/// Archive of world-to-camera poses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseArchive {
    /// One `3x4` world-to-camera matrix per view
    pub poses: Vec<PoseMatrix>,
}

impl PoseArchive {
    /// Load an archive from a `.json` or `.ron` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// `count` cameras evenly spaced in azimuth at a fixed elevation and
    /// distance, all facing the origin. This is the layout of the stored
    /// 16-view archive and is used when no archive file is given.
    pub fn orbit_ring(count: usize, elevation_deg: f32, distance: f32) -> Self {
        let poses = (0..count)
            .map(|i| {
                let azimuth = i as f32 * 360.0 / count as f32;
                let elevation = deg_to_rad(elevation_deg);
                let eye = spherical_to_cartesian(deg_to_rad(azimuth), elevation, distance);
                world_to_camera(eye)
            })
            .collect();
        Self { poses }
    }

    /// Number of poses
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// True when the archive holds no pose
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Camera centres: translation of the inverted world-to-camera matrices
    pub fn camera_centres(&self) -> Vec<Vec3> {
        self.poses
            .iter()
            .map(|m| {
                let rotation = Mat3::new(
                    m[0][0], m[0][1], m[0][2],
                    m[1][0], m[1][1], m[1][2],
                    m[2][0], m[2][1], m[2][2],
                );
                let translation = Vec3::new(m[0][3], m[1][3], m[2][3]);
                -(rotation.transpose() * translation)
            })
            .collect()
    }
}

fn world_to_camera(eye: Vec3) -> PoseMatrix {
    let camera_to_world = look_at_rotation(eye, Vec3::zeros(), world_up()).to_rotation_matrix();
    let rotation = camera_to_world.matrix().transpose();
    let translation = -(rotation * eye);
    let mut matrix = [[0.0; 4]; 3];
    for (r, row) in matrix.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().take(3).enumerate() {
            *value = rotation[(r, c)];
        }
        row[3] = translation[r];
    }
    matrix
}

/// The 6 extra azimuth/elevation views at the novel-view distance
pub fn extra_view_positions() -> Vec<Vec3> {
    EXTRA_VIEW_AZIMUTHS
        .iter()
        .zip(EXTRA_VIEW_ELEVATIONS.iter())
        .map(|(az, el)| {
            spherical_to_cartesian(deg_to_rad(*az), deg_to_rad(*el), NOVEL_VIEW_DISTANCE)
        })
        .collect()
}

/// Archive camera centres rescaled by `1.3 / 1.5`, followed by the extra views
pub fn fixed_novel_view_positions(archive: &PoseArchive) -> Vec<Vec3> {
    archive
        .camera_centres()
        .into_iter()
        .map(|centre| centre / ARCHIVE_DISTANCE * NOVEL_VIEW_DISTANCE)
        .chain(extra_view_positions())
        .collect()
}
