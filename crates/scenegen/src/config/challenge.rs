//! # Challenge Configuration
//!
//! Settings of the two scene generators. Every field has the default the
//! generators ship with, so a config file only needs the values it changes
//! and command-line flags override both.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::Config;
use crate::camera_path::{CameraSchemeName, HALF_SHELL_OFFSET};
use crate::error::SceneError;

/// Fraction of every asset collection held out as the test split
pub const TEST_SPLIT_FRACTION: f32 = 0.1;

/// Which half of an asset collection to draw from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSplit {
    /// Training ids
    #[default]
    Train,
    /// Held-out ids
    Test,
}

impl AssetSplit {
    /// The half of `(train, test)` this split names
    pub fn select<T>(self, train: T, test: T) -> T {
        match self {
            Self::Train => train,
            Self::Test => test,
        }
    }
}

impl std::str::FromStr for AssetSplit {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "test" => Ok(Self::Test),
            other => Err(SceneError::Config(format!(
                "unknown split '{other}', expected train or test"
            ))),
        }
    }
}

/// Multi-capture scene configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed of the scene generator; drawn at random when absent
    pub seed: Option<u64>,
    /// First recorded frame
    pub frame_start: i32,
    /// Last recorded frame (inclusive)
    pub frame_end: i32,
    /// Frames per second
    pub frame_rate: u32,
    /// Output resolution (width, height)
    pub resolution: (u32, u32),

    /// Split the scanned objects are drawn from
    pub objects_split: AssetSplit,
    /// Minimum number of static (distractor) objects
    pub min_num_static_objects: usize,
    /// Maximum number of static (distractor) objects
    pub max_num_static_objects: usize,
    /// Minimum number of dynamic (tossed) objects
    pub min_num_dynamic_objects: usize,
    /// Maximum number of dynamic (tossed) objects
    pub max_num_dynamic_objects: usize,

    /// Floor friction during the toss
    pub floor_friction: f32,
    /// Floor restitution during the toss
    pub floor_restitution: f32,
    /// Split the background HDRI is drawn from
    pub backgrounds_split: AssetSplit,

    /// Training camera trajectory
    pub camera: CameraSchemeName,
    /// Minimum camera distance
    pub min_radius: f32,
    /// Maximum camera distance
    pub max_radius: f32,
    /// Upper bound of the sampled motion blur strength
    pub max_motion_blur: f32,

    /// Manifest of the basic shapes and the dome
    pub kubasic_assets: String,
    /// Manifest of the background HDRIs
    pub hdri_assets: String,
    /// Manifest of the scanned objects
    pub gso_assets: String,

    /// Persist simulator and renderer state next to the output
    pub save_state: bool,
    /// Output directory
    pub job_dir: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: None,
            frame_start: 1,
            frame_end: 24,
            frame_rate: 12,
            resolution: (256, 256),
            objects_split: AssetSplit::Train,
            min_num_static_objects: 10,
            max_num_static_objects: 20,
            min_num_dynamic_objects: 1,
            max_num_dynamic_objects: 3,
            floor_friction: 0.3,
            floor_restitution: 0.5,
            backgrounds_split: AssetSplit::Train,
            camera: CameraSchemeName::LinearMovement,
            min_radius: 15.0,
            max_radius: 20.0,
            max_motion_blur: 0.0,
            kubasic_assets: "builtin:kubasic".to_string(),
            hdri_assets: "builtin:hdri".to_string(),
            gso_assets: "builtin:shapes".to_string(),
            save_state: false,
            job_dir: PathBuf::from("output"),
        }
    }
}

impl Config for SceneConfig {}

impl SceneConfig {
    /// Reject inconsistent settings before anything is generated
    pub fn validate(&self) -> Result<(), SceneError> {
        validate_frames(self.frame_start, self.frame_end, self.resolution)?;
        if self.min_num_static_objects > self.max_num_static_objects {
            return Err(SceneError::Config(format!(
                "min_num_static_objects ({}) exceeds max_num_static_objects ({})",
                self.min_num_static_objects, self.max_num_static_objects
            )));
        }
        if self.min_num_dynamic_objects > self.max_num_dynamic_objects {
            return Err(SceneError::Config(format!(
                "min_num_dynamic_objects ({}) exceeds max_num_dynamic_objects ({})",
                self.min_num_dynamic_objects, self.max_num_dynamic_objects
            )));
        }
        if !(self.min_radius > 0.0
            && self.min_radius < self.max_radius
            && self.max_radius > HALF_SHELL_OFFSET)
        {
            return Err(SceneError::Config(format!(
                "invalid camera radius range [{}, {}]",
                self.min_radius, self.max_radius
            )));
        }
        if self.max_motion_blur < 0.0 {
            return Err(SceneError::Config("max_motion_blur must not be negative".to_string()));
        }
        Ok(())
    }

    /// Camera distance bounds
    pub fn radius_range(&self) -> (f32, f32) {
        (self.min_radius, self.max_radius)
    }
}

/// Novel-view configuration for a single scanned object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GsoConfig {
    /// Seed of the scene generator; drawn at random when absent
    pub seed: Option<u64>,
    /// First recorded frame
    pub frame_start: i32,
    /// Last recorded frame (inclusive)
    pub frame_end: i32,
    /// Frames per second
    pub frame_rate: u32,
    /// Output resolution (width, height)
    pub resolution: (u32, u32),
    /// Manifest of the scanned objects
    pub gso_assets: String,
    /// Archive of the 16 stored camera poses; a 30° ring is used when absent
    pub pose_archive: Option<PathBuf>,
    /// Index of the object in the sorted asset ids; taken from the name of
    /// `job_dir` when absent
    pub asset_index: Option<usize>,
    /// Output directory
    pub job_dir: PathBuf,
}

impl Default for GsoConfig {
    fn default() -> Self {
        Self {
            seed: None,
            frame_start: 1,
            frame_end: 22,
            frame_rate: 24,
            resolution: (512, 512),
            gso_assets: "builtin:shapes".to_string(),
            pose_archive: None,
            asset_index: None,
            job_dir: PathBuf::from("output/0"),
        }
    }
}

impl Config for GsoConfig {}

impl GsoConfig {
    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<(), SceneError> {
        validate_frames(self.frame_start, self.frame_end, self.resolution)
    }

    /// Object index: explicit, or parsed from the last component of `job_dir`
    pub fn resolve_asset_index(&self) -> Result<usize, SceneError> {
        if let Some(index) = self.asset_index {
            return Ok(index);
        }
        self.job_dir
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse().ok())
            .ok_or_else(|| {
                SceneError::Config(format!(
                    "job directory '{}' does not end in an asset index",
                    self.job_dir.display()
                ))
            })
    }
}

fn validate_frames(
    frame_start: i32,
    frame_end: i32,
    resolution: (u32, u32),
) -> Result<(), SceneError> {
    if frame_end < frame_start {
        return Err(SceneError::Config(format!(
            "frame_end ({frame_end}) is before frame_start ({frame_start})"
        )));
    }
    if resolution.0 == 0 || resolution.1 == 0 {
        return Err(SceneError::Config(format!(
            "invalid resolution {}x{}",
            resolution.0, resolution.1
        )));
    }
    Ok(())
}
