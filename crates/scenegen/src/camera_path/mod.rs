//! # Camera Path Generator
//!
//! Computes one [`CameraPose`] per frame of a (padded) frame range from a
//! parametric [`TrajectoryScheme`], and commits the poses as keyframes on the
//! scene camera.
//!
//! ## Schemes
//! - **Fixed list**: precomputed positions, frame `k` uses entry `k - 1`
//! - **Linear orbit**: one full revolution in azimuth over the frame span
//! - **Random look-at**: a fresh random azimuth every frame
//! - **Half-sphere shell**: a fresh random point in an upper half shell every frame
//!
//! Orientation is always recomputed from the position so that the camera faces
//! the origin; it is never interpolated on its own.

mod novel_view;
mod sampling;

pub use novel_view::{
    extra_view_positions, fixed_novel_view_positions, PoseArchive, PoseMatrix, ARCHIVE_DISTANCE,
    NOVEL_VIEW_DISTANCE,
};
pub use sampling::{
    orbit_position, sample_point_in_half_sphere_shell, sample_volumetric_radius,
    spherical_to_cartesian, MAX_SHELL_TRIALS,
};

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::foundation::math::constants::{DEG_TO_RAD, TAU};
use crate::foundation::math::Vec3;
use crate::foundation::rng::SceneRng;
use crate::scene::{CameraPose, CameraTrack};

/// Elevation range of the orbit schemes, measured from +Z (radians)
pub const ORBIT_PHI_RANGE: (f32, f32) = (30.0 * DEG_TO_RAD, 60.0 * DEG_TO_RAD);

/// Minimum height of half-shell camera positions above the ground
pub const HALF_SHELL_OFFSET: f32 = 0.1;

/// `[start - pad, end + pad]`
pub fn padded_frames(frame_start: i32, frame_end: i32, pad: i32) -> RangeInclusive<i32> {
    (frame_start - pad)..=(frame_end + pad)
}

/// Scheme names accepted on the command line and in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSchemeName {
    /// Linear orbit around the scene centre
    #[serde(alias = "linear_movement_linear_lookat", alias = "fixed_random")]
    LinearMovement,
    /// Random azimuth every frame
    RandomLookat,
    /// Random point in the upper half shell every frame
    HalfSphereShell,
}

impl CameraSchemeName {
    /// Every accepted name, in CLI order
    pub const NAMES: [&'static str; 5] = [
        "fixed_random",
        "linear_movement",
        "linear_movement_linear_lookat",
        "random_lookat",
        "half_sphere_shell",
    ];
}

impl FromStr for CameraSchemeName {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear_movement" | "linear_movement_linear_lookat" | "fixed_random" => {
                Ok(Self::LinearMovement)
            }
            "random_lookat" => Ok(Self::RandomLookat),
            "half_sphere_shell" => Ok(Self::HalfSphereShell),
            other => Err(SceneError::UnknownCameraScheme(other.to_string())),
        }
    }
}

impl fmt::Display for CameraSchemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LinearMovement => "linear_movement",
            Self::RandomLookat => "random_lookat",
            Self::HalfSphereShell => "half_sphere_shell",
        };
        f.write_str(name)
    }
}

/// Orbit parameters shared by the orbit schemes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParams {
    /// Azimuth at the first unpadded frame
    pub theta0: f32,
    /// Polar angle from +Z
    pub phi: f32,
    /// Distance from the origin
    pub radius: f32,
}

impl OrbitParams {
    /// Sample `theta0`, `phi` and `radius`, in that order
    pub fn sample(rng: &mut SceneRng, radius_range: (f32, f32)) -> Self {
        let theta0 = rng.uniform(0.0, TAU);
        let phi = rng.uniform(ORBIT_PHI_RANGE.0, ORBIT_PHI_RANGE.1);
        let radius = sample_volumetric_radius(rng, radius_range.0, radius_range.1);
        Self { theta0, phi, radius }
    }

    /// Azimuth of the linear orbit at `frame`: one revolution per `num_frames`
    pub fn azimuth_at(&self, frame: i32, frame_start: i32, num_frames: usize) -> f32 {
        self.theta0 + (frame - frame_start) as f32 * TAU / num_frames as f32
    }

    /// Position at azimuth `theta`
    pub fn position(&self, theta: f32) -> Vec3 {
        orbit_position(theta, self.phi, self.radius)
    }
}

/// Parametric camera trajectory
#[derive(Debug, Clone, PartialEq)]
pub enum TrajectoryScheme {
    /// Precomputed positions, 1-indexed by frame
    FixedList {
        /// Position for frame `k` is `positions[k - 1]`
        positions: Vec<Vec3>,
    },
    /// One full revolution over the frame span
    LinearOrbit {
        /// Orbit parameters
        orbit: OrbitParams,
    },
    /// Independent random azimuth per frame, fixed elevation and radius
    RandomLookat {
        /// Polar angle from +Z
        phi: f32,
        /// Distance from the origin
        radius: f32,
    },
    /// Independent random point per frame in the upper half shell
    HalfSphereShell {
        /// Inner radius
        inner_radius: f32,
        /// Outer radius
        outer_radius: f32,
        /// Minimum height above the ground
        offset: f32,
    },
}

impl TrajectoryScheme {
    /// Build the scheme named `name`, drawing its orbit parameters from `rng`
    pub fn from_name(name: CameraSchemeName, radius_range: (f32, f32), rng: &mut SceneRng) -> Self {
        match name {
            CameraSchemeName::LinearMovement => Self::LinearOrbit {
                orbit: OrbitParams::sample(rng, radius_range),
            },
            CameraSchemeName::RandomLookat => {
                let orbit = OrbitParams::sample(rng, radius_range);
                Self::RandomLookat {
                    phi: orbit.phi,
                    radius: orbit.radius,
                }
            }
            CameraSchemeName::HalfSphereShell => Self::HalfSphereShell {
                inner_radius: radius_range.0,
                outer_radius: radius_range.1,
                offset: HALF_SHELL_OFFSET,
            },
        }
    }

    /// Orbit parameters, for the schemes that have them
    pub fn orbit(&self) -> Option<OrbitParams> {
        match self {
            Self::LinearOrbit { orbit } => Some(*orbit),
            _ => None,
        }
    }

    /// Polar angle and radius shared by every frame, if the scheme has them
    pub fn orbit_shape(&self) -> Option<(f32, f32)> {
        match self {
            Self::LinearOrbit { orbit } => Some((orbit.phi, orbit.radius)),
            Self::RandomLookat { phi, radius } => Some((*phi, *radius)),
            _ => None,
        }
    }
}

/// Generates camera poses over a frame range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraPathGenerator {
    /// First recorded frame
    pub frame_start: i32,
    /// Last recorded frame
    pub frame_end: i32,
    /// Extra frames before and after the range
    pub pad: i32,
}

impl CameraPathGenerator {
    /// Generator for `[frame_start, frame_end]` padded by one frame on each side
    pub fn new(frame_start: i32, frame_end: i32) -> Self {
        Self {
            frame_start,
            frame_end,
            pad: 1,
        }
    }

    /// Change the padding
    pub fn with_pad(mut self, pad: i32) -> Self {
        self.pad = pad;
        self
    }

    /// Number of unpadded frames
    pub fn num_frames(&self) -> usize {
        usize::try_from(self.frame_end - self.frame_start + 1).unwrap_or(0)
    }

    /// Padded frame range
    pub fn frames(&self) -> RangeInclusive<i32> {
        padded_frames(self.frame_start, self.frame_end, self.pad)
    }

    /// One pose per padded frame, in frame order, all facing the origin
    pub fn generate(
        &self,
        scheme: &TrajectoryScheme,
        rng: &mut SceneRng,
    ) -> Result<Vec<CameraPose>, SceneError> {
        if self.frame_end < self.frame_start {
            return Err(SceneError::Config(format!(
                "empty frame range [{}, {}]",
                self.frame_start, self.frame_end
            )));
        }

        let num_frames = self.num_frames();
        let mut poses = Vec::with_capacity(num_frames + 2 * self.pad.max(0) as usize);
        for frame in self.frames() {
            let position = match scheme {
                TrajectoryScheme::FixedList { positions } => usize::try_from(frame - 1)
                    .ok()
                    .and_then(|index| positions.get(index).copied())
                    .ok_or_else(|| {
                        SceneError::Config(format!(
                            "fixed camera list has {} entries, frame {} is out of range",
                            positions.len(),
                            frame
                        ))
                    })?,
                TrajectoryScheme::LinearOrbit { orbit } => {
                    orbit.position(orbit.azimuth_at(frame, self.frame_start, num_frames))
                }
                TrajectoryScheme::RandomLookat { phi, radius } => {
                    orbit_position(rng.uniform(0.0, TAU), *phi, *radius)
                }
                TrajectoryScheme::HalfSphereShell {
                    inner_radius,
                    outer_radius,
                    offset,
                } => sample_point_in_half_sphere_shell(rng, *inner_radius, *outer_radius, *offset)?,
            };
            poses.push(CameraPose::looking_at(frame, position, Vec3::zeros()));
        }
        Ok(poses)
    }

    /// Generate the poses of `scheme` and keyframe them on `track`
    pub fn generate_into(
        &self,
        scheme: &TrajectoryScheme,
        track: &mut CameraTrack,
        rng: &mut SceneRng,
    ) -> Result<Vec<CameraPose>, SceneError> {
        let poses = self.generate(scheme, rng)?;
        keyframe_into(&poses, track);
        track.validate()?;
        Ok(poses)
    }
}

/// Commit position and orientation keyframes for every pose
pub fn keyframe_into(poses: &[CameraPose], track: &mut CameraTrack) {
    track.insert_poses(poses);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PerspectiveCamera;
    use approx::assert_relative_eq;

    fn assert_faces_origin(pose: &CameraPose) {
        let expected = (-pose.position).normalize();
        assert_relative_eq!(pose.forward(), expected, epsilon = 1e-5);
    }

    fn all_schemes(rng: &mut SceneRng) -> Vec<TrajectoryScheme> {
        vec![
            TrajectoryScheme::from_name(CameraSchemeName::LinearMovement, (15.0, 20.0), rng),
            TrajectoryScheme::from_name(CameraSchemeName::RandomLookat, (15.0, 20.0), rng),
            TrajectoryScheme::from_name(CameraSchemeName::HalfSphereShell, (15.0, 20.0), rng),
        ]
    }

    #[test]
    fn test_one_pose_per_padded_frame() {
        let mut rng = SceneRng::seed_from_u64(11);
        for (start, end) in [(1, 24), (0, 0), (-3, 5), (10, 11)] {
            let generator = CameraPathGenerator::new(start, end);
            for scheme in all_schemes(&mut rng) {
                let poses = generator.generate(&scheme, &mut rng).unwrap();
                let frames: Vec<i32> = poses.iter().map(|p| p.frame).collect();
                let expected: Vec<i32> = (start - 1..=end + 1).collect();
                assert_eq!(frames, expected);
                poses.iter().for_each(assert_faces_origin);
            }
        }
    }

    #[test]
    fn test_linear_orbit_one_revolution() {
        let mut rng = SceneRng::seed_from_u64(5);
        let scheme =
            TrajectoryScheme::from_name(CameraSchemeName::LinearMovement, (15.0, 20.0), &mut rng);
        let orbit = scheme.orbit().unwrap();
        let generator = CameraPathGenerator::new(1, 24);
        let n = generator.num_frames();

        let first = orbit.azimuth_at(1, 1, n);
        let last = orbit.azimuth_at(24, 1, n);
        assert_relative_eq!(last - first, TAU * (n as f32 - 1.0) / n as f32, epsilon = 1e-5);

        let poses = generator.generate(&scheme, &mut rng).unwrap();
        let mut previous = f32::NEG_INFINITY;
        for pose in &poses {
            let theta = orbit.azimuth_at(pose.frame, 1, n);
            assert!(theta > previous);
            previous = theta;
            assert_relative_eq!(pose.position, orbit.position(theta), epsilon = 1e-4);
            assert_relative_eq!(pose.position.norm(), orbit.radius, epsilon = 1e-3);
        }
        // the pre-pad frame sits one step before theta0
        let pre_pad = orbit.azimuth_at(0, 1, n);
        assert_relative_eq!(pre_pad, orbit.theta0 - TAU / n as f32, epsilon = 1e-6);
    }

    #[test]
    fn test_orbit_params_ranges() {
        let mut rng = SceneRng::seed_from_u64(99);
        for _ in 0..200 {
            let orbit = OrbitParams::sample(&mut rng, (15.0, 20.0));
            assert!((0.0..TAU).contains(&orbit.theta0));
            assert!(orbit.phi >= ORBIT_PHI_RANGE.0 && orbit.phi <= ORBIT_PHI_RANGE.1);
            assert!(orbit.radius >= 14.999 && orbit.radius <= 20.001);
        }
    }

    #[test]
    fn test_random_lookat_keeps_elevation_and_radius() {
        let mut rng = SceneRng::seed_from_u64(21);
        let scheme = TrajectoryScheme::RandomLookat { phi: 0.7, radius: 17.0 };
        let poses = CameraPathGenerator::new(1, 10).generate(&scheme, &mut rng).unwrap();
        for pose in &poses {
            assert_relative_eq!(pose.position.norm(), 17.0, epsilon = 1e-4);
            assert_relative_eq!(pose.position.z, 17.0 * 0.7_f32.cos(), epsilon = 1e-4);
        }
        assert_ne!(poses[0].position, poses[1].position);
    }

    #[test]
    fn test_fixed_list_is_one_indexed() {
        let positions: Vec<Vec3> = (1..=4).map(|i| Vec3::new(i as f32, 0.0, 1.0)).collect();
        let scheme = TrajectoryScheme::FixedList { positions };
        let mut rng = SceneRng::seed_from_u64(0);

        let poses = CameraPathGenerator::new(1, 4).with_pad(0).generate(&scheme, &mut rng).unwrap();
        assert_eq!(poses.len(), 4);
        assert_relative_eq!(poses[0].position, Vec3::new(1.0, 0.0, 1.0));
        assert_relative_eq!(poses[3].position, Vec3::new(4.0, 0.0, 1.0));

        let padded = CameraPathGenerator::new(1, 4).generate(&scheme, &mut rng);
        assert!(matches!(padded, Err(SceneError::Config(_))));
    }

    #[test]
    fn test_generate_into_keyframes_both_channels() {
        let mut rng = SceneRng::seed_from_u64(1);
        let scheme =
            TrajectoryScheme::from_name(CameraSchemeName::LinearMovement, (15.0, 20.0), &mut rng);
        let mut track = CameraTrack::new(PerspectiveCamera::default());
        let poses = CameraPathGenerator::new(1, 24)
            .generate_into(&scheme, &mut track, &mut rng)
            .unwrap();
        assert_eq!(track.len(), 26);
        for pose in &poses {
            let stored = track.pose_at(pose.frame).unwrap();
            assert_relative_eq!(stored.position, pose.position);
        }
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!(
            "fixed_random".parse::<CameraSchemeName>().unwrap(),
            CameraSchemeName::LinearMovement
        );
        assert_eq!(
            "linear_movement_linear_lookat".parse::<CameraSchemeName>().unwrap(),
            CameraSchemeName::LinearMovement
        );
        assert!(matches!(
            "dolly_zoom".parse::<CameraSchemeName>(),
            Err(SceneError::UnknownCameraScheme(name)) if name == "dolly_zoom"
        ));
        for name in CameraSchemeName::NAMES {
            assert!(name.parse::<CameraSchemeName>().is_ok());
        }
    }
}
