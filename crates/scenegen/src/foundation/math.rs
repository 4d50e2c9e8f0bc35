//! Math utilities and types
//!
//! Provides the fundamental math types for scene layout. The scene uses a
//! Z-up right-handed world: the ground plane is `z = 0` and cameras orbit
//! around the origin.

pub use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// World up axis (+Z)
pub fn world_up() -> Vec3 {
    Vec3::new(0.0, 0.0, 1.0)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Rotation that points a camera at `target` from `eye`.
///
/// The camera looks down its local -Z axis with local +Y as "up", the same
/// convention as the renderer's perspective camera. The returned rotation maps
/// camera space to world space, so `rotation * -Z` is the viewing direction.
///
/// When the viewing direction is (anti)parallel to `up` the world Y axis is
/// used as a fallback up vector.
pub fn look_at_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    let forward = (target - eye).normalize();
    let mut right = forward.cross(&up);
    if right.norm_squared() < 1e-10 {
        right = forward.cross(&Vec3::y());
    }
    let right = right.normalize();
    let camera_up = right.cross(&forward);

    let basis = Mat3::from_columns(&[right, camera_up, -forward]);
    Quat::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
}

/// Quaternion as `[w, x, y, z]`, the layout written to metadata files.
pub fn quat_to_wxyz(rotation: &Quat) -> [f32; 4] {
    let q = rotation.quaternion();
    [q.w, q.i, q.j, q.k]
}
