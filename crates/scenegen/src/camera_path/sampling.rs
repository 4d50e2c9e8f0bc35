//! Spherical coordinate helpers and position samplers
//!
//! Two spherical conventions are in use and both are kept explicit:
//! the azimuth/elevation form (elevation measured from the ground plane) used
//! by the fixed novel-view list, and the polar form (`phi` measured from +Z)
//! used by the orbit schemes.

use crate::error::SceneError;
use crate::foundation::math::Vec3;
use crate::foundation::rng::SceneRng;

/// Azimuth/elevation (radians) to Cartesian, elevation measured from the XY plane
pub fn spherical_to_cartesian(azimuth: f32, elevation: f32, radius: f32) -> Vec3 {
    Vec3::new(
        radius * elevation.cos() * azimuth.cos(),
        radius * elevation.cos() * azimuth.sin(),
        radius * elevation.sin(),
    )
}

/// Orbit position at azimuth `theta` and polar angle `phi` (from +Z)
pub fn orbit_position(theta: f32, phi: f32, radius: f32) -> Vec3 {
    Vec3::new(theta.cos() * phi.sin(), theta.sin() * phi.sin(), phi.cos()) * radius
}

/// Sample a radius uniformly in the volume of the shell `[r_min, r_max]`.
///
/// `r³` is uniform, not `r`, so that positions do not bunch up on the inner
/// sphere.
pub fn sample_volumetric_radius(rng: &mut SceneRng, r_min: f32, r_max: f32) -> f32 {
    rng.uniform(r_min.powi(3), r_max.powi(3)).cbrt()
}

/// Draws allowed per half-shell point before the shell is declared empty
pub const MAX_SHELL_TRIALS: usize = 10_000;

/// Rejection-sample a point uniformly inside the shell `[inner, outer]`,
/// restricted to `z >= offset`.
///
/// A shell with no volume above `offset` is a configuration error, as is a
/// shell too thin to hit within [`MAX_SHELL_TRIALS`] draws.
pub fn sample_point_in_half_sphere_shell(
    rng: &mut SceneRng,
    inner_radius: f32,
    outer_radius: f32,
    offset: f32,
) -> Result<Vec3, SceneError> {
    if !(inner_radius < outer_radius && offset < outer_radius) {
        return Err(SceneError::Config(format!(
            "empty half shell: radii [{inner_radius}, {outer_radius}], offset {offset}"
        )));
    }
    let low = Vec3::new(-outer_radius, -outer_radius, offset);
    let high = Vec3::new(outer_radius, outer_radius, outer_radius);
    for _ in 0..MAX_SHELL_TRIALS {
        let point = rng.uniform_vec3(&low, &high);
        let length = point.norm();
        if (inner_radius..=outer_radius).contains(&length) {
            return Ok(point);
        }
    }
    Err(SceneError::Config(format!(
        "no point in half shell [{inner_radius}, {outer_radius}] after {MAX_SHELL_TRIALS} draws"
    )))
}
