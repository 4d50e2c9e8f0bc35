//! # Object Placement Planner
//!
//! Populates the scene with randomly chosen, randomly scaled assets and asks
//! the physics collaborator for a collision-free pose inside a spawn region.
//! Dynamic objects additionally get an initial velocity biased toward the
//! scene centre.
//!
//! Every draw consumes the shared [`SceneRng`] in a fixed order: asset id,
//! target scale, position (inside the collaborator), then velocity.

use crate::assets::AssetSource;
use crate::error::SceneError;
use crate::foundation::math::Vec3;
use crate::foundation::rng::SceneRng;
use crate::physics::Physics;
use crate::scene::{Aabb, ObjectKey, ObjectRole, Scene};

/// Region static distractors are dropped from
pub fn static_spawn_region() -> Aabb {
    Aabb::from_corners([-7.0, -7.0, 0.0], [7.0, 7.0, 10.0])
}

/// Region dynamic objects are tossed from
pub fn dynamic_spawn_region() -> Aabb {
    Aabb::from_corners([-5.0, -5.0, 1.0], [5.0, 5.0, 5.0])
}

/// Range of the raw initial velocity of dynamic objects
pub fn velocity_range() -> Aabb {
    Aabb::from_corners([-4.0, -4.0, 0.0], [4.0, 4.0, 0.0])
}

/// Range of the target physical size (longest side) of placed objects
pub const SCALE_RANGE: (f32, f32) = (0.75, 3.0);

/// Friction of static objects right after placement
pub const STATIC_FRICTION: f32 = 1.0;

/// Restitution of static objects right after placement
pub const STATIC_RESTITUTION: f32 = 0.0;

/// Number of objects in `[min, max]`, both inclusive
pub fn sample_object_count(rng: &mut SceneRng, min: usize, max: usize) -> usize {
    rng.randint(min, max + 1)
}

/// A batch of objects to place
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    /// Number of objects
    pub object_count: usize,
    /// Region the objects must end up in
    pub spawn_region: Aabb,
    /// Static or dynamic
    pub role: ObjectRole,
}

impl PlacementRequest {
    /// `count` static distractors in the static spawn region
    pub fn statics(count: usize) -> Self {
        Self {
            object_count: count,
            spawn_region: static_spawn_region(),
            role: ObjectRole::Static,
        }
    }

    /// `count` tossed objects in the dynamic spawn region
    pub fn dynamics(count: usize) -> Self {
        Self {
            object_count: count,
            spawn_region: dynamic_spawn_region(),
            role: ObjectRole::Dynamic,
        }
    }
}

/// Places batches of objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPlanner {
    /// Target size range
    pub scale_range: (f32, f32),
    /// Raw velocity range for dynamic objects
    pub velocity_range: Aabb,
}

impl Default for PlacementPlanner {
    fn default() -> Self {
        Self {
            scale_range: SCALE_RANGE,
            velocity_range: velocity_range(),
        }
    }
}

impl PlacementPlanner {
    /// Place `request.object_count` objects drawn from `split`.
    ///
    /// Returns the keys of the new objects in placement order. An empty split
    /// is a configuration error and nothing is drawn; a failed placement
    /// aborts the batch.
    pub fn place(
        &self,
        scene: &mut Scene,
        request: &PlacementRequest,
        split: &[String],
        assets: &dyn AssetSource,
        physics: &mut dyn Physics,
        rng: &mut SceneRng,
    ) -> Result<Vec<ObjectKey>, SceneError> {
        if split.is_empty() {
            return Err(SceneError::Config(format!(
                "no {} assets to choose from: the active split is empty",
                assets.name()
            )));
        }
        if request.role == ObjectRole::Background {
            return Err(SceneError::Config("background objects are not placed".to_string()));
        }

        let role_name = if request.role == ObjectRole::Dynamic { "dynamic" } else { "static" };
        log::info!("Randomly placing {} {} objects:", request.object_count, role_name);

        let mut placed = Vec::with_capacity(request.object_count);
        for _ in 0..request.object_count {
            placed.push(self.place_one(scene, request, split, assets, physics, rng)?);
        }
        Ok(placed)
    }

    fn place_one(
        &self,
        scene: &mut Scene,
        request: &PlacementRequest,
        split: &[String],
        assets: &dyn AssetSource,
        physics: &mut dyn Physics,
        rng: &mut SceneRng,
    ) -> Result<ObjectKey, SceneError> {
        let asset_id = rng
            .choose(split)
            .cloned()
            .ok_or_else(|| SceneError::Config("the active split is empty".to_string()))?;

        let mut object = assets.create(&asset_id, 1.0)?.with_role(request.role);
        let target_scale = rng.uniform(self.scale_range.0, self.scale_range.1);
        let longest_side = object.bounds.longest_side();
        if longest_side <= 0.0 {
            return Err(SceneError::Config(format!("asset '{asset_id}' has degenerate bounds")));
        }
        object.scale = target_scale / longest_side;
        object.set_metadata("scale", f64::from(target_scale));

        let key = scene.add(object);
        let position = physics
            .move_until_no_overlap(scene, key, &request.spawn_region, rng)
            .map_err(|source| SceneError::Placement {
                asset_id: asset_id.clone(),
                source,
            })?;

        let dynamic = request.role == ObjectRole::Dynamic;
        let velocity = if dynamic {
            let raw = rng.uniform_vec3(&self.velocity_range.min, &self.velocity_range.max);
            Some(raw - Vec3::new(position.x, position.y, 0.0))
        } else {
            None
        };

        if let Some(object) = scene.get_mut(key) {
            match velocity {
                Some(velocity) => object.velocity = velocity,
                None => {
                    object.friction = STATIC_FRICTION;
                    object.restitution = STATIC_RESTITUTION;
                }
            }
            object.set_metadata("is_dynamic", dynamic);
        }
        log::info!("    Added {} at {:?}", asset_id, position);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ManifestAssetSource;
    use crate::physics::ReferencePhysics;
    use crate::scene::SceneObject;
    use crate::testing::CountingPhysics;
    use approx::assert_relative_eq;

    fn empty_scene() -> Scene {
        let mut scene = Scene::new(1, 24, 12, (64, 64));
        scene.add(
            SceneObject::new("dome", Aabb::from_corners([-40.0, -40.0, 0.0], [40.0, 40.0, 40.0]))
                .with_role(ObjectRole::Background),
        );
        scene
    }

    #[test]
    fn test_issues_one_placement_call_per_object() {
        let assets = ManifestAssetSource::shapes();
        let (split, _) = assets.get_test_split(0.1);
        let mut scene = empty_scene();
        let mut physics = CountingPhysics::new(ReferencePhysics::default());
        let mut rng = SceneRng::seed_from_u64(42);
        let planner = PlacementPlanner::default();

        let mut place = |scene: &mut Scene, request: PlacementRequest| {
            planner
                .place(scene, &request, &split, &assets, &mut physics, &mut rng)
                .unwrap()
        };
        let statics = place(&mut scene, PlacementRequest::statics(7));
        let dynamics = place(&mut scene, PlacementRequest::dynamics(3));

        assert_eq!(physics.placements, 10);
        assert_eq!(statics.len(), 7);
        assert_eq!(dynamics.len(), 3);

        for key in &statics {
            let object = scene.get(*key).unwrap();
            assert!(static_spawn_region().contains_point(object.position));
            assert_eq!(object.friction, STATIC_FRICTION);
            assert_eq!(object.restitution, STATIC_RESTITUTION);
            assert_eq!(object.metadata["is_dynamic"], false);
        }
        for key in &dynamics {
            let object = scene.get(*key).unwrap();
            assert!(dynamic_spawn_region().contains_point(object.position));
            assert_eq!(object.metadata["is_dynamic"], true);
            // velocity is U([-4, 4]) minus the horizontal position
            let raw = object.velocity + Vec3::new(object.position.x, object.position.y, 0.0);
            assert!(raw.x.abs() <= 4.0 + 1e-4 && raw.y.abs() <= 4.0 + 1e-4);
            assert_eq!(object.velocity.z, 0.0);
        }
    }

    #[test]
    fn test_scale_normalised_by_longest_side() {
        let assets = ManifestAssetSource::shapes();
        let split = assets.asset_ids();
        let mut scene = empty_scene();
        let mut rng = SceneRng::seed_from_u64(3);
        let keys = PlacementPlanner::default()
            .place(
                &mut scene,
                &PlacementRequest::statics(5),
                &split,
                &assets,
                &mut ReferencePhysics::default(),
                &mut rng,
            )
            .unwrap();

        for key in keys {
            let object = scene.get(key).unwrap();
            let target = object.metadata["scale"].as_f64().unwrap() as f32;
            assert!((SCALE_RANGE.0..=SCALE_RANGE.1).contains(&target));
            assert_relative_eq!(object.scaled_bounds().longest_side(), target, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_empty_split_is_config_error() {
        let assets = ManifestAssetSource::shapes();
        let mut scene = empty_scene();
        let mut physics = CountingPhysics::new(ReferencePhysics::default());
        let result = PlacementPlanner::default().place(
            &mut scene,
            &PlacementRequest::statics(3),
            &[],
            &assets,
            &mut physics,
            &mut SceneRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(SceneError::Config(_))));
        assert_eq!(physics.placements, 0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_placement_failure_names_the_asset() {
        let assets = ManifestAssetSource::shapes();
        let split = vec![assets.asset_ids()[0].clone()];
        let mut scene = empty_scene();
        let request = PlacementRequest {
            object_count: 40,
            spawn_region: Aabb::from_corners([-1.0, -1.0, 0.0], [1.0, 1.0, 1.0]),
            role: ObjectRole::Static,
        };
        let result = PlacementPlanner::default().place(
            &mut scene,
            &request,
            &split,
            &assets,
            &mut ReferencePhysics::default(),
            &mut SceneRng::seed_from_u64(0),
        );
        assert!(matches!(
            result,
            Err(SceneError::Placement { asset_id, .. }) if asset_id == split[0]
        ));
    }

    #[test]
    fn test_object_count_inclusive() {
        let mut rng = SceneRng::seed_from_u64(8);
        let counts: Vec<usize> = (0..500).map(|_| sample_object_count(&mut rng, 1, 3)).collect();
        assert!(counts.iter().all(|c| (1..=3).contains(c)));
        assert!(counts.contains(&3));
        assert!(counts.contains(&1));
    }
}
