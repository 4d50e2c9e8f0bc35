//! Metadata documents written next to the rendered images
//!
//! - `metadata.json`: flags, scene metadata, camera track and per-instance
//!   information for the retained instances
//! - `events.json`: collision events restricted to the retained instances

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::foundation::math::{quat_to_wxyz, Vec3};
use crate::physics::{AnimationTrace, CollisionEvent};
use crate::postprocess::{InstanceBoxes, RetainedInstance};
use crate::scene::{ObjectKey, Scene};

/// Errors while writing metadata
#[derive(Error, Debug)]
pub enum MetadataError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Instance metadata keys that are written as dedicated fields
const RESERVED_KEYS: [&str; 3] = ["visibility", "bboxes", "bbox_frames"];

/// Scene-level metadata
#[derive(Debug, Clone, Serialize)]
pub struct SceneMetadata {
    /// Number of recorded frames
    pub num_frames: usize,
    /// Frames per second
    pub frame_rate: u32,
    /// `[width, height]`
    pub resolution: [u32; 2],
    /// Ambient illumination colour
    pub ambient_illumination: [f32; 3],
    /// Free-form entries (`background`, `num_instances`, `seed`, …)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Scene metadata of `scene`
pub fn get_scene_metadata(scene: &Scene) -> SceneMetadata {
    SceneMetadata {
        num_frames: scene.num_frames(),
        frame_rate: scene.frame_rate,
        resolution: [scene.resolution.0, scene.resolution.1],
        ambient_illumination: scene.ambient_illumination,
        extra: scene.metadata.clone(),
    }
}

/// Camera intrinsics and per-frame pose
#[derive(Debug, Clone, Serialize)]
pub struct CameraInfo {
    /// Focal length in millimetres
    pub focal_length: f32,
    /// Sensor width in millimetres
    pub sensor_width: f32,
    /// Horizontal field of view in radians
    pub field_of_view: f32,
    /// Recorded frames
    pub frames: Vec<i32>,
    /// Position per recorded frame
    pub positions: Vec<[f32; 3]>,
    /// Rotation per recorded frame as `[w, x, y, z]`
    pub quaternions: Vec<[f32; 4]>,
}

/// Camera info over the recorded frames of `scene`
pub fn get_camera_info(scene: &Scene) -> CameraInfo {
    let track = &scene.camera;
    let poses = track.poses(scene.frames());
    CameraInfo {
        focal_length: track.camera.focal_length,
        sensor_width: track.camera.sensor_width,
        field_of_view: track.camera.field_of_view(),
        frames: poses.iter().map(|pose| pose.frame).collect(),
        positions: poses.iter().map(|pose| pose.position.into()).collect(),
        quaternions: poses.iter().map(|pose| quat_to_wxyz(&pose.rotation)).collect(),
    }
}

/// Per-instance information
#[derive(Debug, Clone, Serialize)]
pub struct InstanceInfo {
    /// Asset the instance was created from
    pub asset_id: String,
    /// Uniform scale applied to the asset
    pub scale_factor: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Restitution
    pub restitution: f32,
    /// Position per recorded frame
    pub positions: Vec<[f32; 3]>,
    /// Rotation per recorded frame as `[w, x, y, z]`
    pub quaternions: Vec<[f32; 4]>,
    /// Linear velocity per recorded frame
    pub velocities: Vec<[f32; 3]>,
    /// Angular velocity per recorded frame
    pub angular_velocities: Vec<[f32; 3]>,
    /// Visible pixels per rendered frame; empty when nothing was measured
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub visibility: Vec<u64>,
    /// Image-space boxes
    #[serde(flatten)]
    pub boxes: InstanceBoxes,
    /// Object metadata (`scale`, `is_dynamic`, …)
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

/// Instance info for `instances`, in order.
///
/// Per-frame state comes from `animation` where it covers a frame, otherwise
/// from the object's keyframes or its current state.
pub fn get_instance_info(
    scene: &Scene,
    instances: &[RetainedInstance],
    animation: Option<&AnimationTrace>,
) -> Vec<InstanceInfo> {
    instances
        .iter()
        .filter_map(|instance| {
            let object = scene.get(instance.key)?;
            let track = animation.and_then(|trace| trace.get(instance.key));

            let mut info = InstanceInfo {
                asset_id: object.asset_id.clone(),
                scale_factor: object.scale,
                friction: object.friction,
                restitution: object.restitution,
                positions: Vec::with_capacity(scene.num_frames()),
                quaternions: Vec::with_capacity(scene.num_frames()),
                velocities: Vec::with_capacity(scene.num_frames()),
                angular_velocities: Vec::with_capacity(scene.num_frames()),
                visibility: instance.visibility.per_frame.clone(),
                boxes: instance.boxes.clone(),
                metadata: object
                    .metadata
                    .iter()
                    .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            };

            for frame in scene.frames() {
                let sample = track.and_then(|track| {
                    let offset = usize::try_from(frame - track.frame_start).ok()?;
                    Some((
                        *track.positions.get(offset)?,
                        *track.quaternions.get(offset)?,
                        *track.velocities.get(offset)?,
                        *track.angular_velocities.get(offset)?,
                    ))
                });
                let (position, rotation, velocity, angular) = sample.unwrap_or((
                    object.position_at(frame),
                    object.rotation,
                    object.velocity,
                    Vec3::zeros(),
                ));
                info.positions.push(position.into());
                info.quaternions.push(quat_to_wxyz(&rotation));
                info.velocities.push(velocity.into());
                info.angular_velocities.push(angular.into());
            }
            Some(info)
        })
        .collect()
}

/// One collision event as written to `events.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionInfo {
    /// Instance indices in the retained list, `-1` for objects outside it
    pub instances: [i64; 2],
    /// Frame of the contact
    pub frame: i32,
    /// Contact impulse magnitude
    pub force: f32,
    /// Contact point
    pub position: [f32; 3],
    /// Contact normal
    pub contact_normal: [f32; 3],
    /// Contact point projected into the camera at that frame
    pub image_position: Option<[f32; 2]>,
}

/// Express `collisions` in terms of positions in `subset`
pub fn process_collisions(
    collisions: &[CollisionEvent],
    scene: &Scene,
    subset: &[ObjectKey],
) -> Vec<CollisionInfo> {
    let index_of = |key: ObjectKey| {
        subset
            .iter()
            .position(|candidate| *candidate == key)
            .map_or(-1, |index| index as i64)
    };
    let aspect = scene.resolution.0 as f32 / scene.resolution.1.max(1) as f32;

    collisions
        .iter()
        .map(|event| CollisionInfo {
            instances: [index_of(event.instances.0), index_of(event.instances.1)],
            frame: event.frame,
            force: event.force,
            position: event.position.into(),
            contact_normal: event.contact_normal.into(),
            image_position: scene
                .camera
                .pose_at(event.frame)
                .and_then(|pose| scene.camera.camera.project(&pose, event.position, aspect)),
        })
        .collect()
}

/// Serialize `data` as pretty JSON to `path`, creating parent directories
pub fn write_json(path: &Path, data: &impl Serialize) -> Result<(), MetadataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(data)?;
    std::fs::write(path, contents)?;
    log::debug!("Wrote '{}'", path.display());
    Ok(())
}

/// Contents of `metadata.json`
#[derive(Debug, Clone, Serialize)]
pub struct MetadataDocument {
    /// Effective configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Value>,
    /// Scene metadata
    pub metadata: SceneMetadata,
    /// Camera info
    pub camera: CameraInfo,
    /// Retained instances
    pub instances: Vec<InstanceInfo>,
}

/// Contents of `events.json`
#[derive(Debug, Clone, Serialize)]
pub struct EventsDocument {
    /// Collisions among the retained instances and the rest of the scene
    pub collisions: Vec<CollisionInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::VisibilityRecord;
    use crate::scene::{Aabb, CameraPose, ObjectRole, SceneObject};

    fn scene() -> (Scene, Vec<ObjectKey>) {
        let mut scene = Scene::new(1, 3, 12, (64, 32));
        let keys = (0..3)
            .map(|i| {
                let bounds = Aabb::from_corners([-0.5; 3], [0.5; 3]);
                let mut object = SceneObject::new(format!("object_{i}"), bounds)
                    .with_position(Vec3::new(i as f32, 0.0, 0.5));
                object.set_metadata("scale", 1.5);
                object.set_metadata("visibility", vec![1_u64, 2, 3]);
                scene.add(object)
            })
            .collect();
        scene.add(
            SceneObject::new("dome", Aabb::from_corners([-40.0, -40.0, 0.0], [40.0, 40.0, 40.0]))
                .with_role(ObjectRole::Background),
        );
        for frame in 0..=4 {
            let eye = Vec3::new(10.0, 0.0, 10.0);
            scene
                .camera
                .insert_pose(&CameraPose::looking_at(frame, eye, Vec3::zeros()));
        }
        (scene, keys)
    }

    #[test]
    fn test_collisions_outside_subset_get_minus_one() {
        let (scene, keys) = scene();
        let event = CollisionEvent {
            instances: (keys[1], keys[2]),
            frame: 2,
            force: 3.0,
            position: Vec3::zeros(),
            contact_normal: Vec3::z(),
        };
        let processed = process_collisions(&[event], &scene, &[keys[2], keys[0]]);
        assert_eq!(processed[0].instances, [-1, 0]);
        assert_eq!(processed[0].frame, 2);
        let [x, y] = processed[0].image_position.unwrap();
        assert!((x - 0.5).abs() < 1e-4 && (y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_camera_info_covers_recorded_frames() {
        let (scene, _) = scene();
        let info = get_camera_info(&scene);
        assert_eq!(info.frames, vec![1, 2, 3]);
        assert_eq!(info.positions.len(), 3);
        assert_eq!(info.quaternions[0].len(), 4);
    }

    #[test]
    fn test_instance_info_json_layout() {
        let (mut scene, keys) = scene();
        scene.set_metadata("background", "hdri_03");
        let retained = vec![RetainedInstance {
            key: keys[1],
            visibility: VisibilityRecord {
                index: 2,
                per_frame: vec![4, 0, 1],
                total: 5,
            },
            boxes: InstanceBoxes {
                bbox_frames: vec![0, 2],
                bboxes: vec![[0.0, 0.0, 0.5, 0.5], [0.25, 0.25, 0.5, 0.5]],
            },
        }];
        let document = MetadataDocument {
            flags: None,
            metadata: get_scene_metadata(&scene),
            camera: get_camera_info(&scene),
            instances: get_instance_info(&scene, &retained, None),
        };
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(json["metadata"]["num_frames"], 3);
        assert_eq!(json["metadata"]["background"], "hdri_03");
        assert!(json.get("flags").is_none());

        let instance = &json["instances"][0];
        assert_eq!(instance["asset_id"], "object_1");
        assert_eq!(instance["scale"], 1.5);
        assert_eq!(instance["visibility"], serde_json::json!([4, 0, 1]));
        assert_eq!(instance["bbox_frames"], serde_json::json!([0, 2]));
        assert_eq!(instance["positions"][2], serde_json::json!([1.0, 0.0, 0.5]));
    }
}
