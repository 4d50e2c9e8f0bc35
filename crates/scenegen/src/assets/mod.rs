//! Asset sources
//!
//! An asset source knows which assets exist, how large each one is at unit
//! scale and how to turn an identifier into a [`SceneObject`]. Geometry is
//! never decoded here; the bounds recorded in the manifest are all placement
//! needs.
//!
//! Manifests use the JSON layout of the public asset collections:
//!
//! ```json
//! {
//!   "name": "GSO",
//!   "data_dir": "…",
//!   "assets": {
//!     "some_id": { "asset_type": "FileBasedObject",
//!                  "kwargs": { "bounds": [[-0.1, -0.1, 0.0], [0.1, 0.1, 0.2]] } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use thiserror::Error;

use crate::scene::{Aabb, SceneObject};

/// Seed of the generator that decides the held-out split
const SPLIT_SEED: u64 = 42;

/// Prefix of the built-in catalogues
const BUILTIN_PREFIX: &str = "builtin:";

/// Asset errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest is not valid JSON or has the wrong layout
    #[error("Manifest parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Manifest lives in remote storage
    #[error("remote manifest '{0}' must be downloaded first")]
    RemoteManifest(String),

    /// Unknown built-in catalogue
    #[error("unknown built-in asset catalogue '{0}'")]
    UnknownCatalogue(String),

    /// Asset id not present in the source
    #[error("unknown asset '{0}'")]
    UnknownAsset(String),

    /// Asset is not a physical object (e.g. a texture)
    #[error("asset '{0}' is not an object")]
    NotAnObject(String),
}

/// Kind of asset listed in a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Mesh with physical bounds
    Object,
    /// Image, e.g. an HDRI background
    Texture,
}

/// What a manifest records about one asset
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    /// Kind of asset
    pub kind: AssetKind,
    /// Bounds at unit scale (objects only)
    pub bounds: Option<Aabb>,
    /// File backing the asset, if any
    pub filename: Option<String>,
    /// Friction override from the manifest
    pub friction: Option<f32>,
    /// Restitution override from the manifest
    pub restitution: Option<f32>,
}

impl AssetRecord {
    /// Object record with the given unit-scale bounds
    pub fn object(bounds: Aabb) -> Self {
        Self {
            kind: AssetKind::Object,
            bounds: Some(bounds),
            filename: None,
            friction: None,
            restitution: None,
        }
    }

    /// Texture record backed by `filename`
    pub fn texture(filename: impl Into<String>) -> Self {
        Self {
            kind: AssetKind::Texture,
            bounds: None,
            filename: Some(filename.into()),
            friction: None,
            restitution: None,
        }
    }
}

/// Asset-source collaborator
pub trait AssetSource {
    /// Name of the collection
    fn name(&self) -> &str;

    /// All asset identifiers, sorted
    fn asset_ids(&self) -> Vec<String>;

    /// Manifest record of one asset
    fn record(&self, asset_id: &str) -> Option<&AssetRecord>;

    /// Split the collection into `(train, test)`.
    ///
    /// A fixed-seed generator, independent of the scene generator, picks
    /// `round(n * fraction)` ids for the test split, so every scene sees the
    /// same split. Both halves are returned in sorted order.
    fn get_test_split(&self, fraction: f32) -> (Vec<String>, Vec<String>) {
        let ids = self.asset_ids();
        let test_size = ((ids.len() as f32) * fraction.clamp(0.0, 1.0)).round() as usize;

        let mut shuffled = ids.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));
        let mut test: Vec<String> = shuffled.into_iter().take(test_size).collect();
        test.sort();

        let train = ids.into_iter().filter(|id| test.binary_search(id).is_err()).collect();
        (train, test)
    }

    /// Create an object for `asset_id` at uniform `scale`
    fn create(&self, asset_id: &str, scale: f32) -> Result<SceneObject, AssetError> {
        let record = self
            .record(asset_id)
            .ok_or_else(|| AssetError::UnknownAsset(asset_id.to_string()))?;
        let bounds = match (record.kind, record.bounds) {
            (AssetKind::Object, Some(bounds)) => bounds,
            _ => return Err(AssetError::NotAnObject(asset_id.to_string())),
        };

        let mut object = SceneObject::new(asset_id, bounds).with_scale(scale);
        if let Some(friction) = record.friction {
            object.friction = friction;
        }
        if let Some(restitution) = record.restitution {
            object.restitution = restitution;
        }
        Ok(object)
    }
}

#[derive(Deserialize)]
struct ManifestFile {
    name: String,
    #[serde(default)]
    data_dir: Option<String>,
    assets: BTreeMap<String, ManifestEntry>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    asset_type: String,
    #[serde(default)]
    kwargs: ManifestKwargs,
}

#[derive(Deserialize, Default)]
struct ManifestKwargs {
    bounds: Option<[[f32; 3]; 2]>,
    filename: Option<String>,
    render_filename: Option<String>,
    friction: Option<f32>,
    restitution: Option<f32>,
}

/// Asset source backed by a manifest
#[derive(Debug, Clone, Default)]
pub struct ManifestAssetSource {
    name: String,
    data_dir: Option<String>,
    assets: BTreeMap<String, AssetRecord>,
}

impl ManifestAssetSource {
    /// Build a source from explicit records
    pub fn from_records(
        name: impl Into<String>,
        records: impl IntoIterator<Item = (String, AssetRecord)>,
    ) -> Self {
        Self {
            name: name.into(),
            data_dir: None,
            assets: records.into_iter().collect(),
        }
    }

    /// Open a manifest location: a local JSON path or a `builtin:` catalogue
    pub fn open(location: &str) -> Result<Self, AssetError> {
        if let Some(catalogue) = location.strip_prefix(BUILTIN_PREFIX) {
            return Self::builtin(catalogue);
        }
        if location.contains("://") {
            return Err(AssetError::RemoteManifest(location.to_string()));
        }
        Self::from_manifest(Path::new(location))
    }

    /// Parse a local manifest file
    pub fn from_manifest(path: &Path) -> Result<Self, AssetError> {
        let contents = std::fs::read_to_string(path)?;
        let source = Self::from_json(&contents)?;
        log::info!(
            "Loaded {} assets from manifest '{}' ({})",
            source.assets.len(),
            source.name,
            path.display()
        );
        Ok(source)
    }

    /// Parse manifest contents
    pub fn from_json(contents: &str) -> Result<Self, AssetError> {
        let manifest: ManifestFile = serde_json::from_str(contents)?;
        let assets = manifest
            .assets
            .into_iter()
            .map(|(id, entry)| {
                let kind = if entry.asset_type == "Texture" {
                    AssetKind::Texture
                } else {
                    AssetKind::Object
                };
                let record = AssetRecord {
                    kind,
                    bounds: entry.kwargs.bounds.map(|[min, max]| Aabb::from_corners(min, max)),
                    filename: entry.kwargs.filename.or(entry.kwargs.render_filename),
                    friction: entry.kwargs.friction,
                    restitution: entry.kwargs.restitution,
                };
                (id, record)
            })
            .collect();

        Ok(Self {
            name: manifest.name,
            data_dir: manifest.data_dir,
            assets,
        })
    }

    /// Directory the manifest's files are relative to
    pub fn data_dir(&self) -> Option<&str> {
        self.data_dir.as_deref()
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// True when the source lists no asset
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Built-in catalogues usable without downloading anything
    pub fn builtin(catalogue: &str) -> Result<Self, AssetError> {
        match catalogue {
            "kubasic" => Ok(Self::kubasic()),
            "hdri" => Ok(Self::hdri()),
            "shapes" => Ok(Self::shapes()),
            other => Err(AssetError::UnknownCatalogue(other.to_string())),
        }
    }

    /// Basic primitives plus the dome used as floor and backdrop
    pub fn kubasic() -> Self {
        let unit = Aabb::from_corners([-1.0; 3], [1.0; 3]);
        let mut records: Vec<(String, AssetRecord)> = [
            "cube", "cylinder", "sphere", "cone", "torus", "gear", "sponge", "suzanne", "teapot",
        ]
        .iter()
        .map(|id| ((*id).to_string(), AssetRecord::object(unit)))
        .collect();
        records.push((
            "dome".to_string(),
            AssetRecord::object(Aabb::from_corners([-40.0, -40.0, 0.0], [40.0, 40.0, 40.0])),
        ));
        Self::from_records("KuBasic", records)
    }

    /// A handful of environment maps
    pub fn hdri() -> Self {
        let records = (0..10).map(|i| {
            let id = format!("hdri_{i:02}");
            let filename = format!("{id}.exr");
            (id, AssetRecord::texture(filename))
        });
        Self::from_records("HDRI_haven", records)
    }

    /// Boxes of varied proportions standing in for scanned household objects
    pub fn shapes() -> Self {
        let records = (0..40).map(|i| {
            let step = i as f32;
            let half = [
                0.05 + 0.01 * (step % 7.0),
                0.04 + 0.015 * (step % 5.0),
                0.03 + 0.02 * (step % 3.0),
            ];
            let bounds = Aabb::from_corners(
                [-half[0], -half[1], 0.0],
                [half[0], half[1], 2.0 * half[2]],
            );
            (format!("shape_{i:03}"), AssetRecord::object(bounds))
        });
        Self::from_records("Shapes", records)
    }
}

impl AssetSource for ManifestAssetSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn asset_ids(&self) -> Vec<String> {
        self.assets.keys().cloned().collect()
    }

    fn record(&self, asset_id: &str) -> Option<&AssetRecord> {
        self.assets.get(asset_id)
    }
}
