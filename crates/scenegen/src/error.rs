//! Scene generation errors
//!
//! Every failure aborts the scene: there is no partial-scene fallback.
//! Configuration problems are detected before anything is simulated,
//! simulation failures carry the phase they happened in.

use thiserror::Error;

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::metadata::MetadataError;
use crate::physics::PhysicsError;
use crate::render::RenderError;
use crate::simulation::SimulationPhase;

/// Scene generation errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Invalid configuration (empty asset split, bad ranges, …)
    #[error("Config error: {0}")]
    Config(String),

    /// Camera scheme name not recognised
    #[error("unsupported camera scheme '{0}'")]
    UnknownCameraScheme(String),

    /// Camera frame with only one of its two keyframe channels
    #[error("camera frame {0} is missing a position or orientation keyframe")]
    IncompleteKeyframe(i32),

    /// The physics collaborator could not place an object
    #[error("could not place '{asset_id}': {source}")]
    Placement {
        /// Asset being placed
        asset_id: String,
        /// Underlying physics error
        #[source]
        source: PhysicsError,
    },

    /// The physics collaborator failed while simulating
    #[error("simulation failed during {phase}: {source}")]
    Simulation {
        /// Phase the failure happened in
        phase: SimulationPhase,
        /// Underlying physics error
        #[source]
        source: PhysicsError,
    },

    /// A simulation phase was requested out of order
    #[error("cannot enter {requested} while {current}")]
    PhaseOrder {
        /// Current phase
        current: SimulationPhase,
        /// Phase that was requested
        requested: SimulationPhase,
    },

    /// The simulation already failed; the scene is unusable
    #[error("simulation aborted during {0}")]
    Aborted(SimulationPhase),

    /// Asset source error
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Renderer or image output error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Metadata output error
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Configuration file error
    #[error(transparent)]
    ConfigFile(#[from] ConfigError),
}
