//! Model export and serialization module
//!
//! Persists the selected model and its scaler as schema-stamped bincode
//! artifacts, replaced atomically on every run.

mod artifact;

pub use artifact::{
    load_artifacts, new_artifact_pair, save_artifacts, ArtifactHeader, ArtifactKind,
    ModelArtifact, ScalerArtifact, ARTIFACT_FORMAT_VERSION, ARTIFACT_MAGIC,
};
