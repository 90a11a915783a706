//! Binary model and scaler artifacts
//!
//! Both files are bincode-encoded and start with the same [`ArtifactHeader`]:
//! magic bytes, format version, artifact kind, the feature schema with its
//! fingerprint, and the training timestamp. The two files of one training
//! run share the timestamp, which is how a pair is recognised on load.

use crate::error::{HappinessError, Result};
use crate::preprocessing::{FeatureSchema, StandardScaler};
use crate::training::{Selection, TrainedModel};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Leading bytes of every artifact
pub const ARTIFACT_MAGIC: [u8; 4] = *b"HPMA";

/// Bumped whenever the encoded layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Model,
    Scaler,
}

/// Metadata shared by model and scaler artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub magic: [u8; 4],
    pub format_version: u32,
    pub kind: ArtifactKind,
    pub crate_version: String,
    pub trained_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub schema_fingerprint: String,
}

impl ArtifactHeader {
    fn new(kind: ArtifactKind, schema: FeatureSchema, trained_at: DateTime<Utc>) -> Self {
        Self {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            kind,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at,
            schema_fingerprint: schema.fingerprint(),
            schema,
        }
    }

    fn verify(&self, expected_kind: ArtifactKind) -> Result<()> {
        if self.magic != ARTIFACT_MAGIC {
            return Err(HappinessError::ArtifactError(
                "not a happiness-model artifact".to_string(),
            ));
        }
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(HappinessError::ArtifactError(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if self.kind != expected_kind {
            return Err(HappinessError::ArtifactError(format!(
                "expected a {:?} artifact, found {:?}",
                expected_kind, self.kind
            )));
        }
        if self.schema_fingerprint != self.schema.fingerprint() {
            return Err(HappinessError::ArtifactError(
                "schema fingerprint does not match the embedded schema".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persisted winning model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub header: ArtifactHeader,
    pub selection: Selection,
    pub model: TrainedModel,
}

/// Persisted scaler fitted on the training partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub header: ArtifactHeader,
    pub scaler: StandardScaler,
}

/// Build the model and scaler artifacts of one training run
pub fn new_artifact_pair(
    schema: &FeatureSchema,
    model: TrainedModel,
    selection: Selection,
    scaler: StandardScaler,
) -> (ModelArtifact, ScalerArtifact) {
    let trained_at = Utc::now();
    let model = ModelArtifact {
        header: ArtifactHeader::new(ArtifactKind::Model, schema.clone(), trained_at),
        selection,
        model,
    };
    let scaler = ScalerArtifact {
        header: ArtifactHeader::new(ArtifactKind::Scaler, schema.clone(), trained_at),
        scaler,
    };
    (model, scaler)
}

/// Write both artifacts, each through its own atomic replace
pub fn save_artifacts(
    model_path: impl AsRef<Path>,
    scaler_path: impl AsRef<Path>,
    model: &ModelArtifact,
    scaler: &ScalerArtifact,
) -> Result<()> {
    write_artifact(model_path.as_ref(), model)?;
    write_artifact(scaler_path.as_ref(), scaler)?;
    Ok(())
}

/// Read a model/scaler pair and check that they belong together.
///
/// With `expected`, the embedded schema must also equal it exactly.
pub fn load_artifacts(
    model_path: impl AsRef<Path>,
    scaler_path: impl AsRef<Path>,
    expected: Option<&FeatureSchema>,
) -> Result<(ModelArtifact, ScalerArtifact)> {
    let model: ModelArtifact = read_artifact(model_path.as_ref(), ArtifactKind::Model)?;
    let scaler: ScalerArtifact = read_artifact(scaler_path.as_ref(), ArtifactKind::Scaler)?;

    if model.header.schema_fingerprint != scaler.header.schema_fingerprint {
        return Err(HappinessError::SchemaMismatch {
            expected: model.header.schema.describe(),
            actual: scaler.header.schema.describe(),
        });
    }
    if model.header.trained_at != scaler.header.trained_at {
        return Err(HappinessError::ArtifactError(format!(
            "model ({}) and scaler ({}) come from different training runs",
            model.header.trained_at, scaler.header.trained_at
        )));
    }
    if let Some(expected) = expected {
        if expected.fingerprint() != model.header.schema_fingerprint {
            return Err(HappinessError::SchemaMismatch {
                expected: expected.describe(),
                actual: model.header.schema.describe(),
            });
        }
    }
    if scaler.scaler.n_features() != model.header.schema.n_features() {
        return Err(HappinessError::ArtifactError(format!(
            "scaler has {} features, schema has {}",
            scaler.scaler.n_features(),
            model.header.schema.n_features()
        )));
    }

    Ok((model, scaler))
}

fn write_artifact<T: Serialize>(path: &Path, artifact: &T) -> Result<()> {
    let bytes = bincode::serialize(artifact)?;
    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote artifact");
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| {
        HappinessError::ArtifactError(format!("cannot read {}: {}", path.display(), e))
    })?;

    // the header is a prefix of every artifact; check it before the body
    let header: ArtifactHeader = bincode::deserialize(&bytes).map_err(|_| {
        HappinessError::ArtifactError(format!(
            "{} is not a happiness-model artifact",
            path.display()
        ))
    })?;
    header.verify(kind)?;

    Ok(bincode::deserialize(&bytes)?)
}

/// Write to a temp file in the destination directory, sync, then rename over
/// `path`. An interrupted write never leaves a truncated artifact behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| HappinessError::IoError(e.error))?;

    Ok(())
}
