//! Training pipeline configuration

use crate::error::{HappinessError, Result};
use crate::preprocessing::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Configuration for one training run.
///
/// Defaults reproduce the stock setup: `happiness_data.csv` in, `model.pkl`
/// and `scaler.pkl` out, 20% held out with seed 42, 100 trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file with a header row
    pub input_path: PathBuf,

    /// Destination of the selected model
    pub model_output_path: PathBuf,

    /// Destination of the fitted scaler
    pub scaler_output_path: PathBuf,

    /// Share of rows held out for evaluation
    pub test_fraction: f64,

    /// Seed for the split and the forest
    pub random_seed: u64,

    /// Number of trees in the forest
    pub ensemble_size: usize,

    /// Feature and target columns
    pub schema: FeatureSchema,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("happiness_data.csv"),
            model_output_path: PathBuf::from("model.pkl"),
            scaler_output_path: PathBuf::from("scaler.pkl"),
            test_fraction: 0.2,
            random_seed: 42,
            ensemble_size: 100,
            schema: FeatureSchema::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON configuration; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            HappinessError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    pub fn with_model_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_output_path = path.into();
        self
    }

    pub fn with_scaler_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scaler_output_path = path.into();
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_ensemble_size(mut self, n_trees: usize) -> Self {
        self.ensemble_size = n_trees;
        self
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(HappinessError::InvalidParameter {
                name: "test_fraction".to_string(),
                value: self.test_fraction.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }
        if self.ensemble_size == 0 {
            return Err(HappinessError::InvalidParameter {
                name: "ensemble_size".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if same_location(&self.model_output_path, &self.scaler_output_path) {
            return Err(HappinessError::ConfigError(format!(
                "model and scaler would both be written to {}",
                self.model_output_path.display()
            )));
        }
        self.schema.validate()
    }
}

/// Lexical comparison ignoring `.` segments. `..` and symlinks are not
/// resolved, so two spellings through them can still name one file.
fn same_location(a: &Path, b: &Path) -> bool {
    fn significant(p: &Path) -> Vec<Component<'_>> {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect::<Vec<_>>()
    }
    significant(a) == significant(b)
}
