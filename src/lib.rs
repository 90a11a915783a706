//! Happiness Model - happiness-score regression pipeline
//!
//! Loads a tabular dataset of national well-being indicators, trains an
//! ordinary least squares model and a random forest on the same scaled
//! partition, keeps whichever scores higher on held-out R², and persists it
//! with the fitted scaler.
//!
//! # Modules
//!
//! - [`preprocessing`] - Feature projection, mean imputation, splitting, scaling
//! - [`training`] - Linear regression, decision trees, random forest, metrics, selection
//! - [`export`] - Schema-stamped model and scaler artifacts
//! - [`pipeline`] - End-to-end training run and its configuration
//! - [`inference`] - Scoring new rows with saved artifacts
//! - [`utils`] - CSV loading and saving
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;

// Orchestration
pub mod pipeline;

// Utilities
pub mod export;
pub mod utils;

// Services
pub mod cli;

pub use error::{HappinessError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{HappinessError, Result};

    // Preprocessing
    pub use crate::preprocessing::{
        FeaturePreparer, FeatureSchema, StandardScaler, TrainTestSplit, train_test_split,
    };

    // Training
    pub use crate::training::{
        LinearRegression, ModelChoice, ModelMetrics, RandomForest, Regressor, Selection,
        TrainedModel, r2_score,
    };

    // Pipeline
    pub use crate::pipeline::{PipelineConfig, PipelineReport, TrainingOutcome, TrainingPipeline};

    // Inference
    pub use crate::inference::Predictor;

    // Export
    pub use crate::export::{load_artifacts, save_artifacts, ModelArtifact, ScalerArtifact};
}
