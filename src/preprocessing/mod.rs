//! Data preprocessing module
//!
//! Turns a loaded table into model-ready matrices:
//! - Projection onto the feature schema with per-column mean imputation
//! - Seeded train/evaluation splitting
//! - Standard scaling fit on the training rows only

pub mod features;
pub mod scaler;
pub mod split;

pub use features::{
    mean_impute, FeaturePreparer, FeatureSchema, PreparedData, DEFAULT_FEATURES, DEFAULT_TARGET,
};
pub use scaler::StandardScaler;
pub use split::{train_test_split, TrainTestSplit};
