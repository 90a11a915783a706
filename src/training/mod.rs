//! Model training module
//!
//! Provides the two candidate regressors and the machinery to compare them:
//! - Ordinary least squares linear regression
//! - Regression trees and a bagged random forest
//! - R² and error metrics
//! - Strict-improvement model selection

mod models;
pub mod decision_tree;
pub mod linear_models;
pub mod metrics;
pub mod random_forest;
pub mod selection;

pub use decision_tree::{DecisionTree, TreeNode};
pub use linear_models::LinearRegression;
pub use metrics::{r2_score, ModelMetrics};
pub use models::Regressor;
pub use random_forest::{MaxFeatures, RandomForest};
pub use selection::{select_model, ModelChoice, Selection, TrainedModel};
