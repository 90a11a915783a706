//! Two-way model selection by held-out R²

use crate::error::Result;
use super::linear_models::LinearRegression;
use super::models::Regressor;
use super::random_forest::RandomForest;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which candidate won the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelChoice {
    LinearRegression,
    RandomForest,
}

impl ModelChoice {
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelChoice::LinearRegression => "Linear Regression",
            ModelChoice::RandomForest => "Random Forest",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Pick the forest only if it scores strictly higher.
///
/// Equal scores keep the linear model, and so does a NaN on either side,
/// since no comparison with NaN is greater.
pub fn select_model(linear_r2: f64, forest_r2: f64) -> ModelChoice {
    if forest_r2 > linear_r2 {
        ModelChoice::RandomForest
    } else {
        ModelChoice::LinearRegression
    }
}

/// Scores behind a selection, persisted with the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub choice: ModelChoice,
    pub linear_r2: f64,
    pub forest_r2: f64,
}

impl Selection {
    pub fn new(linear_r2: f64, forest_r2: f64) -> Self {
        Self {
            choice: select_model(linear_r2, forest_r2),
            linear_r2,
            forest_r2,
        }
    }

    /// R² of the chosen model
    pub fn winning_r2(&self) -> f64 {
        match self.choice {
            ModelChoice::LinearRegression => self.linear_r2,
            ModelChoice::RandomForest => self.forest_r2,
        }
    }
}

/// The retained model, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    LinearRegression(LinearRegression),
    RandomForest(RandomForest),
}

impl TrainedModel {
    /// Keep the winner of `selection`, dropping the other candidate
    pub fn from_selection(
        selection: &Selection,
        linear: LinearRegression,
        forest: RandomForest,
    ) -> Self {
        match selection.choice {
            ModelChoice::LinearRegression => TrainedModel::LinearRegression(linear),
            ModelChoice::RandomForest => TrainedModel::RandomForest(forest),
        }
    }

    pub fn choice(&self) -> ModelChoice {
        match self {
            TrainedModel::LinearRegression(_) => ModelChoice::LinearRegression,
            TrainedModel::RandomForest(_) => ModelChoice::RandomForest,
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
        }
    }
}

impl Regressor for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }

    fn name(&self) -> &'static str {
        self.as_regressor().name()
    }
}
