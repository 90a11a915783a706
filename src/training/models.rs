//! Shared regressor interface

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A model that maps scaled feature rows to a numeric prediction
pub trait Regressor: Send + Sync {
    /// Learn parameters from `x` and `y`
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Display name used in logs and console output
    fn name(&self) -> &'static str;
}
