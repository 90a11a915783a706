//! Regression metrics

use crate::error::{HappinessError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// Returns NaN for fewer than two samples. When the true values are all
/// equal, a perfect prediction scores 1.0 and anything else 0.0.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    if y_true.len() < 2 {
        return Ok(f64::NAN);
    }

    let y_mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(HappinessError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    Ok(())
}

/// Metrics for model evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared
    pub r2: f64,
    /// Training time in seconds
    pub training_time_secs: f64,
    /// Number of evaluation samples
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Compute regression metrics on an evaluation set
    pub fn compute_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        if y_true.is_empty() {
            return Err(HappinessError::ComputationError(
                "cannot evaluate on zero samples".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let (sq, abs) = y_true
            .iter()
            .zip(y_pred.iter())
            .fold((0.0, 0.0), |(sq, abs), (t, p)| {
                let e = t - p;
                (sq + e * e, abs + e.abs())
            });
        let mse = sq / n;

        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae: abs / n,
            r2: r2_score(y_true, y_pred)?,
            training_time_secs: 0.0,
            n_samples: y_true.len(),
        })
    }

    /// Attach the wall-clock fit duration
    pub fn with_training_time(mut self, secs: f64) -> Self {
        self.training_time_secs = secs;
        self
    }
}
