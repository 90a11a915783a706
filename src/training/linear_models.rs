//! Ordinary least squares regression

use crate::error::{HappinessError, Result};
use super::models::Regressor;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Cholesky factorization `A = L Lᵀ` followed by forward and back
/// substitution. `None` if `A` is not positive definite.
fn cholesky_factor_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Solve a symmetric positive-definite system, retrying once with a tiny
/// diagonal ridge if the matrix is numerically semi-definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    if let Some(x) = cholesky_factor_solve(a, b) {
        return Some(x);
    }

    let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    if ridge == 0.0 {
        return None;
    }
    let mut a_reg = a.clone();
    for k in 0..n {
        a_reg[[k, k]] += ridge;
    }
    cholesky_factor_solve(&a_reg, b)
}

/// Gauss-Jordan inversion with partial pivoting
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }

    Some(inv)
}

/// Solve least squares via normal equations: (XᵀX) w = Xᵀy.
///
/// Columns with no spread get a zero weight and are left out of the solve,
/// so an all-constant design yields all-zero weights.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    let n = xtx.nrows();

    let max_diag = xtx.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let active: Vec<usize> = (0..n)
        .filter(|&j| xtx[[j, j]] > 1e-12 * max_diag)
        .collect();

    let mut weights = Array1::<f64>::zeros(n);
    if active.is_empty() {
        return Some(weights);
    }

    let sub_xtx = xtx.select(Axis(0), &active).select(Axis(1), &active);
    let sub_xty = xty.select(Axis(0), &active);
    let sub_weights = cholesky_solve(&sub_xtx, &sub_xty)
        .or_else(|| matrix_inverse(&sub_xtx).map(|inv| inv.dot(&sub_xty)))?;

    for (k, &j) in active.iter().enumerate() {
        weights[j] = sub_weights[k];
    }
    Some(weights)
}

/// Linear regression model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(HappinessError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(HappinessError::TrainingError(
                "cannot fit linear regression on zero rows".to_string(),
            ));
        }

        // Center data so the intercept separates from the weights
        let (coefficients, intercept) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| HappinessError::ComputationError("empty axis".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            let coefficients = solve_least_squares(&x_centered, &y_centered).ok_or_else(|| {
                HappinessError::ComputationError(
                    "Matrix is singular, cannot solve least squares".to_string(),
                )
            })?;
            let intercept = y_mean - coefficients.dot(&x_mean);
            (coefficients, intercept)
        } else {
            let coefficients = solve_least_squares(x, y).ok_or_else(|| {
                HappinessError::ComputationError(
                    "Matrix is singular, cannot solve least squares".to_string(),
                )
            })?;
            (coefficients, 0.0)
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);

        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(HappinessError::ModelNotFitted)?;

        if x.ncols() != coefficients.len() {
            return Err(HappinessError::ShapeError {
                expected: format!("{} columns", coefficients.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y)?;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }

    fn name(&self) -> &'static str {
        "Linear Regression"
    }
}
