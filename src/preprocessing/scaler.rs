//! Standard (z-score) feature scaling

use crate::error::{HappinessError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column standardization: `(x - mean) / std`.
///
/// Statistics are the population mean and standard deviation of the rows
/// passed to [`StandardScaler::fit`]. A column with zero deviation keeps a
/// scale of 1.0, so it is centred but not divided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Option<Array1<f64>>,
    stds: Option<Array1<f64>>,
    scales: Option<Array1<f64>>,
    n_samples_seen: usize,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self {
            means: None,
            stds: None,
            scales: None,
            n_samples_seen: 0,
        }
    }

    /// Learn per-column mean and standard deviation
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(HappinessError::PreprocessingError(
                "cannot fit scaler on zero rows".to_string(),
            ));
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| HappinessError::ComputationError("empty axis".to_string()))?;
        let stds = x.std_axis(Axis(0), 0.0);
        let scales = stds.mapv(|s| if s == 0.0 { 1.0 } else { s });

        self.means = Some(means);
        self.stds = Some(stds);
        self.scales = Some(scales);
        self.n_samples_seen = x.nrows();

        Ok(self)
    }

    /// Apply the fitted statistics to `x`
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (means, scales) = self.params()?;
        self.check_width(x)?;

        Ok((x - &means.view().insert_axis(Axis(0))) / &scales.view().insert_axis(Axis(0)))
    }

    /// Fit on `x`, then transform it
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Map standardized values back to the original units
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (means, scales) = self.params()?;
        self.check_width(x)?;

        Ok(x * &scales.view().insert_axis(Axis(0)) + &means.view().insert_axis(Axis(0)))
    }

    pub fn is_fitted(&self) -> bool {
        self.means.is_some()
    }

    /// Fitted column means
    pub fn means(&self) -> Option<&Array1<f64>> {
        self.means.as_ref()
    }

    /// Fitted population standard deviations, zeros included
    pub fn stds(&self) -> Option<&Array1<f64>> {
        self.stds.as_ref()
    }

    /// Divisors actually applied by `transform`
    pub fn scales(&self) -> Option<&Array1<f64>> {
        self.scales.as_ref()
    }

    pub fn n_features(&self) -> usize {
        self.means.as_ref().map_or(0, |m| m.len())
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        match (&self.means, &self.scales) {
            (Some(m), Some(s)) => Ok((m, s)),
            _ => Err(HappinessError::ModelNotFitted),
        }
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features() {
            return Err(HappinessError::ShapeError {
                expected: format!("{} columns", self.n_features()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(())
    }
}
