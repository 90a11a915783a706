//! Feature projection and mean imputation

use crate::error::{HappinessError, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Feature columns of the happiness dataset, in model order
pub const DEFAULT_FEATURES: [&str; 6] = [
    "economy_(gdp_per_capita)",
    "family",
    "health_(life_expectancy)",
    "freedom",
    "trust_(government_corruption)",
    "generosity",
];

/// Target column of the happiness dataset
pub const DEFAULT_TARGET: &str = "happiness_score";

/// Ordered feature columns plus the target column a model is trained against.
///
/// The schema is stamped into every persisted artifact so a model and scaler
/// can only be reused against the exact column contract they were fit on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub features: Vec<String>,
    pub target: String,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURES, DEFAULT_TARGET)
    }
}

impl FeatureSchema {
    /// Create a schema from feature names and a target name
    pub fn new<I, S>(features: I, target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            target: target.into(),
        }
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Hex SHA-256 over the ordered column names. Column order matters.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for name in &self.features {
            hasher.update(name.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        hasher.update(self.target.as_bytes());

        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// One-line human readable form, used in mismatch errors
    pub fn describe(&self) -> String {
        format!("[{}] -> {}", self.features.join(", "), self.target)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(HappinessError::ConfigError(
                "feature schema has no feature columns".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for name in &self.features {
            if !seen.insert(name.as_str()) {
                return Err(HappinessError::ConfigError(format!(
                    "feature column '{}' listed twice",
                    name
                )));
            }
        }
        if seen.contains(self.target.as_str()) {
            return Err(HappinessError::ConfigError(format!(
                "target column '{}' is also listed as a feature",
                self.target
            )));
        }
        Ok(())
    }
}

/// Output of [`FeaturePreparer::prepare`]
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Feature matrix with every missing cell imputed
    pub x: Array2<f64>,
    /// Target vector, row-aligned with `x`
    pub y: Array1<f64>,
    /// Imputed cell count per feature column
    pub imputed_cells: Vec<usize>,
    /// Rows removed because their target was missing
    pub dropped_rows: usize,
}

/// Projects a loaded table onto the schema and fills missing feature cells
#[derive(Debug, Clone)]
pub struct FeaturePreparer {
    schema: FeatureSchema,
}

impl FeaturePreparer {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Build the feature matrix and target vector.
    ///
    /// Missing feature cells take the mean of the present values of their
    /// column, computed over all rows. Rows with a missing target are
    /// dropped afterwards; the target itself is never imputed.
    pub fn prepare(&self, df: &DataFrame) -> Result<PreparedData> {
        let mut x = columns_to_array2(df, &self.schema.features)?;
        let imputed_cells = mean_impute(&mut x, &self.schema.features)?;

        let target = numeric_column(df, &self.schema.target)?;
        let keep: Vec<usize> = target
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect();
        let dropped_rows = target.len() - keep.len();

        if dropped_rows > 0 {
            warn!(
                dropped = dropped_rows,
                target = %self.schema.target,
                "Dropping rows with a missing target value"
            );
        }

        let y: Array1<f64> = keep.iter().filter_map(|&i| target[i]).collect();
        let x = if dropped_rows > 0 {
            x.select(Axis(0), &keep)
        } else {
            x
        };

        debug!(
            rows = x.nrows(),
            features = x.ncols(),
            imputed = imputed_cells.iter().sum::<usize>(),
            "Prepared feature matrix"
        );

        Ok(PreparedData {
            x,
            y,
            imputed_cells,
            dropped_rows,
        })
    }

    /// Feature matrix for scoring. The target column is not required, and a
    /// missing feature cell is an error instead of being imputed.
    pub fn features_only(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let x = columns_to_array2(df, &self.schema.features)?;

        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| v.is_nan()) {
            return Err(HappinessError::DataError(format!(
                "missing value in column '{}' at row {}",
                self.schema.features[col], row
            )));
        }

        Ok(x)
    }
}

/// Replace NaN cells with the mean of the non-NaN cells in the same column.
/// Returns how many cells were filled per column.
pub fn mean_impute(x: &mut Array2<f64>, names: &[String]) -> Result<Vec<usize>> {
    let mut filled = Vec::with_capacity(x.ncols());

    for (j, mut column) in x.axis_iter_mut(Axis(1)).enumerate() {
        let (sum, present) = column
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
        let missing = column.len() - present;

        if missing > 0 {
            if present == 0 {
                let name = names.get(j).map(String::as_str).unwrap_or("?");
                return Err(HappinessError::PreprocessingError(format!(
                    "feature column '{}' has no values to impute from",
                    name
                )));
            }
            let mean = sum / present as f64;
            column.mapv_inplace(|v| if v.is_nan() { mean } else { v });
        }
        filled.push(missing);
    }

    Ok(filled)
}

/// Read a column as `f64`, nulls and NaN reported as `None`
fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| HappinessError::FeatureNotFound(name.to_string()))?;

    let series = column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| {
            HappinessError::DataError(format!("column '{}' is not numeric: {}", name, e))
        })?;

    let values = series
        .f64()
        .map_err(|e| HappinessError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();

    Ok(values)
}

/// Extract named columns into a row-major matrix, missing cells as NaN
fn columns_to_array2(df: &DataFrame, names: &[String]) -> Result<Array2<f64>> {
    let col_data: Vec<Vec<f64>> = names
        .iter()
        .map(|name| {
            Ok(numeric_column(df, name)?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect())
        })
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((df.height(), names.len()), |(r, c)| {
        col_data[c][r]
    }))
}
