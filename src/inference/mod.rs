//! Inference from persisted artifacts
//!
//! A [`Predictor`] loads a model/scaler pair written by the training
//! pipeline and scores new rows with the same feature schema.

use crate::error::{HappinessError, Result};
use crate::export::load_artifacts;
use crate::preprocessing::{FeaturePreparer, FeatureSchema, StandardScaler};
use crate::training::{ModelChoice, Regressor, Selection, TrainedModel};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::{debug, info};

/// Scores rows with a loaded model and scaler
#[derive(Debug, Clone)]
pub struct Predictor {
    preparer: FeaturePreparer,
    scaler: StandardScaler,
    model: TrainedModel,
    selection: Selection,
    trained_at: DateTime<Utc>,
}

impl Predictor {
    /// Load a model/scaler pair. With `expected`, the embedded feature
    /// schema must match it exactly.
    pub fn load(
        model_path: impl AsRef<Path>,
        scaler_path: impl AsRef<Path>,
        expected: Option<&FeatureSchema>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let (model, scaler) = load_artifacts(model_path, scaler_path.as_ref(), expected)?;

        if !scaler.scaler.is_fitted() {
            return Err(HappinessError::ModelNotFitted);
        }

        info!(
            path = %model_path.display(),
            model = %model.model.choice(),
            trained_at = %model.header.trained_at,
            "Loaded predictor"
        );

        Ok(Self {
            preparer: FeaturePreparer::new(model.header.schema),
            scaler: scaler.scaler,
            model: model.model,
            selection: model.selection,
            trained_at: model.header.trained_at,
        })
    }

    /// Build directly from in-memory parts
    pub fn from_parts(
        schema: FeatureSchema,
        scaler: StandardScaler,
        model: TrainedModel,
        selection: Selection,
    ) -> Self {
        Self {
            preparer: FeaturePreparer::new(schema),
            scaler,
            model,
            selection,
            trained_at: Utc::now(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.preparer.schema()
    }

    pub fn choice(&self) -> ModelChoice {
        self.model.choice()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Score every row of `df`. Extra columns are ignored; the target
    /// column need not be present.
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.preparer.features_only(df)?;
        self.predict_rows(&x)
    }

    /// Score unscaled feature rows laid out in schema order
    pub fn predict_rows(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let expected = self.schema().n_features();
        if x.ncols() != expected {
            return Err(HappinessError::ShapeError {
                expected: format!("{} features", expected),
                actual: format!("{} features", x.ncols()),
            });
        }

        let scaled = self.scaler.transform(x)?;
        let predictions = self.model.predict(&scaled)?;
        debug!(rows = x.nrows(), model = %self.choice(), "Scored rows");
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::LinearRegression;
    use ndarray::array;
    use polars::prelude::*;

    fn predictor() -> Predictor {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 0.0]];
        let y = x.column(0).mapv(|v| 2.0 * v) + x.column(1).mapv(|v| 3.0 * v);

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let mut linear = LinearRegression::new();
        linear.fit(&scaled, &y).unwrap();

        Predictor::from_parts(
            FeatureSchema::new(["a", "b"], "y"),
            scaler,
            TrainedModel::LinearRegression(linear),
            Selection::new(1.0, 0.5),
        )
    }

    #[test]
    fn test_predict_rows_scales_first() {
        let p = predictor();
        let pred = p.predict_rows(&array![[10.0, 1.0]]).unwrap();
        assert!((pred[0] - 23.0).abs() < 1e-8);
        assert_eq!(p.choice(), ModelChoice::LinearRegression);
    }

    #[test]
    fn test_predict_frame_by_column_name() {
        let p = predictor();
        let df = df!("b" => &[0.0, 1.0], "a" => &[1.0, 2.0], "note" => &["x", "y"]).unwrap();
        let pred = p.predict_frame(&df).unwrap();
        assert!((pred[0] - 2.0).abs() < 1e-8);
        assert!((pred[1] - 7.0).abs() < 1e-8);
    }

    #[test]
    fn test_predict_rows_wrong_width() {
        let err = predictor().predict_rows(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, HappinessError::ShapeError { .. }));
    }

    #[test]
    fn test_predict_frame_missing_feature() {
        let df = df!("a" => &[1.0]).unwrap();
        let err = predictor().predict_frame(&df).unwrap_err();
        assert!(matches!(err, HappinessError::FeatureNotFound(_)));
    }
}
