//! End-to-end training pipeline
//!
//! load → prepare → split → scale → fit both models → evaluate → select →
//! persist. Each stage runs once, in order, and any error aborts the run.

mod config;

pub use config::PipelineConfig;

use crate::error::Result;
use crate::export::{new_artifact_pair, save_artifacts};
use crate::preprocessing::{train_test_split, FeaturePreparer, StandardScaler, TrainTestSplit};
use crate::training::{
    LinearRegression, ModelChoice, ModelMetrics, RandomForest, Regressor, Selection, TrainedModel,
};
use crate::utils::DataLoader;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pipeline stage, reported through [`PipelineEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Prepare,
    Split,
    Scale,
    Train(ModelChoice),
    Save,
}

/// Progress notification passed to the observer of [`TrainingPipeline::run_with`]
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    StageStarted(Stage),
    StageFinished { stage: Stage, elapsed: Duration },
    Evaluated { model: ModelChoice, metrics: &'a ModelMetrics },
    Selected(&'a Selection),
}

/// Summary of a training run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Rows kept after dropping missing targets
    pub n_rows: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub dropped_rows: usize,
    /// Imputed cells per feature column
    pub imputed_cells: Vec<(String, usize)>,
    pub linear_metrics: ModelMetrics,
    pub forest_metrics: ModelMetrics,
    pub selection: Selection,
    /// Forest impurity importances per feature
    pub feature_importances: Vec<(String, f64)>,
}

/// Everything a run produced, before or after persisting
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Unscaled partitions
    pub split: TrainTestSplit,
    pub x_train_scaled: Array2<f64>,
    pub x_test_scaled: Array2<f64>,
    pub scaler: StandardScaler,
    pub model: TrainedModel,
    pub report: PipelineReport,
}

/// Trains, compares and persists the two candidate regressors
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: PipelineConfig,
}

impl TrainingPipeline {
    /// Create a pipeline; the configuration is validated up front
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured input, train, and write both artifacts
    pub fn run(&self) -> Result<TrainingOutcome> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), reporting progress to `on_event`
    pub fn run_with<F>(&self, mut on_event: F) -> Result<TrainingOutcome>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        let path = &self.config.input_path;
        let df = timed(&mut on_event, Stage::Load, || DataLoader::new().load_csv(path))?;
        info!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded dataset");

        let outcome = self.fit_frame_with(&df, &mut on_event)?;
        self.persist_with(&outcome, &mut on_event)?;
        Ok(outcome)
    }

    /// Train on an already loaded frame and write both artifacts
    pub fn run_on_frame(&self, df: &DataFrame) -> Result<TrainingOutcome> {
        let outcome = self.fit_frame(df)?;
        self.persist(&outcome)?;
        Ok(outcome)
    }

    /// Train on an already loaded frame without touching the filesystem
    pub fn fit_frame(&self, df: &DataFrame) -> Result<TrainingOutcome> {
        self.fit_frame_with(df, &mut |_: PipelineEvent<'_>| {})
    }

    /// Write the artifacts of `outcome` to the configured paths
    pub fn persist(&self, outcome: &TrainingOutcome) -> Result<()> {
        self.persist_with(outcome, &mut |_: PipelineEvent<'_>| {})
    }

    fn fit_frame_with(
        &self,
        df: &DataFrame,
        on_event: &mut dyn FnMut(PipelineEvent<'_>),
    ) -> Result<TrainingOutcome> {
        let config = &self.config;
        let schema = &config.schema;

        let preparer = FeaturePreparer::new(schema.clone());
        let prepared = timed(on_event, Stage::Prepare, || preparer.prepare(df))?;

        let split = timed(on_event, Stage::Split, || {
            train_test_split(
                &prepared.x,
                &prepared.y,
                config.test_fraction,
                config.random_seed,
            )
        })?;
        info!(
            train = split.n_train(),
            test = split.n_test(),
            seed = config.random_seed,
            "Split dataset"
        );

        // fit on training rows only; the evaluation rows reuse those statistics
        let mut scaler = StandardScaler::new();
        let (x_train_scaled, x_test_scaled) = timed(on_event, Stage::Scale, || {
            let train = scaler.fit_transform(&split.x_train)?;
            let test = scaler.transform(&split.x_test)?;
            Ok((train, test))
        })?;
        debug!(means = ?scaler.means(), stds = ?scaler.stds(), "Fitted scaler");

        let mut linear = LinearRegression::new();
        let linear_metrics = train_and_evaluate(
            on_event,
            ModelChoice::LinearRegression,
            &mut linear,
            (&x_train_scaled, &split.y_train),
            (&x_test_scaled, &split.y_test),
        )?;

        let mut forest =
            RandomForest::new(config.ensemble_size).with_random_state(config.random_seed);
        let forest_metrics = train_and_evaluate(
            on_event,
            ModelChoice::RandomForest,
            &mut forest,
            (&x_train_scaled, &split.y_train),
            (&x_test_scaled, &split.y_test),
        )?;

        let selection = Selection::new(linear_metrics.r2, forest_metrics.r2);
        info!(
            model = %selection.choice,
            linear_r2 = selection.linear_r2,
            forest_r2 = selection.forest_r2,
            "Selected model"
        );
        on_event(PipelineEvent::Selected(&selection));

        let feature_importances = forest
            .feature_importances()
            .map(|imp| schema.features.iter().cloned().zip(imp.iter().copied()).collect())
            .unwrap_or_default();

        let report = PipelineReport {
            n_rows: prepared.x.nrows(),
            n_train: split.n_train(),
            n_test: split.n_test(),
            dropped_rows: prepared.dropped_rows,
            imputed_cells: schema
                .features
                .iter()
                .cloned()
                .zip(prepared.imputed_cells.iter().copied())
                .collect(),
            linear_metrics,
            forest_metrics,
            selection,
            feature_importances,
        };

        Ok(TrainingOutcome {
            split,
            x_train_scaled,
            x_test_scaled,
            scaler,
            model: TrainedModel::from_selection(&selection, linear, forest),
            report,
        })
    }

    fn persist_with(
        &self,
        outcome: &TrainingOutcome,
        on_event: &mut dyn FnMut(PipelineEvent<'_>),
    ) -> Result<()> {
        let config = &self.config;
        timed(on_event, Stage::Save, || {
            let (model, scaler) = new_artifact_pair(
                &config.schema,
                outcome.model.clone(),
                outcome.report.selection,
                outcome.scaler.clone(),
            );
            save_artifacts(
                &config.model_output_path,
                &config.scaler_output_path,
                &model,
                &scaler,
            )
        })?;
        info!(
            model = %config.model_output_path.display(),
            scaler = %config.scaler_output_path.display(),
            "Saved artifacts"
        );
        Ok(())
    }
}

fn timed<T>(
    on_event: &mut dyn FnMut(PipelineEvent<'_>),
    stage: Stage,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    on_event(PipelineEvent::StageStarted(stage));
    let start = Instant::now();
    let out = f()?;
    on_event(PipelineEvent::StageFinished {
        stage,
        elapsed: start.elapsed(),
    });
    Ok(out)
}

fn train_and_evaluate<R: Regressor>(
    on_event: &mut dyn FnMut(PipelineEvent<'_>),
    choice: ModelChoice,
    model: &mut R,
    (x_train, y_train): (&Array2<f64>, &Array1<f64>),
    (x_test, y_test): (&Array2<f64>, &Array1<f64>),
) -> Result<ModelMetrics> {
    let start = Instant::now();
    timed(on_event, Stage::Train(choice), || model.fit(x_train, y_train))?;
    let elapsed = start.elapsed().as_secs_f64();

    let y_pred = model.predict(x_test)?;
    let metrics = ModelMetrics::compute_regression(y_test, &y_pred)?.with_training_time(elapsed);

    if metrics.r2.is_nan() {
        warn!(model = %choice, n_test = y_test.len(), "R² is undefined for fewer than two evaluation rows");
    }
    info!(
        model = %choice,
        r2 = metrics.r2,
        rmse = metrics.rmse,
        fit_secs = elapsed,
        "Evaluated model"
    );
    on_event(PipelineEvent::Evaluated {
        model: choice,
        metrics: &metrics,
    });

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::FeatureSchema;
    use polars::prelude::*;

    fn frame(n: usize) -> DataFrame {
        let a: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
        let y: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 1.0 + 0.5 * a - 0.25 * b).collect();
        df!("a" => &a, "b" => &b, "y" => &y).unwrap()
    }

    fn config() -> PipelineConfig {
        PipelineConfig::new()
            .with_schema(FeatureSchema::new(["a", "b"], "y"))
            .with_ensemble_size(10)
    }

    #[test]
    fn test_fit_frame_reports_partitions() {
        let pipeline = TrainingPipeline::new(config()).unwrap();
        let outcome = pipeline.fit_frame(&frame(20)).unwrap();

        assert_eq!(outcome.report.n_rows, 20);
        assert_eq!(outcome.report.n_train, 16);
        assert_eq!(outcome.report.n_test, 4);
        assert_eq!(outcome.x_test_scaled.nrows(), 4);
        assert_eq!(outcome.report.feature_importances.len(), 2);
    }

    #[test]
    fn test_exact_linear_data_selects_linear() {
        let pipeline = TrainingPipeline::new(config()).unwrap();
        let outcome = pipeline.fit_frame(&frame(30)).unwrap();

        assert!((outcome.report.linear_metrics.r2 - 1.0).abs() < 1e-9);
        assert_eq!(outcome.report.selection.choice, ModelChoice::LinearRegression);
        assert_eq!(outcome.model.choice(), ModelChoice::LinearRegression);
    }

    #[test]
    fn test_events_in_stage_order() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("data.csv");
        let mut df = frame(15);
        crate::utils::DataSaver::save_csv(&mut df, &csv).unwrap();

        let pipeline = TrainingPipeline::new(
            config()
                .with_input_path(&csv)
                .with_model_output_path(dir.path().join("m.pkl"))
                .with_scaler_output_path(dir.path().join("s.pkl")),
        )
        .unwrap();

        let mut started = Vec::new();
        let mut evaluated = 0;
        pipeline
            .run_with(|event| match event {
                PipelineEvent::StageStarted(stage) => started.push(stage),
                PipelineEvent::Evaluated { .. } => evaluated += 1,
                _ => {}
            })
            .unwrap();

        assert_eq!(
            started,
            vec![
                Stage::Load,
                Stage::Prepare,
                Stage::Split,
                Stage::Scale,
                Stage::Train(ModelChoice::LinearRegression),
                Stage::Train(ModelChoice::RandomForest),
                Stage::Save,
            ]
        );
        assert_eq!(evaluated, 2);
        assert!(dir.path().join("m.pkl").exists());
        assert!(dir.path().join("s.pkl").exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(TrainingPipeline::new(PipelineConfig::new().with_test_fraction(0.0)).is_err());
    }
}
