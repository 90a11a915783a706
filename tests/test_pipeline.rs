//! Integration test: training pipeline (prepare → split → scale → train → select)

use happiness_model::pipeline::{PipelineConfig, TrainingPipeline};
use happiness_model::preprocessing::{
    train_test_split, FeaturePreparer, FeatureSchema, StandardScaler, DEFAULT_FEATURES,
    DEFAULT_TARGET,
};
use happiness_model::training::{select_model, ModelChoice};
use ndarray::Axis;
use polars::prelude::*;

fn create_happiness_dataset(n: usize) -> DataFrame {
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n); DEFAULT_FEATURES.len()];
    let mut target = Vec::with_capacity(n);

    for i in 0..n {
        let x = i as f64;
        let row = [
            0.5 + (x * 0.37).sin().abs(),
            0.8 + ((i * 3) % 7) as f64 * 0.05,
            0.4 + (x * 0.11).cos().abs() * 0.5,
            0.2 + ((i * 5) % 11) as f64 * 0.03,
            0.05 + ((i * 7) % 13) as f64 * 0.01,
            0.1 + (x * 0.23).sin().abs() * 0.2,
        ];
        for (col, v) in columns.iter_mut().zip(row) {
            col.push(v);
        }
        target.push(2.0 + 1.5 * row[0] + row[1] + 2.0 * row[2] + row[3] + 0.5 * row[5]);
    }

    let mut series: Vec<Column> = DEFAULT_FEATURES
        .iter()
        .zip(columns)
        .map(|(name, values)| Column::new((*name).into(), values))
        .collect();
    series.push(Column::new(DEFAULT_TARGET.into(), target));

    DataFrame::new(series).unwrap()
}

fn config_in(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig::new()
        .with_model_output_path(dir.join("model.pkl"))
        .with_scaler_output_path(dir.join("scaler.pkl"))
        .with_ensemble_size(20)
}

#[test]
fn test_ten_row_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let df = create_happiness_dataset(10);

    let pipeline = TrainingPipeline::new(config_in(dir.path())).unwrap();
    let outcome = pipeline.run_on_frame(&df).unwrap();

    assert_eq!(outcome.report.n_train, 8);
    assert_eq!(outcome.report.n_test, 2);
    assert!(outcome.report.linear_metrics.r2 <= 1.0);
    assert!(outcome.report.forest_metrics.r2 <= 1.0);
    assert!(dir.path().join("model.pkl").exists());
    assert!(dir.path().join("scaler.pkl").exists());
}

#[test]
fn test_identical_runs_are_deterministic() {
    let df = create_happiness_dataset(60);
    let config = PipelineConfig::new().with_ensemble_size(15);

    let a = TrainingPipeline::new(config.clone()).unwrap().fit_frame(&df).unwrap();
    let b = TrainingPipeline::new(config).unwrap().fit_frame(&df).unwrap();

    assert_eq!(a.split.train_indices, b.split.train_indices);
    assert_eq!(a.split.test_indices, b.split.test_indices);
    assert_eq!(a.scaler, b.scaler);
    assert_eq!(
        a.report.linear_metrics.r2.to_bits(),
        b.report.linear_metrics.r2.to_bits()
    );
    assert_eq!(
        a.report.forest_metrics.r2.to_bits(),
        b.report.forest_metrics.r2.to_bits()
    );
    assert_eq!(a.model, b.model);
}

#[test]
fn test_seed_changes_partition() {
    let df = create_happiness_dataset(40);
    let base = PipelineConfig::new().with_ensemble_size(5);

    let a = TrainingPipeline::new(base.clone().with_random_seed(1))
        .unwrap()
        .fit_frame(&df)
        .unwrap();
    let b = TrainingPipeline::new(base.with_random_seed(2))
        .unwrap()
        .fit_frame(&df)
        .unwrap();

    assert_ne!(a.split.test_indices, b.split.test_indices);
}

#[test]
fn test_imputation_leaves_no_missing_cells() {
    let schema = FeatureSchema::new(["a", "b"], "y");
    let df = df!(
        "a" => &[Some(1.0), None, Some(3.0), None, Some(5.0)],
        "b" => &[Some(2.0), Some(4.0), None, Some(8.0), Some(10.0)],
        "y" => &[1.0, 2.0, 3.0, 4.0, 5.0]
    )
    .unwrap();

    let prepared = FeaturePreparer::new(schema).prepare(&df).unwrap();
    assert!(prepared.x.iter().all(|v| v.is_finite()));
    assert_eq!(prepared.x[[1, 0]], 3.0);
    assert_eq!(prepared.x[[3, 0]], 3.0);
    assert_eq!(prepared.x[[2, 1]], 6.0);
}

#[test]
fn test_scaled_training_columns_standardised() {
    let df = create_happiness_dataset(50);
    let outcome = TrainingPipeline::new(PipelineConfig::new().with_ensemble_size(5))
        .unwrap()
        .fit_frame(&df)
        .unwrap();

    let means = outcome.x_train_scaled.mean_axis(Axis(0)).unwrap();
    let stds = outcome.x_train_scaled.std_axis(Axis(0), 0.0);
    for j in 0..means.len() {
        assert!(means[j].abs() < 1e-9, "column {} mean {}", j, means[j]);
        assert!((stds[j] - 1.0).abs() < 1e-9, "column {} std {}", j, stds[j]);
    }
}

#[test]
fn test_scaler_ignores_evaluation_rows() {
    let df = create_happiness_dataset(30);
    let prepared = FeaturePreparer::new(FeatureSchema::default())
        .prepare(&df)
        .unwrap();
    let split = train_test_split(&prepared.x, &prepared.y, 0.2, 42).unwrap();

    let mut fitted = StandardScaler::new();
    fitted.fit(&split.x_train).unwrap();

    // corrupt every evaluation row; statistics fit on the training rows are unchanged
    let mut altered = prepared.x.clone();
    for &i in &split.test_indices {
        altered.row_mut(i).fill(1e6);
    }
    let altered_split = train_test_split(&altered, &prepared.y, 0.2, 42).unwrap();
    let mut refit = StandardScaler::new();
    refit.fit(&altered_split.x_train).unwrap();

    assert_eq!(fitted, refit);
}

#[test]
fn test_tie_keeps_linear() {
    assert_eq!(select_model(0.75, 0.75), ModelChoice::LinearRegression);
    assert_eq!(select_model(0.75, 0.7500001), ModelChoice::RandomForest);
}

#[test]
fn test_missing_target_rows_dropped() {
    let df = df!(
        "a" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0],
        "b" => &[2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 8.0, 7.0, 10.0, 9.0, 12.0],
        "y" => &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0),
                 Some(7.0), Some(8.0), Some(9.0), Some(10.0), Some(11.0)]
    )
    .unwrap();
    let config = PipelineConfig::new()
        .with_schema(FeatureSchema::new(["a", "b"], "y"))
        .with_ensemble_size(5);

    let outcome = TrainingPipeline::new(config).unwrap().fit_frame(&df).unwrap();
    assert_eq!(outcome.report.dropped_rows, 1);
    assert_eq!(outcome.report.n_rows, 10);
    assert_eq!(outcome.report.n_train + outcome.report.n_test, 10);
}

#[test]
fn test_missing_column_fails_before_training() {
    let df = df!("a" => &[1.0, 2.0], "y" => &[1.0, 2.0]).unwrap();
    let config = PipelineConfig::new().with_schema(FeatureSchema::new(["a", "b"], "y"));
    let result = TrainingPipeline::new(config).unwrap().fit_frame(&df);
    assert!(result.is_err());
}

#[test]
fn test_run_reads_csv_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("happiness_data.csv");
    let mut df = create_happiness_dataset(25);
    happiness_model::utils::DataSaver::save_csv(&mut df, &csv).unwrap();

    let outcome = TrainingPipeline::new(config_in(dir.path()).with_input_path(&csv))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(outcome.report.n_rows, 25);
    assert_eq!(outcome.report.n_test, 5);
}

#[test]
fn test_all_constant_features_still_train() {
    let df = df!(
        "a" => &[1.0; 10],
        "b" => &[2.0; 10],
        "y" => &[3.0, 4.5, 5.0, 2.0, 6.5, 4.0, 3.5, 5.5, 4.2, 3.8]
    )
    .unwrap();
    let config = PipelineConfig::new()
        .with_schema(FeatureSchema::new(["a", "b"], "y"))
        .with_ensemble_size(5);

    let outcome = TrainingPipeline::new(config).unwrap().fit_frame(&df).unwrap();

    // with no usable feature the linear model predicts the training mean
    let y_train_mean = outcome.split.y_train.mean().unwrap();
    let pred = happiness_model::training::Regressor::predict(
        &outcome.model,
        &outcome.x_test_scaled,
    );
    assert!(outcome.report.linear_metrics.r2.is_finite());
    assert!(outcome.report.linear_metrics.r2 <= 1.0);
    if outcome.model.choice() == ModelChoice::LinearRegression {
        for v in pred.unwrap().iter() {
            assert!((v - y_train_mean).abs() < 1e-12);
        }
    }
}

#[test]
fn test_missing_tokens_in_csv_are_imputed() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    std::fs::write(
        &csv,
        "a,b,y\nNA,3,4\n3,NaN,5\n5,4,6\n1,n/a,2\n2,5,3\n",
    )
    .unwrap();

    let df = happiness_model::utils::DataLoader::new().load_csv(&csv).unwrap();
    let prepared = FeaturePreparer::new(FeatureSchema::new(["a", "b"], "y"))
        .prepare(&df)
        .unwrap();

    assert_eq!(prepared.imputed_cells, vec![1, 2]);
    assert_eq!(prepared.x[[0, 0]], 2.75);
    assert_eq!(prepared.x[[1, 1]], 4.0);
    assert_eq!(prepared.x[[3, 1]], 4.0);
}
