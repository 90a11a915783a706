use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use happiness_model::pipeline::{PipelineConfig, TrainingPipeline};
use happiness_model::preprocessing::{FeatureSchema, StandardScaler};
use happiness_model::training::{LinearRegression, RandomForest, Regressor};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_regression_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    // target as sum of features + noise
    let y = x
        .rows()
        .into_iter()
        .map(|row| row.sum() + rng.gen::<f64>() * 0.1)
        .collect();
    (x, y)
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [200, 1000, 5000].iter() {
        let (x, y) = create_regression_data(*n_rows, 6);
        let x = StandardScaler::new().fit_transform(&x).unwrap();

        group.bench_with_input(BenchmarkId::new("linear_fit", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let mut model = LinearRegression::new();
                Regressor::fit(&mut model, black_box(x), black_box(y)).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("forest_fit", n_rows), &(&x, &y), |b, (x, y)| {
            b.iter(|| {
                let mut model = RandomForest::new(100).with_random_state(42);
                Regressor::fit(&mut model, black_box(x), black_box(y)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let (x, y) = create_regression_data(1000, 6);
    let names: Vec<String> = (0..6).map(|i| format!("feature_{}", i)).collect();
    let mut columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(j, name)| Column::new(name.as_str().into(), x.column(j).to_vec()))
        .collect();
    columns.push(Column::new("target".into(), y.to_vec()));
    let df = DataFrame::new(columns).unwrap();

    let config = PipelineConfig::new()
        .with_schema(FeatureSchema::new(names, "target"))
        .with_ensemble_size(100);
    let pipeline = TrainingPipeline::new(config).unwrap();

    group.bench_function("fit_frame", |b| {
        b.iter(|| pipeline.fit_frame(black_box(&df)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_models, bench_pipeline);
criterion_main!(benches);
