//! Command-line interface for training and scoring

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::inference::Predictor;
use crate::pipeline::{PipelineConfig, PipelineEvent, PipelineReport, Stage, TrainingPipeline};
use crate::training::ModelChoice;
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 46; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim(&format!("┌{}┐", "─".repeat(W + 3)))); }
fn line_box_bottom() { println!("  {}", dim(&format!("└{}┘", "─".repeat(W + 3)))); }
fn line_box_sep()    { println!("  {}", dim(&format!("├{}┤", "─".repeat(W + 3)))); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{:<22} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn r2_text(r2: f64) -> String {
    if r2.is_nan() {
        "undefined".to_string()
    } else {
        format!("{:.4}", r2)
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "happiness")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and compare happiness-score regressors")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train both regressors and keep the better one
    Train(TrainArgs),

    /// Score a CSV with a saved model and scaler
    Predict {
        /// Input data file (CSV)
        #[arg(short, long)]
        data: PathBuf,

        /// Saved model artifact
        #[arg(short, long, default_value = "model.pkl")]
        model: PathBuf,

        /// Saved scaler artifact
        #[arg(short, long, default_value = "scaler.pkl")]
        scaler: PathBuf,

        /// Write the input with a prediction column appended
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Overrides for the training configuration
#[derive(clap::Args, Debug, Default)]
pub struct TrainArgs {
    /// Input data file (CSV)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Destination of the selected model
    #[arg(long)]
    pub model_output: Option<PathBuf>,

    /// Destination of the fitted scaler
    #[arg(long)]
    pub scaler_output: Option<PathBuf>,

    /// Share of rows held out for evaluation
    #[arg(long)]
    pub test_fraction: Option<f64>,

    /// Seed for the split and the forest
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of trees in the forest
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// JSON configuration; explicit flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl TrainArgs {
    /// Resolve the configuration: defaults, then the JSON file, then flags
    pub fn to_config(&self) -> crate::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(data) = &self.data {
            config = config.with_input_path(data);
        }
        if let Some(path) = &self.model_output {
            config = config.with_model_output_path(path);
        }
        if let Some(path) = &self.scaler_output {
            config = config.with_scaler_output_path(path);
        }
        if let Some(fraction) = self.test_fraction {
            config = config.with_test_fraction(fraction);
        }
        if let Some(seed) = self.seed {
            config = config.with_random_seed(seed);
        }
        if let Some(n) = self.n_estimators {
            config = config.with_ensemble_size(n);
        }

        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let pipeline = TrainingPipeline::new(config)?;

    section("Train");

    let outcome = pipeline.run_with(|event| match event {
        PipelineEvent::StageStarted(Stage::Load) => step_run("Loading dataset"),
        PipelineEvent::StageStarted(Stage::Train(ModelChoice::LinearRegression)) => {
            step_run("Training Linear Regression")
        }
        PipelineEvent::StageStarted(Stage::Train(ModelChoice::RandomForest)) => {
            step_run("Training Random Forest Regressor")
        }
        PipelineEvent::StageStarted(Stage::Save) => step_run("Saving model and scaler"),
        PipelineEvent::StageFinished { stage, elapsed } => match stage {
            Stage::Load | Stage::Train(_) | Stage::Save => step_done(&format!("{:?}", elapsed)),
            _ => {}
        },
        PipelineEvent::Evaluated { model, metrics } => {
            println!(
                "    {} {}",
                muted(&format!("{} R² Score:", model)),
                r2_text(metrics.r2).white().bold()
            );
        }
        PipelineEvent::Selected(selection) => {
            step_ok(&format!("Best model selected: {}", selection.choice.to_string().cyan()));
        }
        _ => {}
    })?;

    let config = pipeline.config();
    step_ok(&format!(
        "Successfully saved '{}' and '{}'",
        config.model_output_path.display(),
        config.scaler_output_path.display()
    ));

    print_report(&outcome.report);
    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!();
    line_box_top();
    line_box(&kv("Rows", &report.n_rows.to_string()));
    line_box(&kv("Train / test", &format!("{} / {}", report.n_train, report.n_test)));
    if report.dropped_rows > 0 {
        line_box(&kv("Dropped (no target)", &report.dropped_rows.to_string()));
    }
    let imputed: usize = report.imputed_cells.iter().map(|(_, n)| n).sum();
    line_box(&kv("Imputed cells", &imputed.to_string()));
    line_box_sep();
    line_box(&kv("Linear Regression R²", &r2_text(report.linear_metrics.r2)));
    line_box(&kv("Random Forest R²", &r2_text(report.forest_metrics.r2)));
    line_box(&kv("Selected", &report.selection.choice.to_string()));
    if !report.feature_importances.is_empty() {
        line_box_sep();
        for (name, importance) in &report.feature_importances {
            line_box(&kv(name, &format!("{:.4}", importance)));
        }
    }
    line_box_bottom();
    println!();
}

pub fn cmd_predict(
    data_path: &Path,
    model_path: &Path,
    scaler_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model and scaler");
    let predictor = Predictor::load(model_path, scaler_path, None)?;
    step_done(&predictor.choice().to_string());
    let selection = predictor.selection();
    println!(
        "    {} {}",
        muted("Trained"),
        predictor.trained_at().format("%Y-%m-%d %H:%M:%S UTC").to_string().white()
    );
    println!(
        "    {} {}",
        muted("Held-out R²"),
        format!(
            "linear {} · forest {}",
            r2_text(selection.linear_r2),
            r2_text(selection.forest_r2)
        )
        .white()
    );

    step_run("Loading dataset");
    let mut df = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let predictions = predictor.predict_frame(&df)?;

    match output {
        Some(path) => {
            let column = Column::new(
                "predicted_happiness_score".into(),
                predictions.to_vec(),
            );
            df.with_column(column)?;
            DataSaver::save_csv(&mut df, path)?;
            step_ok(&format!("Wrote {} predictions to '{}'", predictions.len(), path.display()));
        }
        None => {
            println!();
            for (i, value) in predictions.iter().enumerate() {
                println!("  {:>6}  {}", dim(&i.to_string()), format!("{:.4}", value).white());
            }
        }
    }

    println!();
    Ok(())
}
