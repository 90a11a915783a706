//! happiness - train and compare happiness-score regressors

use clap::Parser;
use happiness_model::cli::{cmd_predict, cmd_train, Cli, Commands, TrainArgs};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "happiness_model=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Train(args)) => {
            cmd_train(&args)?;
        }
        Some(Commands::Predict { data, model, scaler, output }) => {
            cmd_predict(&data, &model, &scaler, output.as_deref())?;
        }
        None => {
            // no subcommand: one training run with the stock configuration
            cmd_train(&TrainArgs::default())?;
        }
    }

    Ok(())
}
