mod config;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::CliOverrides;
use pipeline::TrainArgs;

/// taxi-fare: train a tabular fare regressor on NYC taxi rides.
#[derive(Parser)]
#[command(name = "taxi-fare", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train on a ride CSV and report the held-out RMSE.
    Train {
        /// Path to the ride CSV file.
        #[arg(long)]
        data: PathBuf,
        /// Path to a fare config TOML file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the number of training epochs.
        #[arg(long)]
        epochs: Option<usize>,
        /// Override the number of leading rows used for train + test.
        #[arg(long)]
        batch_rows: Option<usize>,
        /// Override the held-out fraction of `batch_rows`.
        #[arg(long)]
        test_fraction: Option<f64>,
        /// Override the Adam learning rate.
        #[arg(long)]
        lr: Option<f64>,
        /// Override the RNG seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Directory to save the trained model, configs and metadata into.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            data,
            config,
            epochs,
            batch_rows,
            test_fraction,
            lr,
            seed,
            output_dir,
        } => pipeline::run_train(TrainArgs {
            data,
            config,
            overrides: CliOverrides {
                epochs,
                batch_rows,
                test_fraction,
                lr,
                seed,
            },
            output_dir,
        }),
    }
}
