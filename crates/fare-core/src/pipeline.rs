//! Fare training pipeline: CSV → features → tensors → train → evaluate → print.

use std::path::PathBuf;
use std::time::Instant;

use burn::backend::ndarray::NdArray;
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use rides::{EngineeredRide, RideEncoders, RideReader};
use tabular::model::tabular::{TabularModel, TabularModelConfig};
use tabular::training::data::FareTensors;
use tabular::training::metrics::{EvaluationReport, TrainingReport};
use tabular::training::trainer::{
    evaluate, init_model, save_checkpoint, train, CheckpointMeta, FareTrainingConfig,
};

use crate::config::{build_training_config, load_fare_toml, CliOverrides};

/// Backend used by the CLI: CPU ndarray with autodiff.
pub type TrainBackend = Autodiff<NdArray<f32>>;

/// Arguments for the `train` subcommand.
#[derive(Debug)]
pub struct TrainArgs {
    /// Path to the ride CSV.
    pub data: PathBuf,
    /// Optional TOML config file.
    pub config: Option<PathBuf>,
    /// CLI training overrides.
    pub overrides: CliOverrides,
    /// Directory to save the trained model into. Nothing is saved when `None`.
    pub output_dir: Option<PathBuf>,
}

/// Everything produced by one training run.
pub struct FareRun<B: AutodiffBackend> {
    pub model: TabularModel<B>,
    pub model_config: TabularModelConfig,
    pub training: TrainingReport,
    pub evaluation: EvaluationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fit encoders, build tensors, train and evaluate on already-engineered rides.
pub fn train_on_rides<B: AutodiffBackend>(
    config: &FareTrainingConfig,
    rides: &[EngineeredRide],
    device: &B::Device,
) -> anyhow::Result<FareRun<B>> {
    let encoders = RideEncoders::fit(rides)?;
    let tensors = FareTensors::build(rides, &encoders)?;
    let (train_set, test_set) = tensors.train_test_split(config.batch_rows, config.test_fraction)?;

    let model_config = config.model_config(&encoders);
    let model = init_model::<B>(config, &model_config, device);
    println!("{model}");

    let (model, training) = train(config, model, &train_set, device)?;

    // Manual TRAIN → EVAL transition: drop autodiff for the held-out pass.
    let eval_model = model.valid();
    let evaluation = evaluate(&eval_model, &test_set, config.sample_count, device)?;

    Ok(FareRun {
        model,
        model_config,
        training,
        evaluation,
        train_rows: train_set.rows(),
        test_rows: test_set.rows(),
    })
}

/// Run the full training pipeline from a CSV file.
pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    // 1. Load config
    let overrides = match &args.config {
        Some(path) => load_fare_toml(path)?.training,
        None => Default::default(),
    };
    let config = build_training_config(&overrides, &args.overrides);
    tracing::info!(
        epochs = config.epochs,
        batch_rows = config.batch_rows,
        test_fraction = config.test_fraction,
        lr = config.lr,
        seed = config.seed,
        "Training config"
    );

    // 2. Load rides and engineer features
    let rides = RideReader::read_engineered(&args.data)?;

    // 3. Train and evaluate
    let device = Default::default();
    let run = train_on_rides::<TrainBackend>(&config, &rides, &device)?;

    // 4. Print results
    println!("Test loss is {:.6}", run.evaluation.rmse);
    for sample in &run.evaluation.samples {
        println!("{sample}");
    }

    // 5. Optionally save
    if let Some(dir) = &args.output_dir {
        let meta = CheckpointMeta {
            epochs: config.epochs,
            train_rows: run.train_rows,
            test_rows: run.test_rows,
            final_train_loss: run.training.final_loss(),
            test_rmse: Some(run.evaluation.rmse),
        };
        save_checkpoint(dir, &run.model, &run.model_config, &config, &meta)?;
    }

    // 6. Summary
    let elapsed = start.elapsed();
    println!("\n--- Training Summary ---");
    println!("Rows: {} train / {} test", run.train_rows, run.test_rows);
    if let Some(loss) = run.training.final_loss() {
        println!("Final train loss: {loss:.4}");
    }
    println!("Test RMSE: {:.4}", run.evaluation.rmse);
    println!("Parameters: {}", run.model.num_params());
    if let Some(dir) = &args.output_dir {
        println!("Output: {}", dir.display());
    }
    println!("Time: {:.1}s", elapsed.as_secs_f64());

    Ok(())
}
