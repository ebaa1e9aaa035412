//! Fare training loop: full-batch RMSE regression with a single Adam optimizer.
//!
//! Every epoch runs one forward pass over the whole training split, records
//! the RMSE, backpropagates, and applies one optimizer step. Evaluation runs
//! once afterwards on the held-out split with the model moved off the
//! autodiff backend.

use std::path::Path;
use std::time::Instant;

use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::AutodiffBackend;

use rides::RideEncoders;

use crate::model::bridge::{tensor_to_f64, tensor_to_vec};
use crate::model::tabular::{TabularModel, TabularModelConfig};
use crate::training::data::{embedding_sizes, FareTensors};
use crate::training::loss::rmse_loss;
use crate::training::metrics::{EpochMetrics, EvaluationReport, Mode, PredictionSample, TrainingReport};

/// Metadata written next to a saved model.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct CheckpointMeta {
    pub epochs: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub final_train_loss: Option<f64>,
    pub test_rmse: Option<f64>,
}

/// Configuration for fare training.
#[derive(Config, Debug)]
pub struct FareTrainingConfig {
    /// Number of full-batch epochs.
    #[config(default = 300)]
    pub epochs: usize,
    /// Rows taken from the head of the dataset for train + test.
    #[config(default = 6000)]
    pub batch_rows: usize,
    /// Fraction of `batch_rows` held out for evaluation.
    #[config(default = 0.2)]
    pub test_fraction: f64,
    /// Fixed Adam learning rate.
    #[config(default = 1e-3)]
    pub lr: f64,
    /// Epochs between loss log lines. 0 disables epoch logging.
    #[config(default = 10)]
    pub log_interval: usize,
    /// Backend RNG seed for weight init and dropout.
    #[config(default = 3349)]
    pub seed: u64,
    /// Number of (prediction, actual) pairs kept from evaluation.
    #[config(default = 10)]
    pub sample_count: usize,
    /// Hidden layer widths of the model.
    #[config(default = "vec![200, 100]")]
    pub hidden: Vec<usize>,
    /// Dropout probability of the model.
    #[config(default = 0.4)]
    pub dropout: f64,
}

impl FareTrainingConfig {
    /// Model configuration for the fitted encoders.
    pub fn model_config(&self, encoders: &RideEncoders) -> TabularModelConfig {
        TabularModelConfig::new(embedding_sizes(encoders), FareTensors::N_CONTINUOUS)
            .with_hidden(self.hidden.clone())
            .with_dropout(self.dropout)
    }
}

/// Seed the backend and initialize a fresh model.
pub fn init_model<B: Backend>(
    config: &FareTrainingConfig,
    model_config: &TabularModelConfig,
    device: &B::Device,
) -> TabularModel<B> {
    B::seed(config.seed);
    model_config.init(device)
}

/// Run the training loop.
///
/// # Arguments
/// - `config`: training hyperparameters
/// - `model`: initialized TabularModel (consumed and returned updated)
/// - `train_set`: training rows, used as a single batch every epoch
/// - `device`: burn device for tensor operations
///
/// # Returns
/// The trained model and its per-epoch loss history.
pub fn train<B: AutodiffBackend>(
    config: &FareTrainingConfig,
    mut model: TabularModel<B>,
    train_set: &FareTensors,
    device: &B::Device,
) -> anyhow::Result<(TabularModel<B>, TrainingReport)> {
    if train_set.is_empty() {
        anyhow::bail!("Training set is empty");
    }

    let batch = train_set.to_batch::<B>(device);
    let mut optimizer = AdamConfig::new().init();
    let mut report = TrainingReport::new();
    let train_start = Instant::now();

    tracing::info!(
        mode = %Mode::Train,
        epochs = config.epochs,
        rows = train_set.rows(),
        lr = config.lr,
        "Starting training"
    );

    for epoch in 1..=config.epochs {
        let prediction = model.forward(batch.categorical.clone(), batch.continuous.clone());
        let loss = rmse_loss(prediction, batch.targets.clone());
        let loss_val = tensor_to_f64(loss.clone());

        let metrics = EpochMetrics { epoch, loss: loss_val };
        let warnings = metrics.health_check();
        if !warnings.is_empty() {
            tracing::warn!(epoch, "Health check warnings: {:?}", warnings);
        }
        report.push(metrics);

        if config.log_interval > 0 && (epoch - 1) % config.log_interval == 0 {
            tracing::info!(epoch, loss = loss_val, "Epoch: {epoch} | Loss: {loss_val:.6}");
        }

        // Gradients come fresh from each backward pass and are consumed by the
        // step, so nothing accumulates across epochs.
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(config.lr, model, grads);
    }

    tracing::info!(
        epochs = report.len(),
        final_loss = report.final_loss().unwrap_or(f64::NAN),
        elapsed_secs = format!("{:.1}", train_start.elapsed().as_secs_f64()),
        "Training loop finished"
    );

    Ok((model, report))
}

/// Evaluate on held-out rows.
///
/// Pass the inference-mode model (`trained.valid()`); on a plain backend no
/// gradients are tracked and dropout is disabled.
pub fn evaluate<B: Backend>(
    model: &TabularModel<B>,
    test_set: &FareTensors,
    sample_count: usize,
    device: &B::Device,
) -> anyhow::Result<EvaluationReport> {
    if test_set.is_empty() {
        anyhow::bail!("Test set is empty");
    }

    let batch = test_set.to_batch::<B>(device);
    let prediction = model.forward(batch.categorical, batch.continuous);
    let rmse = tensor_to_f64(rmse_loss(prediction.clone(), batch.targets));

    let samples = tensor_to_vec(prediction)?
        .into_iter()
        .zip(test_set.targets())
        .take(sample_count)
        .map(|(predicted, &actual)| PredictionSample {
            predicted,
            actual: f64::from(actual),
        })
        .collect();

    tracing::info!(mode = %Mode::Eval, rows = test_set.rows(), rmse, "Evaluation complete");

    Ok(EvaluationReport {
        rmse,
        rows: test_set.rows(),
        samples,
    })
}

/// Save model weights, both configs and run metadata into `dir`.
///
/// Writes `model.mpk`, `model_config.json`, `training_config.json` and `meta.json`.
pub fn save_checkpoint<B: Backend>(
    dir: &Path,
    model: &TabularModel<B>,
    model_config: &TabularModelConfig,
    training_config: &FareTrainingConfig,
    meta: &CheckpointMeta,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    model
        .clone()
        .save_file(dir.join("model"), &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model to {}: {e}", dir.display()))?;
    model_config.save(dir.join("model_config.json"))?;
    training_config.save(dir.join("training_config.json"))?;
    serde_json::to_writer_pretty(std::fs::File::create(dir.join("meta.json"))?, meta)?;

    tracing::info!(dir = %dir.display(), "Checkpoint saved (model + configs + meta)");
    Ok(())
}
