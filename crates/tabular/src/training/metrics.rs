//! Training/evaluation metrics with health checks.

use std::fmt;

/// Which side of the TRAIN → EVAL transition a model is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Autodiff backend: gradients tracked, dropout and batch statistics active.
    Train,
    /// Inner backend via `AutodiffModule::valid()`: no gradients, inference behaviour.
    Eval,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Eval => write!(f, "eval"),
        }
    }
}

/// Loss recorded for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Training RMSE before this epoch's optimizer step.
    pub loss: f64,
}

impl EpochMetrics {
    /// Check for signs of a diverging run.
    pub fn health_check(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.loss.is_finite() {
            warnings.push(format!("loss is {} at epoch {}", self.loss, self.epoch));
        }
        warnings
    }
}

/// Per-epoch loss history from one training run.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    /// Loss values in epoch order.
    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.loss).collect()
    }

    pub fn first_loss(&self) -> Option<f64> {
        self.epochs.first().map(|m| m.loss)
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(|m| m.loss)
    }

    /// True when every recorded loss is finite.
    pub fn all_finite(&self) -> bool {
        self.epochs.iter().all(|m| m.loss.is_finite())
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

/// One prediction next to its ground truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionSample {
    pub predicted: f64,
    pub actual: f64,
}

impl fmt::Display for PredictionSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Predicted: {:8.2} | Actual: {:8.2}",
            self.predicted, self.actual
        )
    }
}

/// Result of the held-out evaluation pass.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Test-set RMSE.
    pub rmse: f64,
    /// Number of test rows evaluated.
    pub rows: usize,
    /// The first few (prediction, actual) pairs, in row order.
    pub samples: Vec<PredictionSample>,
}
