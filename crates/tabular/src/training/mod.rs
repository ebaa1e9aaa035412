//! Training pipeline: tensor building and train/test split, RMSE loss,
//! metrics with health checks, and the Adam training loop.

pub mod data;
pub mod loss;
pub mod metrics;
pub mod trainer;
