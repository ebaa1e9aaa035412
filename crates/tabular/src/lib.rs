//! Tabular fare regressor.
//!
//! Turns engineered rides into categorical/continuous/target tensors, trains
//! an embedding + MLP network on them with RMSE loss and Adam, and evaluates
//! on a held-out slice.

pub mod model;
pub mod training;
