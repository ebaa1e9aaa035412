//! Fare model components: the embedding + MLP tabular regressor and the
//! tensor bridge between host buffers and burn tensors.

pub mod bridge;
pub mod tabular;
