//! Tensor building for fare training.
//!
//! Encodes engineered rides into three row-aligned host matrices
//! (categorical codes, continuous features, targets) and splits them into a
//! training prefix and a test suffix. Rows keep their source order; the input
//! is expected to be shuffled upstream.

use std::ops::Range;

use burn::prelude::*;

use rides::{EngineeredRide, RideEncoders, RideError};

use crate::model::bridge::{codes_to_tensor, features_to_tensor};
use crate::model::tabular::EmbeddingSize;

/// Categorical columns, in tensor column order.
pub const CATEGORICAL_COLUMNS: [&str; 3] = RideEncoders::COLUMNS;

/// Continuous columns, in tensor column order.
pub const CONTINUOUS_COLUMNS: [&str; 6] = [
    "pickup_latitude",
    "pickup_longitude",
    "dropoff_latitude",
    "dropoff_longitude",
    "passenger_count",
    "dist_km",
];

/// Regression target column.
pub const TARGET_COLUMN: &str = "fare_amount";

/// Upper bound on any embedding width.
pub const MAX_EMBEDDING_DIM: usize = 50;

/// Embedding width for a column with `distinct_count` categories:
/// `min(50, (distinct_count + 1) / 2)`.
pub fn embedding_dim(distinct_count: usize) -> usize {
    MAX_EMBEDDING_DIM.min((distinct_count + 1) / 2)
}

/// Embedding sizes for the fitted encoders, in categorical column order.
pub fn embedding_sizes(encoders: &RideEncoders) -> Vec<EmbeddingSize> {
    encoders
        .cardinalities()
        .into_iter()
        .map(|cardinality| EmbeddingSize {
            cardinality,
            dim: embedding_dim(cardinality),
        })
        .collect()
}

/// Train/test row counts for the first `batch_rows` rows.
///
/// `test = floor(batch_rows * test_fraction)`, `train = batch_rows - test`.
pub fn split_sizes(batch_rows: usize, test_fraction: f64) -> (usize, usize) {
    let test = ((batch_rows as f64) * test_fraction).floor() as usize;
    let test = test.min(batch_rows);
    (batch_rows - test, test)
}

/// Row-aligned categorical/continuous/target matrices kept on the host.
#[derive(Debug, Clone, PartialEq)]
pub struct FareTensors {
    rows: usize,
    /// Row-major `(rows, 3)` category codes.
    categorical: Vec<i64>,
    /// Row-major `(rows, 6)` continuous features.
    continuous: Vec<f32>,
    /// `(rows, 1)` fares.
    targets: Vec<f32>,
}

/// A [`FareTensors`] slice materialized as burn tensors on a device.
#[derive(Debug, Clone)]
pub struct FareBatch<B: Backend> {
    /// `(rows, 3)` integer codes.
    pub categorical: Tensor<B, 2, Int>,
    /// `(rows, 6)` features.
    pub continuous: Tensor<B, 2>,
    /// `(rows, 1)` targets.
    pub targets: Tensor<B, 2>,
}

impl FareTensors {
    pub const N_CATEGORICAL: usize = CATEGORICAL_COLUMNS.len();
    pub const N_CONTINUOUS: usize = CONTINUOUS_COLUMNS.len();

    /// Encode every ride with `encoders`.
    pub fn build(rides: &[EngineeredRide], encoders: &RideEncoders) -> Result<Self, RideError> {
        if rides.is_empty() {
            return Err(RideError::Empty);
        }

        let rows = rides.len();
        let mut categorical = Vec::with_capacity(rows * Self::N_CATEGORICAL);
        let mut continuous = Vec::with_capacity(rows * Self::N_CONTINUOUS);
        let mut targets = Vec::with_capacity(rows);

        for ride in rides {
            categorical.extend_from_slice(&encoders.apply(ride)?);
            continuous.extend(ride.continuous_features().iter().map(|&v| v as f32));
            targets.push(ride.fare_amount as f32);
        }

        tracing::debug!(
            rows,
            categorical = Self::N_CATEGORICAL,
            continuous = Self::N_CONTINUOUS,
            "Built fare tensors"
        );
        Ok(Self {
            rows,
            categorical,
            continuous,
            targets,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn categorical_shape(&self) -> [usize; 2] {
        [self.categorical.len() / Self::N_CATEGORICAL, Self::N_CATEGORICAL]
    }

    pub fn continuous_shape(&self) -> [usize; 2] {
        [self.continuous.len() / Self::N_CONTINUOUS, Self::N_CONTINUOUS]
    }

    pub fn target_shape(&self) -> [usize; 2] {
        [self.targets.len(), 1]
    }

    /// Codes for one row: hour, rush, weekday.
    pub fn categorical_row(&self, row: usize) -> &[i64] {
        let n = Self::N_CATEGORICAL;
        &self.categorical[row * n..(row + 1) * n]
    }

    /// Continuous features for one row.
    pub fn continuous_row(&self, row: usize) -> &[f32] {
        let n = Self::N_CONTINUOUS;
        &self.continuous[row * n..(row + 1) * n]
    }

    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    /// Copy out rows `range`, preserving order.
    ///
    /// # Panics
    /// Panics if `range` extends past `rows()`.
    pub fn slice(&self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.rows,
            "row range {range:?} out of bounds for {} rows",
            self.rows
        );
        let (c, f) = (Self::N_CATEGORICAL, Self::N_CONTINUOUS);
        Self {
            rows: range.len(),
            categorical: self.categorical[range.start * c..range.end * c].to_vec(),
            continuous: self.continuous[range.start * f..range.end * f].to_vec(),
            targets: self.targets[range.clone()].to_vec(),
        }
    }

    /// Split the first `batch_rows` rows into `(train, test)`.
    ///
    /// The training set is the prefix, the test set the following
    /// `floor(batch_rows * test_fraction)` rows. No shuffling.
    pub fn train_test_split(&self, batch_rows: usize, test_fraction: f64) -> anyhow::Result<(Self, Self)> {
        if !(0.0..1.0).contains(&test_fraction) {
            anyhow::bail!("test_fraction must be in [0, 1), got {test_fraction}");
        }
        if batch_rows > self.rows {
            anyhow::bail!(
                "batch_rows ({batch_rows}) exceeds the {} rows available",
                self.rows
            );
        }
        let (train, test) = split_sizes(batch_rows, test_fraction);
        if train == 0 || test == 0 {
            anyhow::bail!(
                "split of {batch_rows} rows at test_fraction {test_fraction} leaves an empty set \
                 (train={train}, test={test})"
            );
        }

        tracing::info!(train, test, available = self.rows, "Split fare tensors");
        Ok((self.slice(0..train), self.slice(train..batch_rows)))
    }

    /// Materialize all rows as burn tensors.
    pub fn to_batch<B: Backend>(&self, device: &B::Device) -> FareBatch<B> {
        FareBatch {
            categorical: codes_to_tensor::<B>(&self.categorical, self.rows, Self::N_CATEGORICAL, device),
            continuous: features_to_tensor::<B>(&self.continuous, self.rows, Self::N_CONTINUOUS, device),
            targets: features_to_tensor::<B>(&self.targets, self.rows, 1, device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use rides::{engineer, RideRecord};

    type TestBackend = NdArray<f32>;

    fn rides(n: usize) -> Vec<EngineeredRide> {
        (0..n)
            .map(|i| {
                let record = RideRecord {
                    pickup_datetime: format!("2010-04-{:02} {:02}:05:00 UTC", 10 + i % 7, (i * 5) % 24),
                    pickup_latitude: Some(40.73 + i as f64 * 1e-3),
                    pickup_longitude: Some(-73.99),
                    dropoff_latitude: Some(40.75),
                    dropoff_longitude: Some(-73.97 - i as f64 * 1e-3),
                    passenger_count: 1 + (i % 3) as u32,
                    fare_amount: 5.0 + i as f64,
                };
                engineer(&record, i).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_embedding_dim_formula() {
        assert_eq!(embedding_dim(1), 1);
        assert_eq!(embedding_dim(2), 1);
        assert_eq!(embedding_dim(3), 2);
        assert_eq!(embedding_dim(7), 4);
        assert_eq!(embedding_dim(24), 12);
        assert_eq!(embedding_dim(99), 50);
        assert_eq!(embedding_dim(100), 50);
        assert_eq!(embedding_dim(1000), 50);
    }

    #[test]
    fn test_split_sizes() {
        assert_eq!(split_sizes(6000, 0.2), (4800, 1200));
        assert_eq!(split_sizes(10, 0.25), (8, 2));
        assert_eq!(split_sizes(7, 0.0), (7, 0));
        for n in [1, 9, 101, 6000, 120_000] {
            let (train, test) = split_sizes(n, 0.2);
            assert_eq!(train + test, n);
        }
    }

    #[test]
    fn test_build_row_counts_match() {
        let rides = rides(20);
        let encoders = RideEncoders::fit(&rides).unwrap();
        let tensors = FareTensors::build(&rides, &encoders).unwrap();

        assert_eq!(tensors.rows(), 20);
        assert_eq!(tensors.categorical_shape(), [20, 3]);
        assert_eq!(tensors.continuous_shape(), [20, 6]);
        assert_eq!(tensors.target_shape(), [20, 1]);
    }

    #[test]
    fn test_build_preserves_row_order() {
        let rides = rides(6);
        let encoders = RideEncoders::fit(&rides).unwrap();
        let tensors = FareTensors::build(&rides, &encoders).unwrap();

        for (i, ride) in rides.iter().enumerate() {
            assert_eq!(tensors.targets()[i], ride.fare_amount as f32);
            assert_eq!(tensors.categorical_row(i), encoders.apply(ride).unwrap());
            assert_eq!(tensors.continuous_row(i)[5], ride.dist_km as f32);
            assert_eq!(tensors.continuous_row(i)[4], ride.passenger_count as f32);
        }
    }

    #[test]
    fn test_build_empty() {
        let rides = rides(3);
        let encoders = RideEncoders::fit(&rides).unwrap();
        assert!(matches!(FareTensors::build(&[], &encoders), Err(RideError::Empty)));
    }

    #[test]
    fn test_train_test_split() {
        let rides = rides(30);
        let encoders = RideEncoders::fit(&rides).unwrap();
        let tensors = FareTensors::build(&rides, &encoders).unwrap();

        let (train, test) = tensors.train_test_split(25, 0.2).unwrap();
        assert_eq!(train.rows(), 20);
        assert_eq!(test.rows(), 5);
        // Test set starts right after the training prefix; rows 25.. are unused.
        assert_eq!(train.targets()[0], tensors.targets()[0]);
        assert_eq!(test.targets()[0], tensors.targets()[20]);
        assert_eq!(test.targets()[4], tensors.targets()[24]);
    }

    #[test]
    fn test_split_rejects_bad_arguments() {
        let rides = rides(10);
        let encoders = RideEncoders::fit(&rides).unwrap();
        let tensors = FareTensors::build(&rides, &encoders).unwrap();

        assert!(tensors.train_test_split(11, 0.2).is_err());
        assert!(tensors.train_test_split(10, 1.0).is_err());
        assert!(tensors.train_test_split(10, -0.1).is_err());
        assert!(tensors.train_test_split(4, 0.2).is_err()); // test = 0
    }

    #[test]
    fn test_to_batch_shapes() {
        let device = Default::default();
        let rides = rides(9);
        let encoders = RideEncoders::fit(&rides).unwrap();
        let tensors = FareTensors::build(&rides, &encoders).unwrap();

        let batch = tensors.to_batch::<TestBackend>(&device);
        assert_eq!(batch.categorical.dims(), [9, 3]);
        assert_eq!(batch.continuous.dims(), [9, 6]);
        assert_eq!(batch.targets.dims(), [9, 1]);
    }

    #[test]
    fn test_embedding_sizes_follow_cardinality() {
        let rides = rides(24);
        let encoders = RideEncoders::fit(&rides).unwrap();
        let sizes = embedding_sizes(&encoders);

        assert_eq!(sizes.len(), CATEGORICAL_COLUMNS.len());
        for (size, cardinality) in sizes.iter().zip(encoders.cardinalities()) {
            assert_eq!(size.cardinality, cardinality);
            assert_eq!(size.dim, embedding_dim(cardinality));
        }
    }
}
