//! Categorical encoders: fit a code table from observed values, then apply it.
//!
//! Codes are dense (`0..cardinality`) and follow the category's `Ord`, so the
//! same set of observed values always yields the same mapping regardless of
//! row order.

use std::collections::{BTreeSet, HashMap};

use crate::types::{Category, EngineeredRide, Hour, RideError, Rush, Weekday};

/// Code table for a single categorical column.
#[derive(Debug, Clone)]
pub struct CategoryEncoder<C: Category> {
    categories: Vec<C>,
    codes: HashMap<C, i64>,
}

impl<C: Category> CategoryEncoder<C> {
    /// Build the code table from the distinct values present in `values`.
    pub fn fit(values: impl IntoIterator<Item = C>) -> Self {
        let categories: Vec<C> = values.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let codes = categories
            .iter()
            .enumerate()
            .map(|(code, &c)| (c, code as i64))
            .collect();
        Self { categories, codes }
    }

    /// Code for `value`, or [`RideError::UnknownCategory`] if it was not seen in `fit`.
    pub fn encode(&self, value: C) -> Result<i64, RideError> {
        self.codes
            .get(&value)
            .copied()
            .ok_or_else(|| RideError::UnknownCategory {
                column: C::COLUMN,
                value: value.to_string(),
            })
    }

    pub fn decode(&self, code: i64) -> Option<C> {
        usize::try_from(code).ok().and_then(|i| self.categories.get(i).copied())
    }

    /// Number of distinct categories observed.
    pub fn cardinality(&self) -> usize {
        self.categories.len()
    }

    /// Observed categories in code order.
    pub fn categories(&self) -> &[C] {
        &self.categories
    }
}

/// The three categorical encoders used by the fare model, in column order
/// hour, rush, weekday.
#[derive(Debug, Clone)]
pub struct RideEncoders {
    pub hour: CategoryEncoder<Hour>,
    pub rush: CategoryEncoder<Rush>,
    pub weekday: CategoryEncoder<Weekday>,
}

impl RideEncoders {
    /// Column names in code order.
    pub const COLUMNS: [&'static str; 3] = [Hour::COLUMN, Rush::COLUMN, Weekday::COLUMN];

    /// Fit all encoders on the full dataset.
    pub fn fit(rides: &[EngineeredRide]) -> Result<Self, RideError> {
        if rides.is_empty() {
            return Err(RideError::Empty);
        }
        let encoders = Self {
            hour: CategoryEncoder::fit(rides.iter().map(|r| r.hour)),
            rush: CategoryEncoder::fit(rides.iter().map(|r| r.rush)),
            weekday: CategoryEncoder::fit(rides.iter().map(|r| r.weekday)),
        };
        tracing::debug!(
            hour = encoders.hour.cardinality(),
            rush = encoders.rush.cardinality(),
            weekday = encoders.weekday.cardinality(),
            "Fitted category encoders"
        );
        Ok(encoders)
    }

    /// Encode one ride's categorical columns.
    pub fn apply(&self, ride: &EngineeredRide) -> Result<[i64; 3], RideError> {
        Ok([
            self.hour.encode(ride.hour)?,
            self.rush.encode(ride.rush)?,
            self.weekday.encode(ride.weekday)?,
        ])
    }

    /// Distinct category count per column.
    pub fn cardinalities(&self) -> [usize; 3] {
        [
            self.hour.cardinality(),
            self.rush.cardinality(),
            self.weekday.cardinality(),
        ]
    }
}
