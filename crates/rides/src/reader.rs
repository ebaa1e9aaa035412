//! Reads ride records from CSV.

use std::io::Read;
use std::path::Path;

use crate::features::engineer_all;
use crate::types::{EngineeredRide, RideError, RideRecord};

/// Static methods for loading ride data.
pub struct RideReader;

impl RideReader {
    /// Read every ride from a CSV file with a header row.
    ///
    /// Columns are matched by name; extra columns such as `fare_class` are
    /// ignored.
    pub fn read_all(path: &Path) -> Result<Vec<RideRecord>, RideError> {
        let file = std::fs::File::open(path)?;
        let records = Self::from_reader(file)?;

        tracing::info!(
            count = records.len(),
            path = %path.display(),
            "Read ride records"
        );
        Ok(records)
    }

    /// Read rides from any CSV source.
    pub fn from_reader<R: Read>(source: R) -> Result<Vec<RideRecord>, RideError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let records = reader
            .deserialize::<RideRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Read a CSV file and engineer features for every row.
    pub fn read_engineered(path: &Path) -> Result<Vec<EngineeredRide>, RideError> {
        let records = Self::read_all(path)?;
        if records.is_empty() {
            return Err(RideError::Empty);
        }
        engineer_all(&records)
    }
}
