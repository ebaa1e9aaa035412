//! Data types for ride records, engineered features and categorical columns.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Errors raised while loading or engineering ride data.
#[derive(Debug, thiserror::Error)]
pub enum RideError {
    /// IO error opening or reading the CSV source.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed CSV row or a value that does not match its column type.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column was empty for the given row.
    #[error("Row {row}: missing value for `{column}`")]
    MissingField { row: usize, column: &'static str },

    /// The pickup timestamp could not be parsed as a datetime.
    #[error("Row {row}: unparsable pickup timestamp {value:?}")]
    Timestamp { row: usize, value: String },

    /// A category was encoded that the encoder never saw during `fit`.
    #[error("Unknown category {value:?} for column `{column}`")]
    UnknownCategory { column: &'static str, value: String },

    /// No rows to fit or build from.
    #[error("Dataset is empty")]
    Empty,
}

/// A single taxi trip as it appears in the source CSV.
///
/// Coordinates are optional at this stage so that a blank cell surfaces as
/// [`RideError::MissingField`] during feature engineering instead of an
/// opaque CSV type error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RideRecord {
    /// Pickup time as written in the source, e.g. `2010-04-19 08:17:56 UTC`.
    pub pickup_datetime: String,
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    pub dropoff_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
    pub passenger_count: u32,
    /// Fare in dollars. The regression target.
    pub fare_amount: f64,
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A ride with its derived features attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredRide {
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub passenger_count: u32,
    pub fare_amount: f64,
    /// Parsed pickup time in UTC.
    pub pickup_utc: DateTime<Utc>,
    /// Pickup time shifted to (approximate) New York local time.
    pub eastern_time: NaiveDateTime,
    /// Great-circle distance between pickup and dropoff.
    pub dist_km: f64,
    pub hour: Hour,
    pub weekday: Weekday,
    pub rush: Rush,
}

impl EngineeredRide {
    /// Continuous features in model column order:
    /// pickup_lat, pickup_lon, dropoff_lat, dropoff_lon, passenger_count, dist_km.
    pub fn continuous_features(&self) -> [f64; 6] {
        [
            self.pickup.lat,
            self.pickup.lon,
            self.dropoff.lat,
            self.dropoff.lon,
            self.passenger_count as f64,
            self.dist_km,
        ]
    }
}

/// A categorical column with a closed set of values.
///
/// `Ord` defines the code order used by [`crate::encoding::CategoryEncoder`].
pub trait Category: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display {
    /// Column name, used in error messages and logs.
    const COLUMN: &'static str;

    /// Every value this column may take.
    fn values() -> &'static [Self];
}

/// Hour of day, 0..=23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

static HOURS: [Hour; 24] = {
    let mut out = [Hour(0); 24];
    let mut i = 0;
    while i < 24 {
        out[i] = Hour(i as u8);
        i += 1;
    }
    out
};

impl Hour {
    /// Returns `None` outside 0..=23.
    pub fn new(hour: u8) -> Option<Self> {
        (hour < 24).then_some(Self(hour))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Category for Hour {
    const COLUMN: &'static str = "hour";

    fn values() -> &'static [Self] {
        &HOURS
    }
}

/// Time-of-day traffic bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rush {
    AmRush,
    PmRush,
    Regular,
}

impl Rush {
    /// Bucket an hour: 8..=9 is morning rush, 15..=19 is evening rush.
    pub fn from_hour(hour: Hour) -> Self {
        match hour.get() {
            8..=9 => Self::AmRush,
            15..=19 => Self::PmRush,
            _ => Self::Regular,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AmRush => "am_rush",
            Self::PmRush => "pm_rush",
            Self::Regular => "regular",
        }
    }
}

impl fmt::Display for Rush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Category for Rush {
    const COLUMN: &'static str = "rush";

    fn values() -> &'static [Self] {
        &[Self::AmRush, Self::PmRush, Self::Regular]
    }
}

/// Day of week, displayed as its three-letter abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub fn abbrev(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Mon,
            chrono::Weekday::Tue => Self::Tue,
            chrono::Weekday::Wed => Self::Wed,
            chrono::Weekday::Thu => Self::Thu,
            chrono::Weekday::Fri => Self::Fri,
            chrono::Weekday::Sat => Self::Sat,
            chrono::Weekday::Sun => Self::Sun,
        }
    }
}

// Ordered by abbreviation, so codes follow lexical category order.
impl Ord for Weekday {
    fn cmp(&self, other: &Self) -> Ordering {
        self.abbrev().cmp(other.abbrev())
    }
}

impl PartialOrd for Weekday {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

impl Category for Weekday {
    const COLUMN: &'static str = "weekday";

    fn values() -> &'static [Self] {
        &[
            Self::Mon,
            Self::Tue,
            Self::Wed,
            Self::Thu,
            Self::Fri,
            Self::Sat,
            Self::Sun,
        ]
    }
}
