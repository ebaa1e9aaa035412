//! Taxi ride data: CSV loading, feature engineering and categorical encoding.
//!
//! Rides are read as [`RideRecord`]s, turned into [`EngineeredRide`]s with a
//! trip distance and time-of-day buckets, then encoded column by column with
//! [`RideEncoders`].

pub mod encoding;
pub mod features;
pub mod reader;
pub mod types;

pub use encoding::{CategoryEncoder, RideEncoders};
pub use features::{engineer, engineer_all, haversine_km, parse_pickup_timestamp, to_eastern};
pub use reader::RideReader;
pub use types::{Category, EngineeredRide, GeoPoint, Hour, RideError, RideRecord, Rush, Weekday};
