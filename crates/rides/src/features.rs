//! Feature engineering: trip distance and time-of-day buckets.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike, Utc};

use crate::types::{EngineeredRide, GeoPoint, Hour, RideError, RideRecord, Rush};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Fixed offset from UTC to New York local time.
///
/// NOTE: this is EDT all year round. Rides recorded under EST (November to
/// March) land one hour late. Left unchanged so results stay comparable
/// with existing runs.
pub const EASTERN_OFFSET_HOURS: i64 = 4;

/// Great-circle distance in kilometres between two points given in degrees.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Shift a UTC timestamp to approximate Eastern time.
pub fn to_eastern(utc: DateTime<Utc>) -> NaiveDateTime {
    (utc - Duration::hours(EASTERN_OFFSET_HOURS)).naive_utc()
}

/// Parse a pickup timestamp into UTC.
///
/// Accepts `2010-04-19 08:17:56 UTC`, the same without the suffix, a `T`
/// separator, a trailing `Z`, fractional seconds, and RFC 3339 with an
/// explicit offset. Returns `None` for anything else.
pub fn parse_pickup_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let s = s
        .strip_suffix("UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s)
        .trim_end();

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn require(value: Option<f64>, row: usize, column: &'static str) -> Result<f64, RideError> {
    value.ok_or(RideError::MissingField { row, column })
}

/// Derive distance and time features for one ride.
///
/// `row` is the zero-based data row, used only in error messages.
pub fn engineer(record: &RideRecord, row: usize) -> Result<EngineeredRide, RideError> {
    let pickup = GeoPoint::new(
        require(record.pickup_latitude, row, "pickup_latitude")?,
        require(record.pickup_longitude, row, "pickup_longitude")?,
    );
    let dropoff = GeoPoint::new(
        require(record.dropoff_latitude, row, "dropoff_latitude")?,
        require(record.dropoff_longitude, row, "dropoff_longitude")?,
    );

    let pickup_utc =
        parse_pickup_timestamp(&record.pickup_datetime).ok_or_else(|| RideError::Timestamp {
            row,
            value: record.pickup_datetime.clone(),
        })?;
    let eastern_time = to_eastern(pickup_utc);
    // chrono guarantees hour() < 24
    let hour = Hour::new(eastern_time.hour() as u8).ok_or_else(|| RideError::Timestamp {
        row,
        value: record.pickup_datetime.clone(),
    })?;

    Ok(EngineeredRide {
        pickup,
        dropoff,
        passenger_count: record.passenger_count,
        fare_amount: record.fare_amount,
        pickup_utc,
        eastern_time,
        dist_km: haversine_km(pickup, dropoff),
        hour,
        weekday: eastern_time.weekday().into(),
        rush: Rush::from_hour(hour),
    })
}

/// Engineer every record, stopping at the first invalid row.
pub fn engineer_all(records: &[RideRecord]) -> Result<Vec<EngineeredRide>, RideError> {
    let rides = records
        .iter()
        .enumerate()
        .map(|(row, record)| engineer(record, row))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(count = rides.len(), "Engineered ride features");
    Ok(rides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Weekday;

    fn record(ts: &str) -> RideRecord {
        RideRecord {
            pickup_datetime: ts.to_string(),
            pickup_latitude: Some(40.730521),
            pickup_longitude: Some(-73.992365),
            dropoff_latitude: Some(40.744746),
            dropoff_longitude: Some(-73.975499),
            passenger_count: 1,
            fare_amount: 6.5,
        }
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GeoPoint::new(40.7128, -74.0060);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = GeoPoint::new(40.730521, -73.992365);
        let b = GeoPoint::new(40.744746, -73.975499);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude along a meridian is r * pi / 180.
        let a = GeoPoint::new(40.0, -74.0);
        let b = GeoPoint::new(41.0, -74.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((haversine_km(a, b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDateTime::parse_from_str("2010-04-19 08:17:56", "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        for raw in [
            "2010-04-19 08:17:56 UTC",
            "2010-04-19 08:17:56",
            "2010-04-19T08:17:56Z",
            "2010-04-19T04:17:56-04:00",
            "  2010-04-19 08:17:56 UTC ",
        ] {
            assert_eq!(parse_pickup_timestamp(raw), Some(expected), "{raw}");
        }
        assert!(parse_pickup_timestamp("yesterday").is_none());
        assert!(parse_pickup_timestamp("").is_none());
    }

    #[test]
    fn test_engineer_shifts_to_eastern() {
        let ride = engineer(&record("2010-04-19 08:17:56 UTC"), 0).unwrap();
        assert_eq!(ride.hour.get(), 4);
        assert_eq!(ride.rush, Rush::Regular);
        assert_eq!(ride.weekday, Weekday::Mon);
    }

    #[test]
    fn test_engineer_crosses_midnight() {
        // 02:00 UTC Monday is 22:00 Sunday in the shifted clock.
        let ride = engineer(&record("2010-04-19 02:00:00 UTC"), 0).unwrap();
        assert_eq!(ride.hour.get(), 22);
        assert_eq!(ride.weekday, Weekday::Sun);
    }

    #[test]
    fn test_engineer_missing_coordinate() {
        let mut rec = record("2010-04-19 08:17:56 UTC");
        rec.dropoff_longitude = None;
        let err = engineer(&rec, 7).unwrap_err();
        assert!(
            matches!(
                err,
                RideError::MissingField {
                    row: 7,
                    column: "dropoff_longitude"
                }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn test_engineer_bad_timestamp() {
        let err = engineer(&record("not a date"), 3).unwrap_err();
        assert!(matches!(err, RideError::Timestamp { row: 3, .. }), "got {err:?}");
    }

    #[test]
    fn test_engineer_all_stops_at_first_error() {
        let records = vec![
            record("2010-04-19 08:17:56 UTC"),
            record("garbage"),
            record("also garbage"),
        ];
        let err = engineer_all(&records).unwrap_err();
        assert!(matches!(err, RideError::Timestamp { row: 1, .. }));
    }
}
