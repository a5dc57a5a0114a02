//! Timestamp normalization
//!
//! External sources publish timestamps in mixed shapes: RFC 3339 with an
//! offset, RFC 3339 `Z`, or naive `YYYY-MM-DDTHH:MM:SS`. Everything is
//! forced to a UTC-aware `DateTime<Utc>` at the serde boundary; a naive
//! value is assumed to already be UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a timestamp string into a UTC datetime.
///
/// Accepts RFC 3339 (any offset, converted to UTC) and naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` (assumed UTC).
pub fn parse_utc(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(format!("unrecognized timestamp '{raw}'"))
}

/// Serde adapter for `DateTime<Utc>` fields fed by external sources.
pub mod datetime_utc {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        parse_utc(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
pub mod datetime_utc_opt {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        ser: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => {
                ser.serialize_some(&dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            }
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(de)?;
        match raw {
            Some(raw) => parse_utc(&raw).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
