//! Lenient timestamp handling for values coming from the HR backend.
//!
//! The backend mostly sends RFC 3339 strings (`2026-10-14T09:00:00.000Z`) but older records
//! carry offset-less ISO 8601 values or unix milliseconds. Everything ends up as a UTC
//! `OffsetDateTime`; anything else is a `TimestampError` and the caller decides the fallback.

use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::warn;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,

    #[error("unrecognised timestamp {0:?}")]
    Invalid(String),
}

pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, TimestampError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(v) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(v.to_offset(UtcOffset::UTC));
    }

    if let Ok(v) = OffsetDateTime::parse(value, &Iso8601::DEFAULT) {
        return Ok(v.to_offset(UtcOffset::UTC));
    }

    if let Ok(v) = PrimitiveDateTime::parse(value, &Iso8601::DEFAULT) {
        return Ok(v.assume_utc());
    }

    if let Ok(millis) = value.parse::<i64>() {
        return OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
            .map_err(|_| TimestampError::Invalid(value.into()));
    }

    Err(TimestampError::Invalid(value.into()))
}

/// Parse an optional value. A missing value is `None`, a malformed one is logged and also `None`.
pub fn parse_optional(value: Option<&str>) -> Option<OffsetDateTime> {
    let value = value?;
    match parse_timestamp(value) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!("ignoring timestamp from server: {err}");
            None
        }
    }
}

/// Parse a value the caller can not do without, substituting `fallback` when it is missing or
/// malformed.
pub fn parse_timestamp_or(value: Option<&str>, fallback: OffsetDateTime) -> OffsetDateTime {
    match value.map(parse_timestamp) {
        Some(Ok(v)) => v,
        Some(Err(err)) => {
            warn!("{err}, falling back to {fallback}");
            fallback
        }
        None => fallback,
    }
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.to_string())
}

/// Wall clock time of day, e.g. "09:05".
pub fn format_time_of_day(value: OffsetDateTime) -> String {
    value
        .format(format_description!("[hour]:[minute]"))
        .unwrap_or_else(|_| value.time().to_string())
}

/// Day key in the same `YYYY-MM-DD` shape the backend uses for attendance records.
pub fn date_key(value: OffsetDateTime) -> String {
    value.to_offset(UtcOffset::UTC).date().to_string()
}
