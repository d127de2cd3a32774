//! Timestamp parsing and wire encoding
//!
//! Timestamps travel as 11 bytes:
//! - Byte 0: century + 100
//! - Byte 1: year within century + 100
//! - Bytes 2-3: month, day
//! - Bytes 4-6: hour + 1, minute + 1, second + 1
//! - Bytes 7-10: nanoseconds (big-endian u32)

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::constants::FieldType;
use crate::error::{Error, Result};

/// Encoded timestamp length
pub const TIMESTAMP_LENGTH: usize = 11;

/// Smallest representable year
pub const MIN_YEAR: i32 = -9999;
/// Largest representable year
pub const MAX_YEAR: i32 = 9999;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp literal
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.fraction]` (space or `T` separated),
/// `YYYY-MM-DD HH:MM`, a bare date (midnight), and RFC 3339 with an offset,
/// which is converted to UTC.
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let s = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return check_range(dt, input);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return check_range(dt, input);
        }
    }

    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => check_range(dt.naive_utc(), input),
        Err(e) => Err(Error::parse(FieldType::DateTime, input, e.to_string())),
    }
}

fn check_range(dt: NaiveDateTime, input: &str) -> Result<NaiveDateTime> {
    if (MIN_YEAR..=MAX_YEAR).contains(&dt.year()) {
        Ok(dt)
    } else {
        Err(Error::parse(
            FieldType::DateTime,
            input,
            format!("year {} out of range", dt.year()),
        ))
    }
}

/// Check that a timestamp fits the wire format
pub fn check_datetime_range(dt: &NaiveDateTime) -> Result<()> {
    let year = dt.year();
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(Error::InvalidArgument(format!(
            "year {} cannot be encoded as a timestamp",
            year
        )));
    }
    Ok(())
}

/// Encode a timestamp to wire format (11 bytes)
pub fn encode_datetime(dt: &NaiveDateTime) -> Result<[u8; TIMESTAMP_LENGTH]> {
    check_datetime_range(dt)?;

    let year = dt.year();
    let century = (year / 100 + 100) as u8;
    let year_in_century = (year % 100 + 100) as u8;
    // leap second nanos (>= 1e9) are kept as-is
    let nanos = dt.nanosecond().to_be_bytes();

    Ok([
        century,
        year_in_century,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8 + 1,
        dt.minute() as u8 + 1,
        dt.second() as u8 + 1,
        nanos[0],
        nanos[1],
        nanos[2],
        nanos[3],
    ])
}

/// Decode a timestamp from wire format
///
/// A 7-byte value (no fractional seconds) is accepted as well.
pub fn decode_datetime(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != 7 && data.len() != TIMESTAMP_LENGTH {
        return Err(Error::Protocol(format!(
            "timestamp requires 7 or {} bytes, got {}",
            TIMESTAMP_LENGTH,
            data.len()
        )));
    }

    let century = data[0] as i32 - 100;
    let year_in_century = data[1] as i32 - 100;
    let year = century * 100 + year_in_century;

    let nanos = if data.len() == TIMESTAMP_LENGTH {
        u32::from_be_bytes([data[7], data[8], data[9], data[10]])
    } else {
        0
    };

    NaiveDate::from_ymd_opt(year, data[2] as u32, data[3] as u32)
        .and_then(|d| {
            d.and_hms_nano_opt(
                data[4].saturating_sub(1) as u32,
                data[5].saturating_sub(1) as u32,
                data[6].saturating_sub(1) as u32,
                nanos,
            )
        })
        .ok_or_else(|| Error::Protocol(format!("invalid timestamp bytes: {}", hex::encode(data))))
}
