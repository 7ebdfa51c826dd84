//! Row-level cleaning of raw station telemetry.
//!
//! Turns a [`RawReading`] as it appears in the source CSV into a
//! [`CanonicalReading`], or reports why the row has to be dropped.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of the `updateTime` column, e.g. `01/08/18 17:43:08`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M:%S";

/// One row of a raw telemetry file.
///
/// Numeric counts are kept as text here; coercion happens in [`clean`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawReading {
    #[serde(rename = "id")]
    pub station_id: i64,
    #[serde(rename = "streetName")]
    pub street_name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: String,
    pub bikes: String,
    pub slots: String,
    #[serde(rename = "updateTime")]
    pub timestamp_raw: String,
}

/// A cleaned reading with a valid timestamp and derived time features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalReading {
    pub station_id: i64,
    pub street_name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: Option<f64>,
    pub timestamp_raw: String,
    pub timestamp: NaiveDateTime,
    pub bikes: u32,
    pub slots: u32,
    pub hour: u32,
    /// 0 = Monday, 6 = Sunday.
    pub weekday: u32,
    pub is_weekend: bool,
    pub is_empty: bool,
    pub is_full: bool,
}

/// Why a raw row did not make it into the canonical dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The row could not be decoded against the file schema at all.
    Malformed,
    InvalidTimestamp,
    InvalidBikes,
    InvalidSlots,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::Malformed => "malformed row",
            SkipReason::InvalidTimestamp => "invalid updateTime",
            SkipReason::InvalidBikes => "invalid bikes count",
            SkipReason::InvalidSlots => "invalid slots count",
        };
        f.write_str(s)
    }
}

/// Parses an `updateTime` value. Impossible calendar dates such as
/// `31/02/19` are rejected.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

/// Coerces a bike or slot count. Integral decimals like `"5.0"` are accepted;
/// negatives, fractions and non-numeric text are not.
pub fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u32>() {
        return Some(v);
    }
    let v: f64 = raw.parse().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) {
        Some(v as u32)
    } else {
        None
    }
}

/// Coerces the informational altitude; anything unparsable becomes `None`.
pub fn parse_altitude(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Cleans a single raw row.
///
/// Checks run in a fixed order (timestamp, bikes, slots) and the first
/// failure decides the reported [`SkipReason`].
pub fn clean(raw: RawReading) -> Result<CanonicalReading, SkipReason> {
    let timestamp = parse_timestamp(&raw.timestamp_raw).ok_or(SkipReason::InvalidTimestamp)?;
    let bikes = parse_count(&raw.bikes).ok_or(SkipReason::InvalidBikes)?;
    let slots = parse_count(&raw.slots).ok_or(SkipReason::InvalidSlots)?;

    let weekday = timestamp.weekday().num_days_from_monday();

    Ok(CanonicalReading {
        station_id: raw.station_id,
        altitude: parse_altitude(&raw.altitude),
        street_name: raw.street_name,
        longitude: raw.longitude,
        latitude: raw.latitude,
        timestamp_raw: raw.timestamp_raw,
        timestamp,
        bikes,
        slots,
        hour: timestamp.hour(),
        weekday,
        is_weekend: weekday >= 5,
        is_empty: bikes == 0,
        is_full: slots == 0,
    })
}
