//! Columnar persistence of the canonical dataset.
//!
//! The dataset is stored as a single Parquet file with one column per
//! [`CanonicalReading`] field. Timestamps are stored as naive epoch
//! milliseconds so that no time zone is ever attached to them.

use anyhow::{Context, Result, anyhow};
use chrono::DateTime;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::output::replace_file;
use crate::parser::CanonicalReading;

/// Column names of the canonical Parquet file.
pub mod columns {
    pub const STATION_ID: &str = "station_id";
    pub const STREET_NAME: &str = "street_name";
    pub const LONGITUDE: &str = "longitude";
    pub const LATITUDE: &str = "latitude";
    pub const ALTITUDE: &str = "altitude";
    pub const UPDATE_TIME: &str = "updateTime";
    pub const TIMESTAMP_MS: &str = "timestamp_ms";
    pub const BIKES: &str = "bikes";
    pub const SLOTS: &str = "slots";
    pub const HOUR: &str = "hour";
    pub const WEEKDAY: &str = "weekday";
    pub const IS_WEEKEND: &str = "is_weekend";
    pub const IS_EMPTY: &str = "is_empty";
    pub const IS_FULL: &str = "is_full";
}

/// Builds the columnar representation of `readings`, preserving row order.
pub fn to_frame(readings: &[CanonicalReading]) -> PolarsResult<DataFrame> {
    let station_id: Vec<i64> = readings.iter().map(|r| r.station_id).collect();
    let street_name: Vec<String> = readings.iter().map(|r| r.street_name.clone()).collect();
    let longitude: Vec<f64> = readings.iter().map(|r| r.longitude).collect();
    let latitude: Vec<f64> = readings.iter().map(|r| r.latitude).collect();
    let altitude: Vec<Option<f64>> = readings.iter().map(|r| r.altitude).collect();
    let update_time: Vec<String> = readings.iter().map(|r| r.timestamp_raw.clone()).collect();
    let timestamp_ms: Vec<i64> = readings
        .iter()
        .map(|r| r.timestamp.and_utc().timestamp_millis())
        .collect();
    let bikes: Vec<u32> = readings.iter().map(|r| r.bikes).collect();
    let slots: Vec<u32> = readings.iter().map(|r| r.slots).collect();
    let hour: Vec<u32> = readings.iter().map(|r| r.hour).collect();
    let weekday: Vec<u32> = readings.iter().map(|r| r.weekday).collect();
    let is_weekend: Vec<bool> = readings.iter().map(|r| r.is_weekend).collect();
    let is_empty: Vec<bool> = readings.iter().map(|r| r.is_empty).collect();
    let is_full: Vec<bool> = readings.iter().map(|r| r.is_full).collect();

    DataFrame::new(vec![
        Column::new(columns::STATION_ID.into(), &station_id),
        Column::new(columns::STREET_NAME.into(), &street_name),
        Column::new(columns::LONGITUDE.into(), &longitude),
        Column::new(columns::LATITUDE.into(), &latitude),
        Column::new(columns::ALTITUDE.into(), &altitude),
        Column::new(columns::UPDATE_TIME.into(), &update_time),
        Column::new(columns::TIMESTAMP_MS.into(), &timestamp_ms),
        Column::new(columns::BIKES.into(), &bikes),
        Column::new(columns::SLOTS.into(), &slots),
        Column::new(columns::HOUR.into(), &hour),
        Column::new(columns::WEEKDAY.into(), &weekday),
        Column::new(columns::IS_WEEKEND.into(), &is_weekend),
        Column::new(columns::IS_EMPTY.into(), &is_empty),
        Column::new(columns::IS_FULL.into(), &is_full),
    ])
}

/// Restores readings from a frame produced by [`to_frame`].
pub fn from_frame(df: &DataFrame) -> Result<Vec<CanonicalReading>> {
    let station_id = df.column(columns::STATION_ID)?.i64()?;
    let street_name = df.column(columns::STREET_NAME)?.str()?;
    let longitude = df.column(columns::LONGITUDE)?.f64()?;
    let latitude = df.column(columns::LATITUDE)?.f64()?;
    let altitude = df.column(columns::ALTITUDE)?.f64()?;
    let update_time = df.column(columns::UPDATE_TIME)?.str()?;
    let timestamp_ms = df.column(columns::TIMESTAMP_MS)?.i64()?;
    let bikes = df.column(columns::BIKES)?.u32()?;
    let slots = df.column(columns::SLOTS)?.u32()?;
    let hour = df.column(columns::HOUR)?.u32()?;
    let weekday = df.column(columns::WEEKDAY)?.u32()?;
    let is_weekend = df.column(columns::IS_WEEKEND)?.bool()?;
    let is_empty = df.column(columns::IS_EMPTY)?.bool()?;
    let is_full = df.column(columns::IS_FULL)?.bool()?;

    let null = |col: &str, i: usize| anyhow!("null value in column '{col}' at row {i}");

    let mut readings = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let millis = timestamp_ms
            .get(i)
            .ok_or_else(|| null(columns::TIMESTAMP_MS, i))?;
        let timestamp = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| anyhow!("timestamp out of range at row {i}: {millis}"))?
            .naive_utc();

        readings.push(CanonicalReading {
            station_id: station_id.get(i).ok_or_else(|| null(columns::STATION_ID, i))?,
            street_name: street_name
                .get(i)
                .ok_or_else(|| null(columns::STREET_NAME, i))?
                .to_string(),
            longitude: longitude.get(i).ok_or_else(|| null(columns::LONGITUDE, i))?,
            latitude: latitude.get(i).ok_or_else(|| null(columns::LATITUDE, i))?,
            altitude: altitude.get(i),
            timestamp_raw: update_time
                .get(i)
                .ok_or_else(|| null(columns::UPDATE_TIME, i))?
                .to_string(),
            timestamp,
            bikes: bikes.get(i).ok_or_else(|| null(columns::BIKES, i))?,
            slots: slots.get(i).ok_or_else(|| null(columns::SLOTS, i))?,
            hour: hour.get(i).ok_or_else(|| null(columns::HOUR, i))?,
            weekday: weekday.get(i).ok_or_else(|| null(columns::WEEKDAY, i))?,
            is_weekend: is_weekend.get(i).ok_or_else(|| null(columns::IS_WEEKEND, i))?,
            is_empty: is_empty.get(i).ok_or_else(|| null(columns::IS_EMPTY, i))?,
            is_full: is_full.get(i).ok_or_else(|| null(columns::IS_FULL, i))?,
        });
    }

    Ok(readings)
}

/// Writes the canonical dataset to `path`, replacing any existing file.
pub fn write_canonical(path: &Path, readings: &[CanonicalReading]) -> Result<()> {
    let mut df = to_frame(readings)?;
    replace_file(path, |file| {
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Uncompressed)
            .finish(&mut df)
            .with_context(|| format!("failed to write canonical file {}", path.display()))?;
        Ok(())
    })?;

    info!(path = %path.display(), rows = readings.len(), "Canonical dataset written");
    Ok(())
}

/// Loads a canonical dataset previously written by [`write_canonical`].
pub fn read_canonical(path: &Path) -> Result<Vec<CanonicalReading>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open canonical file {}", path.display()))?;
    let df = ParquetReader::new(file)
        .finish()
        .with_context(|| format!("failed to read canonical file {}", path.display()))?;

    let readings = from_frame(&df)
        .with_context(|| format!("invalid canonical file {}", path.display()))?;
    info!(path = %path.display(), rows = readings.len(), "Canonical dataset loaded");
    Ok(readings)
}
