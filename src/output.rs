//! Output formatting and persistence for summary and ranking tables.
//!
//! Every writer creates missing parent directories and replaces the target
//! file in one rename, so a failed write leaves the previous file intact.
//! CSV tables always start with a header row, even when empty.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::{ClassifiedStation, StationMeanComparison, StationPeriodSummary};

/// Column order of the per-window summary table.
pub const SUMMARY_COLUMNS: [&str; 12] = [
    "station_id",
    "street_name",
    "longitude",
    "latitude",
    "tot_slots",
    "mean_bikes",
    "mean_free_slots",
    "total_observations",
    "times_total_empty",
    "times_total_full",
    "pct_empty",
    "pct_full",
];

/// Column order of the critical-stations report.
pub const REPORT_COLUMNS: [&str; 14] = [
    "station_id",
    "street_name",
    "longitude",
    "latitude",
    "tot_slots",
    "mean_bikes",
    "mean_free_slots",
    "total_observations",
    "times_total_empty",
    "times_total_full",
    "pct_empty",
    "pct_full",
    "category",
    "severity",
];

/// Column order of the cross-window comparison table.
pub const COMPARISON_COLUMNS: [&str; 7] = [
    "station_id",
    "street_name",
    "mean_bikes_baseline",
    "mean_bikes_target",
    "times_empty",
    "total_observations",
    "pct_empty",
];

/// Flat view of a [`ClassifiedStation`] in report column order.
#[derive(Serialize)]
struct ReportRecord<'a> {
    station_id: i64,
    street_name: &'a str,
    longitude: f64,
    latitude: f64,
    tot_slots: u32,
    mean_bikes: f64,
    mean_free_slots: f64,
    total_observations: usize,
    times_total_empty: usize,
    times_total_full: usize,
    pct_empty: f64,
    pct_full: f64,
    category: &'static str,
    severity: u8,
}

impl<'a> From<&'a ClassifiedStation> for ReportRecord<'a> {
    fn from(c: &'a ClassifiedStation) -> Self {
        let s = &c.summary;
        Self {
            station_id: s.station_id,
            street_name: &s.street_name,
            longitude: s.longitude,
            latitude: s.latitude,
            tot_slots: s.tot_slots,
            mean_bikes: s.mean_bikes,
            mean_free_slots: s.mean_free_slots,
            total_observations: s.total_observations,
            times_total_empty: s.times_total_empty,
            times_total_full: s.times_total_full,
            pct_empty: s.pct_empty,
            pct_full: s.pct_full,
            category: c.category.as_str(),
            severity: c.severity,
        }
    }
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty-printed JSON to `path`.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    replace_file(path, |file| {
        serde_json::to_writer_pretty(file, value)
            .with_context(|| format!("failed to write {}", path.display()))
    })
}

/// Writes the per-window summary table.
pub fn write_summaries(path: &Path, rows: &[StationPeriodSummary]) -> Result<()> {
    write_table(path, &SUMMARY_COLUMNS, rows.iter())
}

/// Writes the ranked critical-stations report.
pub fn write_report(path: &Path, rows: &[ClassifiedStation]) -> Result<()> {
    write_table(path, &REPORT_COLUMNS, rows.iter().map(ReportRecord::from))
}

/// Writes the cross-window mean-bikes comparison.
pub fn write_comparison(path: &Path, rows: &[StationMeanComparison]) -> Result<()> {
    write_table(path, &COMPARISON_COLUMNS, rows.iter())
}

fn write_table<T, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let count = replace_file(path, |file| {
        // header is written by hand so that empty tables still carry it
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(header)?;

        let mut count = 0usize;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("failed to write row to {}", path.display()))?;
            count += 1;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
        Ok(count)
    })?;

    debug!(path = %path.display(), rows = count, "CSV table written");
    Ok(())
}

/// Hands `write` a sibling temporary file and renames it over `path` once
/// `write` succeeds. On failure the temporary file is removed and `path` is
/// left untouched.
pub(crate) fn replace_file<T>(path: &Path, write: impl FnOnce(File) -> Result<T>) -> Result<T> {
    create_parent(path)?;
    let tmp = temp_path(path);
    let file =
        File::create(&tmp).with_context(|| format!("failed to create {}", tmp.display()))?;

    let result = write(file).and_then(|value| {
        fs::rename(&tmp, path)
            .with_context(|| format!("failed to move {} into place", path.display()))?;
        Ok(value)
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
