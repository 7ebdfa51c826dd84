//! Loading of raw telemetry CSV files into the canonical dataset.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::parser::{CanonicalReading, RawReading, SkipReason, clean};
use crate::stats::IngestStats;

/// Columns every raw telemetry file must carry.
pub const RAW_COLUMNS: [&str; 8] = [
    "id",
    "streetName",
    "longitude",
    "latitude",
    "altitude",
    "bikes",
    "slots",
    "updateTime",
];

/// The canonical dataset together with the counts gathered while building it.
#[derive(Debug, Default)]
pub struct Ingested {
    pub readings: Vec<CanonicalReading>,
    pub stats: IngestStats,
}

/// Reads and cleans every file in `paths`, in order.
///
/// # Errors
///
/// Fails on the first file that cannot be opened or read, or whose header
/// lacks one of [`RAW_COLUMNS`]. Nothing is returned for earlier files in
/// that case, so callers never persist a partial dataset.
#[tracing::instrument(skip_all, fields(files = paths.len()))]
pub fn ingest_files<P: AsRef<Path>>(paths: &[P]) -> Result<Ingested> {
    let mut ingested = Ingested::default();

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open raw telemetry file {}", path.display()))?;

        let stats = ingest_reader(file, &mut ingested.readings)
            .with_context(|| format!("failed to read raw telemetry file {}", path.display()))?;

        debug!(
            path = %path.display(),
            rows_read = stats.rows_read,
            rows_kept = stats.rows_kept,
            "Raw file ingested"
        );
        ingested.stats.merge(&stats);
    }

    let stats = &ingested.stats;
    if stats.rows_skipped() > 0 {
        warn!(
            rows_skipped = stats.rows_skipped(),
            malformed = stats.skipped_malformed,
            bad_timestamp = stats.skipped_timestamp,
            bad_bikes = stats.skipped_bikes,
            bad_slots = stats.skipped_slots,
            "Dropped invalid telemetry rows"
        );
    }
    info!(
        files = stats.files,
        rows_read = stats.rows_read,
        rows_kept = stats.rows_kept,
        kept_pct = stats.kept_pct(),
        "Ingestion complete"
    );

    Ok(ingested)
}

/// Cleans every row of a single CSV source, appending survivors to `readings`.
///
/// Rows that fail to decode or clean are counted and skipped; I/O errors and
/// a header missing required columns are returned as errors.
pub fn ingest_reader<R: Read>(reader: R, readings: &mut Vec<CanonicalReading>) -> Result<IngestStats> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<&str> = RAW_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        bail!("missing required columns: {}", missing.join(", "));
    }

    let mut stats = IngestStats {
        files: 1,
        ..Default::default()
    };

    for result in rdr.deserialize::<RawReading>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!(error = %e, "Skipping undecodable row");
                stats.record_skip(SkipReason::Malformed);
                continue;
            }
        };

        match clean(raw) {
            Ok(reading) => {
                readings.push(reading);
                stats.record_kept();
            }
            Err(reason) => stats.record_skip(reason),
        }
    }

    Ok(stats)
}
