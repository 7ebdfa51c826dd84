use crate::analyzers::aggregate::aggregate_window;
use crate::analyzers::classify::{Thresholds, breakdown, classify_and_rank};
use crate::analyzers::types::CategoryBreakdown;
use crate::output::{write_json, write_report, write_summaries};
use crate::parser::CanonicalReading;
use crate::window::ReportingWindow;
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Number of most critical stations echoed to the log after ranking.
const TOP_STATIONS_LOGGED: usize = 10;

/// Files produced for one reporting window.
#[derive(Debug, Clone)]
pub struct WindowReport {
    pub window: ReportingWindow,
    pub summary_path: PathBuf,
    pub report_path: PathBuf,
    pub breakdown_path: PathBuf,
    pub breakdown: CategoryBreakdown,
}

pub fn summary_path(output_dir: &Path, window: &ReportingWindow) -> PathBuf {
    output_dir.join(format!("station_metrics_{}.csv", window.label()))
}

pub fn report_path(output_dir: &Path, window: &ReportingWindow) -> PathBuf {
    output_dir.join(format!("critical_stations_{}.csv", window.label()))
}

pub fn breakdown_path(output_dir: &Path, window: &ReportingWindow) -> PathBuf {
    output_dir.join(format!("critical_stations_{}.json", window.label()))
}

/// Aggregates, classifies and ranks one window, writing the summary table,
/// the ranked report and the category breakdown into `output_dir`.
///
/// A window without readings is not an error: it produces empty tables.
#[tracing::instrument(skip_all, fields(window = %window))]
pub fn analyze_window(
    readings: &[CanonicalReading],
    window: ReportingWindow,
    thresholds: &Thresholds,
    output_dir: &Path,
) -> Result<WindowReport> {
    let summaries = aggregate_window(readings, &window);
    if summaries.is_empty() {
        warn!("No readings fall inside the reporting window");
    }

    let summary_path = summary_path(output_dir, &window);
    write_summaries(&summary_path, &summaries)?;
    info!(
        stations = summaries.len(),
        path = %summary_path.display(),
        "Station summary written"
    );

    let ranked = classify_and_rank(summaries, thresholds);

    let report_path = report_path(output_dir, &window);
    write_report(&report_path, &ranked)?;

    for s in ranked.iter().take(TOP_STATIONS_LOGGED) {
        info!(
            station_id = s.summary.station_id,
            street_name = %s.summary.street_name,
            pct_empty = s.summary.pct_empty,
            pct_full = s.summary.pct_full,
            category = %s.category,
            "Critical station"
        );
    }

    let breakdown = breakdown(&window.to_string(), &ranked);
    let breakdown_path = breakdown_path(output_dir, &window);
    write_json(&breakdown_path, &breakdown)?;

    info!(
        path = %report_path.display(),
        both_problem = breakdown.both_problem,
        empty_problem = breakdown.empty_problem,
        full_problem = breakdown.full_problem,
        balanced = breakdown.balanced,
        "Critical stations report written"
    );

    Ok(WindowReport {
        window,
        summary_path,
        report_path,
        breakdown_path,
        breakdown,
    })
}

/// Runs [`analyze_window`] for every window concurrently over the shared,
/// read-only canonical dataset.
///
/// Reports come back in the order of `windows`. A window listed more than once
/// is analyzed once, at its first position, so no two tasks share output
/// files. The first failing window fails the whole call.
pub async fn analyze_windows(
    readings: Arc<Vec<CanonicalReading>>,
    windows: &[ReportingWindow],
    thresholds: Thresholds,
    output_dir: &Path,
) -> Result<Vec<WindowReport>> {
    let mut seen = BTreeSet::new();
    let mut tasks = vec![];

    for &window in windows.iter().filter(|w| seen.insert(**w)) {
        let readings = Arc::clone(&readings);
        let output_dir = output_dir.to_path_buf();
        let span = tracing::info_span!("window_task", window = %window);

        let task = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            analyze_window(&readings, window, &thresholds, &output_dir)
        });
        tasks.push(task);
    }

    let mut reports = Vec::with_capacity(tasks.len());
    for task in tasks {
        reports.push(task.await??);
    }

    info!(windows = reports.len(), "All reporting windows analyzed");
    Ok(reports)
}
