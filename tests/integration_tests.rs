use bicing_risk::analyzers::aggregate::{aggregate_window, compare_windows};
use bicing_risk::analyzers::analyzer::analyze_windows;
use bicing_risk::analyzers::classify::{Thresholds, classify_and_rank};
use bicing_risk::analyzers::types::Category;
use bicing_risk::canonical::{read_canonical, write_canonical};
use bicing_risk::ingest::ingest_files;
use bicing_risk::window::ReportingWindow;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn raw_files() -> Vec<PathBuf> {
    vec![fixture("bicing_2018_08.csv"), fixture("bicing_2019_01.csv")]
}

fn august() -> ReportingWindow {
    ReportingWindow::new(2018, 8).unwrap()
}

fn january() -> ReportingWindow {
    ReportingWindow::new(2019, 1).unwrap()
}

#[test]
fn test_ingest_fixtures() {
    let ingested = ingest_files(&raw_files()).expect("Failed to ingest fixtures");
    let stats = &ingested.stats;

    assert_eq!(stats.files, 2);
    assert_eq!(stats.rows_read, 20);
    assert_eq!(stats.rows_kept, 17);
    assert_eq!(stats.skipped_timestamp, 1);
    assert_eq!(stats.skipped_bikes, 1);
    assert_eq!(stats.skipped_slots, 1);

    assert!(ingested.readings.iter().all(|r| r.timestamp_raw != "31/02/19 10:00:00"));
    assert_eq!(
        ingested.readings.iter().filter(|r| r.altitude.is_none()).count(),
        1
    );
}

#[test]
fn test_canonical_file_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.parquet");
    let second = dir.path().join("second.parquet");

    write_canonical(&first, &ingest_files(&raw_files()).unwrap().readings).unwrap();
    write_canonical(&second, &ingest_files(&raw_files()).unwrap().readings).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let restored = read_canonical(&first).unwrap();
    assert_eq!(restored, ingest_files(&raw_files()).unwrap().readings);
}

#[test]
fn test_unreadable_input_aborts() {
    let mut files = raw_files();
    files.push(fixture("does_not_exist.csv"));

    let err = ingest_files(&files).unwrap_err();
    assert!(format!("{err:#}").contains("does_not_exist.csv"));
}

#[test]
fn test_august_summary_and_ranking() {
    let readings = ingest_files(&raw_files()).unwrap().readings;

    let summaries = aggregate_window(&readings, &august());
    let ids: Vec<i64> = summaries.iter().map(|s| s.station_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let diagonal = &summaries[1];
    assert_eq!(diagonal.tot_slots, 25);
    assert_eq!(diagonal.mean_bikes, 15.4);
    assert_eq!(diagonal.mean_free_slots, 9.6);
    assert_eq!(diagonal.total_observations, 5);
    assert_eq!(diagonal.pct_empty, 20.0);
    assert_eq!(diagonal.pct_full, 40.0);

    let ranked = classify_and_rank(summaries, &Thresholds::default());
    let got: Vec<(i64, Category, u8)> = ranked
        .iter()
        .map(|s| (s.summary.station_id, s.category, s.severity))
        .collect();
    assert_eq!(
        got,
        vec![
            (3, Category::BothProblem, 1),
            (1, Category::EmptyProblem, 2),
            (2, Category::FullProblem, 3),
        ]
    );
}

#[test]
fn test_station_only_in_other_month_is_absent() {
    let readings = ingest_files(&raw_files()).unwrap().readings;

    let august_ids: Vec<i64> = aggregate_window(&readings, &august())
        .iter()
        .map(|s| s.station_id)
        .collect();
    assert!(!august_ids.contains(&4));

    let january_ids: Vec<i64> = aggregate_window(&readings, &january())
        .iter()
        .map(|s| s.station_id)
        .collect();
    assert_eq!(january_ids, vec![1, 4]);
}

#[test]
fn test_compare_fixture_windows() {
    let readings = ingest_files(&raw_files()).unwrap().readings;
    let rows = compare_windows(&readings, &august(), &january());

    let got: Vec<(i64, Option<f64>, Option<f64>, f64)> = rows
        .iter()
        .map(|r| {
            (
                r.station_id,
                r.mean_bikes_baseline,
                r.mean_bikes_target,
                r.pct_empty,
            )
        })
        .collect();
    assert_eq!(
        got,
        vec![
            (1, Some(4.0), Some(2.0), 33.33),
            (2, Some(15.0), None, 20.0),
            (3, Some(4.0), None, 50.0),
            (4, None, Some(6.0), 0.0),
        ]
    );
}

#[tokio::test]
async fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = dir.path().join("curated").join("bicing_clean.parquet");
    let output_dir = dir.path().join("curated");

    let ingested = ingest_files(&raw_files()).unwrap();
    write_canonical(&canonical, &ingested.readings).unwrap();
    let readings = read_canonical(&canonical).unwrap();

    let reports = analyze_windows(
        Arc::new(readings),
        &[august(), january()],
        Thresholds::default(),
        &output_dir,
    )
    .await
    .expect("Failed to analyze windows");
    assert_eq!(reports.len(), 2);

    let mut rdr = csv::Reader::from_path(&reports[0].report_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "station_id");
    assert_eq!(&headers[12], "category");
    assert_eq!(&headers[13], "severity");

    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    let ranked: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|r| (&r[0], &r[12], &r[13]))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("3", "both_problem", "1"),
            ("1", "empty_problem", "2"),
            ("2", "full_problem", "3"),
        ]
    );
    assert_eq!(&rows[0][5], "3.8");
    assert_eq!(&rows[0][6], "6.2");

    let january = &reports[1];
    assert_eq!(january.breakdown.stations, 2);
    assert_eq!(january.breakdown.balanced, 2);
    assert!(january.summary_path.exists());
    assert!(january.breakdown_path.exists());
}

#[tokio::test]
async fn test_stricter_thresholds_change_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let readings = ingest_files(&raw_files()).unwrap().readings;

    let thresholds = Thresholds {
        empty_pct: 60.0,
        full_pct: 60.0,
    };
    let reports = analyze_windows(Arc::new(readings), &[august()], thresholds, dir.path())
        .await
        .unwrap();

    assert_eq!(reports[0].breakdown.balanced, 3);
}
