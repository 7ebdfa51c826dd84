//! CLI entry point for the bike-sharing station risk pipeline.
//!
//! Provides subcommands to ingest raw telemetry into the canonical dataset,
//! analyze reporting windows into ranked critical-station reports, run both
//! in one go, and compare mean bike availability between two windows.

use anyhow::Result;
use bicing_risk::analyzers::aggregate::compare_windows;
use bicing_risk::analyzers::analyzer::{WindowReport, analyze_windows};
use bicing_risk::analyzers::classify::Thresholds;
use bicing_risk::{
    canonical::{read_canonical, write_canonical},
    ingest::ingest_files,
    output::{print_json, write_comparison},
    window::ReportingWindow,
};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_INPUTS: [&str; 2] = ["data/raw/bicing_2018_08.csv", "data/raw/bicing_2019_01.csv"];
const DEFAULT_CANONICAL: &str = "data/curated/bicing_clean.parquet";
const DEFAULT_OUTPUT_DIR: &str = "data/curated";
const DEFAULT_WINDOWS: [&str; 2] = ["2018-08", "2019-01"];

#[derive(Parser)]
#[command(name = "bicing_risk")]
#[command(about = "Rank bike-sharing stations by empty/full risk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct ThresholdArgs {
    /// Percentage of empty readings above which a station has an empty problem
    #[arg(long, default_value_t = 20.0)]
    empty_threshold: f64,

    /// Percentage of full readings above which a station has a full problem
    #[arg(long, default_value_t = 20.0)]
    full_threshold: f64,
}

impl From<ThresholdArgs> for Thresholds {
    fn from(args: ThresholdArgs) -> Self {
        Thresholds {
            empty_pct: args.empty_threshold,
            full_pct: args.full_threshold,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Clean raw telemetry CSVs into the canonical Parquet dataset
    Ingest {
        /// Raw telemetry CSV files, all sharing the same schema
        #[arg(short, long = "input", num_args = 1.., default_values = DEFAULT_INPUTS)]
        inputs: Vec<PathBuf>,

        /// Where to write the canonical dataset
        #[arg(short, long, default_value = DEFAULT_CANONICAL)]
        canonical: PathBuf,
    },
    /// Build summary and critical-station reports for reporting windows
    Analyze {
        /// Canonical dataset produced by `ingest`
        #[arg(short, long, default_value = DEFAULT_CANONICAL)]
        canonical: PathBuf,

        /// Reporting windows as YYYY-MM
        #[arg(short, long = "window", num_args = 1.., default_values = DEFAULT_WINDOWS)]
        windows: Vec<ReportingWindow>,

        /// Directory for the per-window tables
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Ingest, persist the canonical dataset, then analyze every window
    Run {
        #[arg(short, long = "input", num_args = 1.., default_values = DEFAULT_INPUTS)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, default_value = DEFAULT_CANONICAL)]
        canonical: PathBuf,

        #[arg(short, long = "window", num_args = 1.., default_values = DEFAULT_WINDOWS)]
        windows: Vec<ReportingWindow>,

        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Compare per-station mean bikes between two reporting windows
    Compare {
        #[arg(short, long, default_value = DEFAULT_CANONICAL)]
        canonical: PathBuf,

        /// Baseline window as YYYY-MM
        #[arg(long, default_value = "2018-08")]
        baseline: ReportingWindow,

        /// Target window as YYYY-MM
        #[arg(long, default_value = "2019-01")]
        target: ReportingWindow,

        /// CSV file for the comparison table
        #[arg(short, long, default_value = "data/curated/station_bike_means.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bicing_risk.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bicing_risk.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest { inputs, canonical } => {
            let ingested = ingest_files(&inputs)?;
            write_canonical(&canonical, &ingested.readings)?;
        }
        Commands::Analyze {
            canonical,
            windows,
            output_dir,
            thresholds,
        } => {
            let readings = read_canonical(&canonical)?;
            let reports =
                analyze_windows(Arc::new(readings), &windows, thresholds.into(), &output_dir)
                    .await?;
            log_reports(&reports)?;
        }
        Commands::Run {
            inputs,
            canonical,
            windows,
            output_dir,
            thresholds,
        } => {
            let ingested = ingest_files(&inputs)?;
            write_canonical(&canonical, &ingested.readings)?;

            let reports = analyze_windows(
                Arc::new(ingested.readings),
                &windows,
                thresholds.into(),
                &output_dir,
            )
            .await?;
            log_reports(&reports)?;
        }
        Commands::Compare {
            canonical,
            baseline,
            target,
            output,
        } => {
            let readings = read_canonical(&canonical)?;
            let rows = compare_windows(&readings, &baseline, &target);
            write_comparison(&output, &rows)?;
            info!(
                %baseline,
                %target,
                stations = rows.len(),
                path = %output.display(),
                "Window comparison written"
            );
        }
    }

    Ok(())
}

fn log_reports(reports: &[WindowReport]) -> Result<()> {
    for report in reports {
        info!(
            window = %report.window,
            summary = %report.summary_path.display(),
            report = %report.report_path.display(),
            "Window outputs"
        );
        print_json(&report.breakdown)?;
    }
    Ok(())
}
