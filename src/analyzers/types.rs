//! Data types used by the aggregation and ranking pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity given to a category label that has no entry in the ranking table.
pub const UNMAPPED_SEVERITY: u8 = 5;

/// Per-station statistics over one reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPeriodSummary {
    pub station_id: i64,
    pub street_name: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Station capacity, taken as the maximum `slots` observed in the window.
    pub tot_slots: u32,
    pub mean_bikes: f64,
    pub mean_free_slots: f64,
    pub total_observations: usize,
    pub times_total_empty: usize,
    pub times_total_full: usize,
    pub pct_empty: f64,
    pub pct_full: f64,
}

/// Qualitative operational-risk category of a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    BothProblem,
    EmptyProblem,
    FullProblem,
    Balanced,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BothProblem => "both_problem",
            Category::EmptyProblem => "empty_problem",
            Category::FullProblem => "full_problem",
            Category::Balanced => "balanced",
        }
    }

    /// Lower is more critical.
    pub fn severity(&self) -> u8 {
        severity_of_label(self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a category label to its severity rank.
///
/// | Label           | Severity |
/// |-----------------|----------|
/// | `both_problem`  | 1        |
/// | `empty_problem` | 2        |
/// | `full_problem`  | 3        |
/// | `balanced`      | 4        |
/// | anything else   | 5        |
pub fn severity_of_label(label: &str) -> u8 {
    match label {
        "both_problem" => 1,
        "empty_problem" => 2,
        "full_problem" => 3,
        "balanced" => 4,
        _ => UNMAPPED_SEVERITY,
    }
}

/// A summary row with its category and severity attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedStation {
    pub summary: StationPeriodSummary,
    pub category: Category,
    pub severity: u8,
}

/// Station counts per category for one reporting window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub window: String,
    pub stations: usize,
    pub both_problem: usize,
    pub empty_problem: usize,
    pub full_problem: usize,
    pub balanced: usize,
}

/// Mean docked bikes of one station in two windows, with its empty rate over
/// the whole canonical dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMeanComparison {
    pub station_id: i64,
    pub street_name: String,
    pub mean_bikes_baseline: Option<f64>,
    pub mean_bikes_target: Option<f64>,
    pub times_empty: usize,
    pub total_observations: usize,
    pub pct_empty: f64,
}
