//! Calendar-month reporting windows.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// A calendar month used to bound aggregation, e.g. August 2018.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportingWindow {
    pub year: i32,
    pub month: u32,
}

impl ReportingWindow {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("month must be between 1 and 12, got {month}");
        }
        Ok(Self { year, month })
    }

    /// Returns `true` if `timestamp` falls inside this month.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        timestamp.year() == self.year && timestamp.month() == self.month
    }

    /// File-name friendly label, e.g. `2018_08`.
    pub fn label(&self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }
}

impl fmt::Display for ReportingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM`.
impl FromStr for ReportingWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .with_context(|| format!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = year
            .parse()
            .with_context(|| format!("invalid year in '{s}'"))?;
        let month: u32 = month
            .parse()
            .with_context(|| format!("invalid month in '{s}'"))?;
        Self::new(year, month)
    }
}
