use serde::Serialize;

use crate::analyzers::utility::pct;
use crate::parser::SkipReason;

/// Row counts collected while ingesting raw telemetry.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct IngestStats {
    pub files: usize,
    pub rows_read: usize,
    pub rows_kept: usize,

    // skipped rows, by first failing check
    pub skipped_malformed: usize,
    pub skipped_timestamp: usize,
    pub skipped_bikes: usize,
    pub skipped_slots: usize,
}

impl IngestStats {
    pub fn record_kept(&mut self) {
        self.rows_read += 1;
        self.rows_kept += 1;
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        self.rows_read += 1;
        match reason {
            SkipReason::Malformed => self.skipped_malformed += 1,
            SkipReason::InvalidTimestamp => self.skipped_timestamp += 1,
            SkipReason::InvalidBikes => self.skipped_bikes += 1,
            SkipReason::InvalidSlots => self.skipped_slots += 1,
        }
    }

    pub fn rows_skipped(&self) -> usize {
        self.skipped_malformed + self.skipped_timestamp + self.skipped_bikes + self.skipped_slots
    }

    pub fn kept_pct(&self) -> f64 {
        pct(self.rows_kept, self.rows_read)
    }

    /// Folds the counts of another file into this one.
    pub fn merge(&mut self, other: &IngestStats) {
        self.files += other.files;
        self.rows_read += other.rows_read;
        self.rows_kept += other.rows_kept;
        self.skipped_malformed += other.skipped_malformed;
        self.skipped_timestamp += other.skipped_timestamp;
        self.skipped_bikes += other.skipped_bikes;
        self.skipped_slots += other.skipped_slots;
    }
}
