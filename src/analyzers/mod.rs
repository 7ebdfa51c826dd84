//! Station aggregation and operational-risk ranking.
//!
//! This module reduces the canonical dataset to per-station statistics for a
//! reporting window, classifies each station against empty/full thresholds,
//! ranks them by severity and writes the resulting tables.

pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod types;
pub mod utility;
