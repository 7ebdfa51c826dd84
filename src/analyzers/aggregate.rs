use crate::analyzers::types::{StationMeanComparison, StationPeriodSummary};
use crate::analyzers::utility::{pct, round_to};
use crate::parser::CanonicalReading;
use crate::window::ReportingWindow;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Grouping key of a station summary. Coordinates are compared bitwise so that
/// a station whose location changes shows up as two groups instead of being
/// merged silently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StationKey {
    station_id: i64,
    street_name: String,
    longitude_bits: u64,
    latitude_bits: u64,
}

impl StationKey {
    fn of(r: &CanonicalReading) -> Self {
        Self {
            station_id: r.station_id,
            street_name: r.street_name.clone(),
            longitude_bits: r.longitude.to_bits(),
            latitude_bits: r.latitude.to_bits(),
        }
    }
}

/// Running totals for one group. Every field is a sum, count or max, so the
/// result does not depend on row order.
#[derive(Debug, Default)]
struct StationTotals {
    max_slots: u32,
    bikes_sum: u64,
    observations: usize,
    empty: usize,
    full: usize,
}

impl StationTotals {
    fn add(&mut self, r: &CanonicalReading) {
        self.max_slots = self.max_slots.max(r.slots);
        self.bikes_sum += u64::from(r.bikes);
        self.observations += 1;
        self.empty += usize::from(r.is_empty);
        self.full += usize::from(r.is_full);
    }
}

/// Aggregates the readings that fall inside `window`.
///
/// Stations with no readings in the window are absent from the result.
pub fn aggregate_window(
    readings: &[CanonicalReading],
    window: &ReportingWindow,
) -> Vec<StationPeriodSummary> {
    aggregate_station_periods(readings.iter().filter(|r| window.contains(&r.timestamp)))
}

/// Reduces readings to one [`StationPeriodSummary`] per
/// `(station_id, street_name, longitude, latitude)` group, sorted by
/// `station_id`.
///
/// `mean_bikes` is rounded to one decimal before `mean_free_slots` is derived
/// from it; percentages are rounded to two decimals.
pub fn aggregate_station_periods<'a, I>(readings: I) -> Vec<StationPeriodSummary>
where
    I: IntoIterator<Item = &'a CanonicalReading>,
{
    let mut groups: HashMap<StationKey, StationTotals> = HashMap::new();

    for r in readings {
        groups.entry(StationKey::of(r)).or_default().add(r);
    }

    let mut summaries: Vec<StationPeriodSummary> = groups
        .into_iter()
        .map(|(key, totals)| {
            let mean_bikes = round_to(totals.bikes_sum as f64 / totals.observations as f64, 1);
            StationPeriodSummary {
                station_id: key.station_id,
                street_name: key.street_name,
                longitude: f64::from_bits(key.longitude_bits),
                latitude: f64::from_bits(key.latitude_bits),
                tot_slots: totals.max_slots,
                mean_bikes,
                mean_free_slots: round_to(f64::from(totals.max_slots) - mean_bikes, 1),
                total_observations: totals.observations,
                times_total_empty: totals.empty,
                times_total_full: totals.full,
                pct_empty: round_to(pct(totals.empty, totals.observations), 2),
                pct_full: round_to(pct(totals.full, totals.observations), 2),
            }
        })
        .collect();

    summaries.sort_by(compare_summary_keys);
    summaries
}

// Groups sharing a station_id only occur on inconsistent input; the remaining
// keys just keep the output deterministic.
fn compare_summary_keys(a: &StationPeriodSummary, b: &StationPeriodSummary) -> Ordering {
    a.station_id
        .cmp(&b.station_id)
        .then_with(|| a.street_name.cmp(&b.street_name))
        .then_with(|| a.longitude.total_cmp(&b.longitude))
        .then_with(|| a.latitude.total_cmp(&b.latitude))
}

/// Compares mean docked bikes per `(station_id, street_name)` between two
/// windows.
///
/// Means are rounded to whole bikes. A station seen in only one window gets
/// `None` for the other. `times_empty`, `total_observations` and `pct_empty`
/// are computed over all `readings`, not just the two windows.
pub fn compare_windows(
    readings: &[CanonicalReading],
    baseline: &ReportingWindow,
    target: &ReportingWindow,
) -> Vec<StationMeanComparison> {
    #[derive(Default)]
    struct Totals {
        baseline_bikes: u64,
        baseline_n: usize,
        target_bikes: u64,
        target_n: usize,
        empty: usize,
        observations: usize,
    }

    let mut groups: HashMap<(i64, &str), Totals> = HashMap::new();

    for r in readings {
        let t = groups.entry((r.station_id, r.street_name.as_str())).or_default();
        t.empty += usize::from(r.is_empty);
        t.observations += 1;
        if baseline.contains(&r.timestamp) {
            t.baseline_bikes += u64::from(r.bikes);
            t.baseline_n += 1;
        }
        if target.contains(&r.timestamp) {
            t.target_bikes += u64::from(r.bikes);
            t.target_n += 1;
        }
    }

    let window_mean = |sum: u64, n: usize| (n > 0).then(|| round_to(sum as f64 / n as f64, 0));

    let keys: BTreeSet<(i64, &str)> = groups
        .iter()
        .filter(|(_, t)| t.baseline_n > 0 || t.target_n > 0)
        .map(|(k, _)| *k)
        .collect();

    keys.into_iter()
        .map(|key| {
            let t = &groups[&key];
            StationMeanComparison {
                station_id: key.0,
                street_name: key.1.to_string(),
                mean_bikes_baseline: window_mean(t.baseline_bikes, t.baseline_n),
                mean_bikes_target: window_mean(t.target_bikes, t.target_n),
                times_empty: t.empty,
                total_observations: t.observations,
                pct_empty: round_to(pct(t.empty, t.observations), 2),
            }
        })
        .collect()
}
