use crate::analyzers::types::{
    Category, CategoryBreakdown, ClassifiedStation, StationPeriodSummary,
};

/// Percentage limits above which a station counts as having a problem.
/// Both comparisons are strict: a station empty exactly 20% of the time is
/// not an empty problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub empty_pct: f64,
    pub full_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            empty_pct: 20.0,
            full_pct: 20.0,
        }
    }
}

/// Assigns a [`Category`] from empty/full percentages.
///
/// | Condition                               | Category        |
/// |-----------------------------------------|-----------------|
/// | empty > threshold and full > threshold  | `both_problem`  |
/// | empty > threshold                       | `empty_problem` |
/// | full > threshold                        | `full_problem`  |
/// | otherwise                               | `balanced`      |
pub fn classify(pct_empty: f64, pct_full: f64, thresholds: &Thresholds) -> Category {
    let empty = pct_empty > thresholds.empty_pct;
    let full = pct_full > thresholds.full_pct;

    match (empty, full) {
        (true, true) => Category::BothProblem,
        (true, false) => Category::EmptyProblem,
        (false, true) => Category::FullProblem,
        (false, false) => Category::Balanced,
    }
}

/// Classifies every summary and orders the result most critical first:
/// ascending severity, then descending `pct_empty`, then descending
/// `pct_full`. The sort is stable, so full ties keep their input order.
pub fn classify_and_rank(
    summaries: Vec<StationPeriodSummary>,
    thresholds: &Thresholds,
) -> Vec<ClassifiedStation> {
    let mut ranked: Vec<ClassifiedStation> = summaries
        .into_iter()
        .map(|summary| {
            let category = classify(summary.pct_empty, summary.pct_full, thresholds);
            ClassifiedStation {
                summary,
                category,
                severity: category.severity(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| b.summary.pct_empty.total_cmp(&a.summary.pct_empty))
            .then_with(|| b.summary.pct_full.total_cmp(&a.summary.pct_full))
    });

    ranked
}

/// Counts stations per category.
pub fn breakdown(window: &str, stations: &[ClassifiedStation]) -> CategoryBreakdown {
    let mut b = CategoryBreakdown {
        window: window.to_string(),
        stations: stations.len(),
        ..Default::default()
    };

    for s in stations {
        match s.category {
            Category::BothProblem => b.both_problem += 1,
            Category::EmptyProblem => b.empty_problem += 1,
            Category::FullProblem => b.full_problem += 1,
            Category::Balanced => b.balanced += 1,
        }
    }

    b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(station_id: i64, pct_empty: f64, pct_full: f64) -> StationPeriodSummary {
        StationPeriodSummary {
            station_id,
            street_name: format!("Street {station_id}"),
            longitude: 2.17,
            latitude: 41.38,
            tot_slots: 20,
            mean_bikes: 10.0,
            mean_free_slots: 10.0,
            total_observations: 100,
            times_total_empty: pct_empty as usize,
            times_total_full: pct_full as usize,
            pct_empty,
            pct_full,
        }
    }

    #[test]
    fn test_classify_scenarios() {
        let t = Thresholds::default();
        assert_eq!(classify(25.0, 5.0, &t), Category::EmptyProblem);
        assert_eq!(classify(30.0, 22.0, &t), Category::BothProblem);
        assert_eq!(classify(5.0, 40.0, &t), Category::FullProblem);
        assert_eq!(classify(0.0, 0.0, &t), Category::Balanced);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let t = Thresholds::default();
        assert_eq!(classify(20.0, 20.0, &t), Category::Balanced);
        assert_eq!(classify(20.01, 20.0, &t), Category::EmptyProblem);
        assert_eq!(classify(20.0, 20.01, &t), Category::FullProblem);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds {
            empty_pct: 50.0,
            full_pct: 10.0,
        };
        assert_eq!(classify(30.0, 15.0, &t), Category::FullProblem);
        assert_eq!(classify(60.0, 5.0, &t), Category::EmptyProblem);
    }

    #[test]
    fn test_rank_scenarios_severity() {
        let ranked = classify_and_rank(
            vec![summary(1, 25.0, 5.0), summary(2, 30.0, 22.0), summary(3, 20.0, 20.0)],
            &Thresholds::default(),
        );

        let got: Vec<(i64, Category, u8)> = ranked
            .iter()
            .map(|s| (s.summary.station_id, s.category, s.severity))
            .collect();
        assert_eq!(
            got,
            vec![
                (2, Category::BothProblem, 1),
                (1, Category::EmptyProblem, 2),
                (3, Category::Balanced, 4),
            ]
        );
    }

    #[test]
    fn test_rank_orders_within_severity() {
        let ranked = classify_and_rank(
            vec![
                summary(1, 5.0, 0.0),
                summary(2, 25.0, 1.0),
                summary(3, 40.0, 3.0),
                summary(4, 25.0, 9.0),
                summary(5, 5.0, 2.0),
            ],
            &Thresholds::default(),
        );

        let ids: Vec<i64> = ranked.iter().map(|s| s.summary.station_id).collect();
        assert_eq!(ids, vec![3, 4, 2, 5, 1]);

        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.severity <= b.severity);
            if a.severity == b.severity {
                assert!(a.summary.pct_empty >= b.summary.pct_empty);
                if a.summary.pct_empty == b.summary.pct_empty {
                    assert!(a.summary.pct_full >= b.summary.pct_full);
                }
            }
        }
    }

    #[test]
    fn test_rank_is_stable_on_full_ties() {
        let ranked = classify_and_rank(
            vec![summary(9, 0.0, 0.0), summary(2, 0.0, 0.0), summary(5, 0.0, 0.0)],
            &Thresholds::default(),
        );

        let ids: Vec<i64> = ranked.iter().map(|s| s.summary.station_id).collect();
        assert_eq!(ids, vec![9, 2, 5]);
    }

    #[test]
    fn test_classification_keeps_summary_untouched() {
        let input = summary(7, 33.33, 0.0);
        let ranked = classify_and_rank(vec![input.clone()], &Thresholds::default());
        assert_eq!(ranked[0].summary, input);
    }

    #[test]
    fn test_breakdown_counts() {
        let ranked = classify_and_rank(
            vec![
                summary(1, 25.0, 5.0),
                summary(2, 30.0, 22.0),
                summary(3, 0.0, 0.0),
                summary(4, 1.0, 1.0),
            ],
            &Thresholds::default(),
        );

        let b = breakdown("2018-08", &ranked);
        assert_eq!(b.window, "2018-08");
        assert_eq!(b.stations, 4);
        assert_eq!(b.both_problem, 1);
        assert_eq!(b.empty_problem, 1);
        assert_eq!(b.full_problem, 0);
        assert_eq!(b.balanced, 2);
    }
}
