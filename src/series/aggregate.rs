//! Conversion-rate aggregation: raw daily counts to ordered chart points.
//!
//! Day mode maps rows 1:1 in input order (the snapshot is assumed pre-sorted
//! by date). Week mode sums counts per ISO week, then sorts the buckets by
//! timestamp explicitly — never relying on map iteration order.

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};

use crate::domain::{ChartPoint, RawRow, TimeMode, VariationCatalog};
use crate::series::week::week_key;

/// Conversion rate in percent.
///
/// Defined only when both counts are positive; a zero on either side yields
/// `None`. A true zero-conversion bucket is therefore indistinguishable from
/// a missing-data bucket (see `zero_conversions_indistinguishable_from_missing`).
fn rate(visits: u64, conversions: u64) -> Option<f64> {
    if visits > 0 && conversions > 0 {
        Some(conversions as f64 / visits as f64 * 100.0)
    } else {
        None
    }
}

/// UTC midnight of a calendar date, in epoch milliseconds.
fn utc_midnight_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Aggregate raw rows into the chart series for the given bucketing mode.
///
/// Every emitted point carries a value entry for every catalog variation.
/// Identical inputs always yield identical, identically ordered output.
pub fn aggregate(mode: TimeMode, rows: &[RawRow], catalog: &VariationCatalog) -> Vec<ChartPoint> {
    match mode {
        TimeMode::Day => aggregate_daily(rows, catalog),
        TimeMode::Week => aggregate_weekly(rows, catalog),
    }
}

fn aggregate_daily(rows: &[RawRow], catalog: &VariationCatalog) -> Vec<ChartPoint> {
    rows.iter()
        .map(|row| {
            let mut values = BTreeMap::new();
            for v in catalog.variations() {
                let visits = row.visits.get(v.id()).copied().unwrap_or(0);
                let conversions = row.conversions.get(v.id()).copied().unwrap_or(0);
                values.insert(v.id().to_string(), rate(visits, conversions));
            }
            ChartPoint {
                date: row.date.format("%Y-%m-%d").to_string(),
                label: row.date.format("%m-%d").to_string(),
                timestamp: utc_midnight_millis(row.date),
                values,
            }
        })
        .collect()
}

/// Per-week sums, kept only for the duration of the weekly reduction.
struct WeekBucket {
    timestamp: i64,
    visits: HashMap<String, u64>,
    conversions: HashMap<String, u64>,
}

fn aggregate_weekly(rows: &[RawRow], catalog: &VariationCatalog) -> Vec<ChartPoint> {
    let mut buckets: HashMap<String, WeekBucket> = HashMap::new();

    for row in rows {
        let key = week_key(row.date);
        // The bucket timestamp is the first row encountered for that week.
        let bucket = buckets.entry(key).or_insert_with(|| WeekBucket {
            timestamp: utc_midnight_millis(row.date),
            visits: HashMap::new(),
            conversions: HashMap::new(),
        });

        for v in catalog.variations() {
            // Missing per-row counts are zero for summation purposes,
            // independent of the null-rate policy applied afterwards.
            *bucket.visits.entry(v.id().to_string()).or_insert(0) +=
                row.visits.get(v.id()).copied().unwrap_or(0);
            *bucket.conversions.entry(v.id().to_string()).or_insert(0) +=
                row.conversions.get(v.id()).copied().unwrap_or(0);
        }
    }

    let mut points: Vec<ChartPoint> = buckets
        .into_iter()
        .map(|(key, bucket)| {
            let mut values = BTreeMap::new();
            for v in catalog.variations() {
                let visits = bucket.visits.get(v.id()).copied().unwrap_or(0);
                let conversions = bucket.conversions.get(v.id()).copied().unwrap_or(0);
                values.insert(v.id().to_string(), rate(visits, conversions));
            }
            ChartPoint {
                label: key.clone(),
                date: key,
                timestamp: bucket.timestamp,
                values,
            }
        })
        .collect();

    // Grouping order is not chronological; sort by timestamp.
    points.sort_by_key(|p| p.timestamp);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawVariation;

    fn catalog(ids: &[i64]) -> VariationCatalog {
        let raw: Vec<RawVariation> = ids
            .iter()
            .map(|&id| RawVariation {
                id: Some(id),
                name: format!("Variation {id}"),
            })
            .collect();
        VariationCatalog::from_raw(&raw)
    }

    fn row(date: &str, counts: &[(&str, u64, u64)]) -> RawRow {
        let mut visits = BTreeMap::new();
        let mut conversions = BTreeMap::new();
        for &(id, v, c) in counts {
            visits.insert(id.to_string(), v);
            conversions.insert(id.to_string(), c);
        }
        RawRow {
            date: date.parse().unwrap(),
            visits,
            conversions,
        }
    }

    #[test]
    fn day_mode_preserves_cardinality_and_order() {
        let catalog = catalog(&[1]);
        let rows = vec![
            row("2023-01-05", &[("1", 100, 4)]),
            row("2023-01-06", &[("1", 200, 10)]),
            row("2023-01-07", &[("1", 50, 1)]),
        ];

        let points = aggregate(TimeMode::Day, &rows, &catalog);
        assert_eq!(points.len(), rows.len());
        assert_eq!(points[0].date, "2023-01-05");
        assert_eq!(points[0].label, "01-05");
        assert_eq!(points[1].date, "2023-01-06");
        assert_eq!(points[2].date, "2023-01-07");
        assert!(points[0].timestamp < points[1].timestamp);

        assert_eq!(points[0].value("1"), Some(4.0));
        assert_eq!(points[1].value("1"), Some(5.0));
        assert_eq!(points[2].value("1"), Some(2.0));
    }

    #[test]
    fn null_policy_never_divides_by_zero() {
        let catalog = catalog(&[1, 2, 3]);
        let rows = vec![row(
            "2023-02-01",
            &[("1", 0, 5), ("2", 5, 0), ("3", 40, 2)],
        )];

        let points = aggregate(TimeMode::Day, &rows, &catalog);
        assert_eq!(points[0].value("1"), None);
        assert_eq!(points[0].value("2"), None);
        assert_eq!(points[0].value("3"), Some(5.0));
    }

    #[test]
    fn every_point_covers_every_variation() {
        // Row only mentions variation 1; the point must still carry an
        // explicit null entry for variation 2.
        let catalog = catalog(&[1, 2]);
        let rows = vec![row("2023-02-01", &[("1", 10, 1)])];

        let points = aggregate(TimeMode::Day, &rows, &catalog);
        assert_eq!(points[0].values.len(), 2);
        assert_eq!(points[0].values.get("2"), Some(&None));
    }

    #[test]
    fn week_mode_sums_counts_per_variation() {
        let catalog = catalog(&[1, 2]);
        // Three rows in 2023-W01 (Mon Jan 2 .. Sun Jan 8).
        let rows = vec![
            row("2023-01-02", &[("1", 100, 5), ("2", 80, 2)]),
            row("2023-01-04", &[("1", 150, 10)]),
            row("2023-01-08", &[("1", 50, 3), ("2", 20, 4)]),
        ];

        let points = aggregate(TimeMode::Week, &rows, &catalog);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, "2023-W01");
        assert_eq!(points[0].label, "2023-W01");

        // visits 300, conversions 18 -> 6%; missing row counts summed as 0.
        assert_eq!(points[0].value("1"), Some(6.0));
        // visits 100, conversions 6 -> 6%.
        assert_eq!(points[0].value("2"), Some(6.0));
    }

    #[test]
    fn week_mode_sorts_buckets_by_timestamp() {
        let catalog = catalog(&[1]);
        // Deliberately unordered input spanning three ISO weeks, including
        // the 2022/2023 boundary (2023-01-01 is still 2022-W52).
        let rows = vec![
            row("2023-01-09", &[("1", 10, 1)]),
            row("2023-01-01", &[("1", 10, 1)]),
            row("2023-01-02", &[("1", 10, 1)]),
        ];

        let points = aggregate(TimeMode::Week, &rows, &catalog);
        let dates: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2022-W52", "2023-W01", "2023-W02"]);
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn week_bucket_timestamp_is_first_row_encountered() {
        let catalog = catalog(&[1]);
        // The Wednesday row arrives before the Monday row of the same week.
        let rows = vec![
            row("2023-01-04", &[("1", 10, 1)]),
            row("2023-01-02", &[("1", 10, 1)]),
        ];

        let points = aggregate(TimeMode::Week, &rows, &catalog);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, utc_midnight_millis("2023-01-04".parse().unwrap()));
    }

    #[test]
    fn zero_conversions_indistinguishable_from_missing() {
        // Documented open question: a real zero-conversion bucket renders
        // exactly like a missing-data bucket. This test pins the behavior so
        // changing it is a deliberate decision.
        let catalog = catalog(&[1]);
        let with_zero = vec![row("2023-03-01", &[("1", 500, 0)])];
        let with_nothing = vec![row("2023-03-01", &[])];

        let a = aggregate(TimeMode::Day, &with_zero, &catalog);
        let b = aggregate(TimeMode::Day, &with_nothing, &catalog);
        assert_eq!(a, b);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let catalog = catalog(&[1, 2]);
        let rows = vec![
            row("2023-01-06", &[("1", 120, 6), ("2", 90, 9)]),
            row("2023-01-02", &[("1", 100, 5)]),
            row("2023-01-13", &[("2", 70, 7)]),
        ];

        for mode in [TimeMode::Day, TimeMode::Week] {
            let first = aggregate(mode, &rows, &catalog);
            let second = aggregate(mode, &rows, &catalog);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn timestamps_are_utc_midnight() {
        let millis = utc_midnight_millis("2023-01-02".parse().unwrap());
        // 2023-01-02T00:00:00Z
        assert_eq!(millis, 1_672_617_600_000);
        assert_eq!(millis % 86_400_000, 0);
    }
}
