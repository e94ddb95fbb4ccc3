//! Snapshot JSON ingest and normalization.
//!
//! This module turns the raw analytics export (a variation list plus daily
//! visit/conversion counts) into a validated `RawData` snapshot that is safe
//! to aggregate.
//!
//! Design goals:
//! - **Strict top-level schema** (clear errors + exit code 2)
//! - **Row-level date validation** (skip bad rows, but report what happened)
//! - **No reordering**: day-mode aggregation preserves input row order
//! - **Separation of concerns**: no aggregation logic here

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{RawData, RawRow, RawVariation};
use crate::error::AppError;

/// Wire form of the snapshot, before row dates are validated.
#[derive(Debug, Deserialize)]
struct WireSnapshot {
    variations: Vec<RawVariation>,
    data: Vec<WireRow>,
}

/// Wire form of a row: the date stays a string so one malformed row can be
/// skipped and reported instead of failing the whole parse.
#[derive(Debug, Deserialize)]
struct WireRow {
    date: String,
    #[serde(default)]
    visits: BTreeMap<String, u64>,
    #[serde(default)]
    conversions: BTreeMap<String, u64>,
}

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    /// 1-based index of the row in the snapshot's `data` array.
    pub row: usize,
    pub date: String,
    pub message: String,
}

/// Summary stats about the rows actually kept.
#[derive(Debug, Clone)]
pub struct SnapshotStats {
    pub n_variations: usize,
    pub n_rows: usize,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
}

/// Ingest output: validated snapshot + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSnapshot {
    pub data: RawData,
    pub stats: SnapshotStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load and validate a snapshot JSON file.
pub fn load_snapshot(path: &Path) -> Result<IngestedSnapshot, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open snapshot '{}': {e}", path.display()),
        )
    })?;

    let wire: WireSnapshot = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid snapshot JSON: {e}")))?;

    snapshot_from_wire(wire)
}

/// Parse a snapshot from an in-memory JSON string (used by tests and
/// embedded data).
pub fn parse_snapshot(json: &str) -> Result<IngestedSnapshot, AppError> {
    let wire: WireSnapshot = serde_json::from_str(json)
        .map_err(|e| AppError::new(2, format!("Invalid snapshot JSON: {e}")))?;
    snapshot_from_wire(wire)
}

/// Wrap an already-validated `RawData` (e.g. a generated sample) in the
/// ingest output shape.
pub fn ingest_data(data: RawData) -> Result<IngestedSnapshot, AppError> {
    let stats = compute_stats(&data)?;
    let rows_read = data.data.len();
    Ok(IngestedSnapshot {
        data,
        stats,
        row_errors: Vec::new(),
        rows_read,
    })
}

fn snapshot_from_wire(wire: WireSnapshot) -> Result<IngestedSnapshot, AppError> {
    if wire.variations.is_empty() {
        return Err(AppError::new(2, "Snapshot contains no variations."));
    }

    let rows_read = wire.data.len();
    let mut rows = Vec::with_capacity(rows_read);
    let mut row_errors = Vec::new();

    for (index, row) in wire.data.into_iter().enumerate() {
        match NaiveDate::parse_from_str(&row.date, "%Y-%m-%d") {
            Ok(date) => rows.push(RawRow {
                date,
                visits: row.visits,
                conversions: row.conversions,
            }),
            Err(e) => row_errors.push(RowError {
                row: index + 1,
                date: row.date,
                message: format!("unparseable date: {e}"),
            }),
        }
    }

    let data = RawData {
        variations: wire.variations,
        data: rows,
    };
    let stats = compute_stats(&data)?;

    Ok(IngestedSnapshot {
        data,
        stats,
        row_errors,
        rows_read,
    })
}

fn compute_stats(data: &RawData) -> Result<SnapshotStats, AppError> {
    let mut dates = data.data.iter().map(|r| r.date);
    let Some(first) = dates.next() else {
        return Err(AppError::new(2, "Snapshot contains no usable rows."));
    };

    let (date_min, date_max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));

    Ok(SnapshotStats {
        n_variations: data.variations.len(),
        n_rows: data.data.len(),
        date_min,
        date_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "variations": [
            { "id": 1, "name": "Control" },
            { "name": "Fallback id" }
        ],
        "data": [
            { "date": "2023-01-02", "visits": {"1": 100}, "conversions": {"1": 5} },
            { "date": "not-a-date", "visits": {"1": 50}, "conversions": {"1": 2} },
            { "date": "2023-01-04", "visits": {"1": 80} }
        ]
    }"#;

    #[test]
    fn parses_and_skips_malformed_date_rows() {
        let ingested = parse_snapshot(SNAPSHOT).unwrap();

        assert_eq!(ingested.rows_read, 3);
        assert_eq!(ingested.data.data.len(), 2);
        assert_eq!(ingested.row_errors.len(), 1);
        assert_eq!(ingested.row_errors[0].row, 2);
        assert_eq!(ingested.row_errors[0].date, "not-a-date");

        // Missing conversions map defaults to empty, not an error.
        assert!(ingested.data.data[1].conversions.is_empty());

        let stats = &ingested.stats;
        assert_eq!(stats.n_variations, 2);
        assert_eq!(stats.n_rows, 2);
        assert_eq!(stats.date_min, "2023-01-02".parse().unwrap());
        assert_eq!(stats.date_max, "2023-01-04".parse().unwrap());
    }

    #[test]
    fn rejects_snapshot_without_variations() {
        let err = parse_snapshot(r#"{ "variations": [], "data": [] }"#).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_snapshot_without_usable_rows() {
        let err = parse_snapshot(
            r#"{ "variations": [{"id": 1, "name": "A"}], "data": [{"date": "bogus"}] }"#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_snapshot("{ not json").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_negative_counts() {
        // u64 counts make negative inputs a schema error, not a footgun.
        let err = parse_snapshot(
            r#"{
                "variations": [{"id": 1, "name": "A"}],
                "data": [{ "date": "2023-01-02", "visits": {"1": -3} }]
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
