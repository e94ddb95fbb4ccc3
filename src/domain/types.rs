//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Time bucketing for the aggregated series.
///
/// Day mode emits one point per input row, in input order. Week mode groups
/// rows by ISO-8601 week and sums counts before computing rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    Day,
    Week,
}

impl TimeMode {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            TimeMode::Day => "day",
            TimeMode::Week => "week",
        }
    }
}

/// A variation entry as it appears in the input snapshot.
///
/// The numeric `id` is optional in the wire format; an absent id resolves to
/// `0` when the catalog is built (a policy choice, not an error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVariation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

/// One raw input row: per-variation visit and conversion counts for a
/// calendar day.
///
/// Counts are keyed by the variation id as a string; a missing key means no
/// data was recorded for that variation on that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub visits: BTreeMap<String, u64>,
    #[serde(default)]
    pub conversions: BTreeMap<String, u64>,
}

/// The immutable input snapshot: variation list plus daily rows.
///
/// Rows are assumed pre-sorted ascending by date for day-mode charts and are
/// never re-sorted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub variations: Vec<RawVariation>,
    pub data: Vec<RawRow>,
}

/// One aggregated bucket of the output series.
///
/// `values` carries an entry for every catalog variation, keyed by variation
/// id — never a sparse map. `None` means no rate is computable for that
/// bucket/variation (zero or missing counts on either side).
///
/// `timestamp` is UTC midnight of the bucket's date in epoch milliseconds and
/// is used only for sort ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: String,
    pub label: String,
    pub timestamp: i64,
    pub values: BTreeMap<String, Option<f64>>,
}

impl ChartPoint {
    /// Rate for a variation id, flattening the missing-entry and null cases.
    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied().flatten()
    }
}

/// Padded numeric range for the value axis.
///
/// Both bounds are finite integral values with `0 <= lower <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub lower: f64,
    pub upper: f64,
}

impl AxisRange {
    /// Range used when no finite values exist (including an empty selection).
    pub fn fallback() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }

    /// Bounds in the `[lower, upper]` form consumed by chart renderers.
    pub fn as_bounds(self) -> [f64; 2] {
        [self.lower, self.upper]
    }
}
