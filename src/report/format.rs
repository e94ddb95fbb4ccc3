//! Point rankings and formatted terminal output.
//!
//! Formatting code is kept in one place so:
//! - the aggregation code stays clean and locale-agnostic
//! - output changes are localized (important for golden tests)

use crate::domain::{AxisRange, ChartPoint, TimeMode, Variation, VariationCatalog};
use crate::io::ingest::SnapshotStats;

/// Marker used when formatting a literal missing value.
pub const MISSING_VALUE: &str = "–";

/// Percentage formatter carrying the display-locale decimal separator.
///
/// The separator is a presentation policy, so it lives here rather than in
/// the ranking logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentFormatter {
    pub decimal_separator: char,
}

impl PercentFormatter {
    /// Decimal-comma display (`"12,34%"`), the default for this tool.
    pub fn comma() -> Self {
        Self {
            decimal_separator: ',',
        }
    }

    /// Decimal-point display (`"12.34%"`), for machine-friendly contexts.
    pub fn point() -> Self {
        Self {
            decimal_separator: '.',
        }
    }

    /// Two-decimal percentage string.
    pub fn format(&self, value: f64) -> String {
        let digits = format!("{value:.2}");
        if self.decimal_separator == '.' {
            format!("{digits}%")
        } else {
            format!(
                "{}%",
                digits.replace('.', &self.decimal_separator.to_string())
            )
        }
    }

    /// Like [`format`](Self::format), with the missing-value marker for
    /// `None` and non-finite values.
    pub fn format_opt(&self, value: Option<f64>) -> String {
        match value {
            Some(v) if v.is_finite() => self.format(v),
            _ => MISSING_VALUE.to_string(),
        }
    }
}

impl Default for PercentFormatter {
    fn default() -> Self {
        Self::comma()
    }
}

/// One displayable entry of a ranked point: the variation and its rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedValue<'a> {
    pub variation: &'a Variation,
    pub value: f64,
}

/// Rank a point's per-variation rates for display, best first.
///
/// Null values are dropped; ties keep catalog encounter order (the sort is
/// stable). The list is simply empty when every variation is null.
pub fn rank_point<'a>(point: &ChartPoint, catalog: &'a VariationCatalog) -> Vec<RankedValue<'a>> {
    let mut ranked: Vec<RankedValue<'a>> = catalog
        .variations()
        .iter()
        .filter_map(|variation| {
            point
                .value(variation.id())
                .map(|value| RankedValue { variation, value })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Display form of a bucket id: `DD/MM/YYYY` for calendar dates, week ids
/// unchanged.
pub fn date_label(raw: &str) -> String {
    match chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Format the ranked table for a single bucket (the terminal tooltip).
pub fn format_point_table(
    point: &ChartPoint,
    catalog: &VariationCatalog,
    formatter: &PercentFormatter,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", date_label(&point.date)));

    let ranked = rank_point(point, catalog);
    if ranked.is_empty() {
        out.push_str(&format!("  (no data: {MISSING_VALUE})\n"));
        return out;
    }

    let name_width = ranked
        .iter()
        .map(|r| r.variation.name().chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    for r in &ranked {
        out.push_str(&format!(
            "  {:<name_width$}  {:>8}\n",
            r.variation.name(),
            formatter.format(r.value),
        ));
    }

    out
}

/// Format the full run summary (dataset stats + mode + range + variations).
pub fn format_run_summary(
    stats: &SnapshotStats,
    catalog: &VariationCatalog,
    mode: TimeMode,
    range: AxisRange,
    n_points: usize,
) -> String {
    let mut out = String::new();

    out.push_str("=== cvr - Conversion Rate Series ===\n");
    out.push_str(&format!("Mode: {}\n", mode.display_name()));
    out.push_str(&format!(
        "Rows: n={} | dates=[{}, {}]\n",
        stats.n_rows, stats.date_min, stats.date_max,
    ));
    out.push_str(&format!(
        "Points: n={n_points} | y=[{:.0}, {:.0}]%\n",
        range.lower, range.upper,
    ));

    out.push_str("\nVariations:\n");
    for v in catalog.variations() {
        out.push_str(&format!(
            "- {:<3} {} (key={}, color={})\n",
            v.id(),
            v.name(),
            v.data_key(),
            v.color().hex,
        ));
    }
    out.push('\n');

    out
}
