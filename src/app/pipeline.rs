//! Shared "chart pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! snapshot -> catalog -> aggregate -> axis range
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! Everything here is pure: the snapshot and catalog are borrowed immutably
//! and each call produces a fresh output.

use crate::domain::{AxisRange, ChartPoint, RawData, TimeMode, VariationCatalog};
use crate::error::AppError;
use crate::series::{aggregate, compute_range};

/// Inputs that vary between runs: bucketing mode and the selected subset.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: TimeMode,
    /// Variation ids to include; `None` means the full catalog.
    pub selected: Option<Vec<String>>,
}

/// All computed outputs of a single chart run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub points: Vec<ChartPoint>,
    pub range: AxisRange,
    /// The resolved selection, in catalog order semantics of the caller.
    pub selected: Vec<String>,
}

/// Execute the aggregation pipeline for one mode/selection combination.
pub fn run_chart(
    data: &RawData,
    catalog: &VariationCatalog,
    config: &RunConfig,
) -> Result<RunOutput, AppError> {
    let selected = resolve_selection(catalog, config.selected.as_deref())?;
    let points = aggregate(config.mode, &data.data, catalog);
    let range = compute_range(&points, &selected);

    Ok(RunOutput {
        points,
        range,
        selected,
    })
}

/// Validate a requested selection against the catalog.
///
/// An empty selection is allowed (the range falls back to `[0, 1]`);
/// enforcing "at least one variation" is a UI concern, not a pipeline one.
fn resolve_selection(
    catalog: &VariationCatalog,
    requested: Option<&[String]>,
) -> Result<Vec<String>, AppError> {
    match requested {
        None => Ok(catalog.ids()),
        Some(ids) => {
            for id in ids {
                if catalog.get(id).is_none() {
                    return Err(AppError::new(2, format!("Unknown variation id '{id}'.")));
                }
            }
            Ok(ids.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawRow, RawVariation};
    use std::collections::BTreeMap;

    fn snapshot() -> (RawData, VariationCatalog) {
        let variations = vec![
            RawVariation {
                id: Some(1),
                name: "Control".to_string(),
            },
            RawVariation {
                id: Some(2),
                name: "Variant B".to_string(),
            },
        ];
        let mut visits = BTreeMap::new();
        visits.insert("1".to_string(), 100u64);
        visits.insert("2".to_string(), 100u64);
        let mut conversions = BTreeMap::new();
        conversions.insert("1".to_string(), 5u64);
        conversions.insert("2".to_string(), 8u64);

        let data = RawData {
            variations: variations.clone(),
            data: vec![RawRow {
                date: "2023-01-02".parse().unwrap(),
                visits,
                conversions,
            }],
        };
        let catalog = VariationCatalog::from_raw(&variations);
        (data, catalog)
    }

    #[test]
    fn default_selection_is_the_full_catalog() {
        let (data, catalog) = snapshot();
        let run = run_chart(
            &data,
            &catalog,
            &RunConfig {
                mode: TimeMode::Day,
                selected: None,
            },
        )
        .unwrap();

        assert_eq!(run.selected, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(run.points.len(), 1);
        // 5% and 8% observed; range brackets both.
        assert!(run.range.lower <= 5.0 && 8.0 <= run.range.upper);
    }

    #[test]
    fn empty_selection_falls_back_to_unit_range() {
        let (data, catalog) = snapshot();
        let run = run_chart(
            &data,
            &catalog,
            &RunConfig {
                mode: TimeMode::Day,
                selected: Some(Vec::new()),
            },
        )
        .unwrap();

        assert_eq!(run.range, AxisRange::fallback());
    }

    #[test]
    fn unknown_selection_id_is_an_input_error() {
        let (data, catalog) = snapshot();
        let err = run_chart(
            &data,
            &catalog,
            &RunConfig {
                mode: TimeMode::Day,
                selected: Some(vec!["9".to_string()]),
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
