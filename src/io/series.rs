//! Read/write series JSON files.
//!
//! Series JSON is the "portable" representation of a prepared chart:
//! - the selected variations (id, name, data key, color)
//! - the computed axis range
//! - the ordered points, keyed by data key for the rendering boundary
//!
//! A later `cvr plot --series <file>` invocation can re-render it without
//! recomputing the aggregation.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{AxisRange, ChartPoint, TimeMode, Variation, VariationCatalog};
use crate::error::AppError;

/// A saved series file (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFile {
    pub tool: String,
    pub mode: TimeMode,
    pub variations: Vec<SeriesVariation>,
    pub range: AxisRange,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesVariation {
    pub id: String,
    pub name: String,
    pub data_key: String,
    pub color: String,
}

/// A chart point with values keyed by data key (`"v" + id`), the form the
/// rendering boundary consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: String,
    pub label: String,
    pub timestamp: i64,
    pub values: BTreeMap<String, Option<f64>>,
}

/// Assemble the portable series representation for the selected variations.
pub fn build_series_file(
    points: &[ChartPoint],
    catalog: &VariationCatalog,
    selected_ids: &[String],
    range: AxisRange,
    mode: TimeMode,
) -> SeriesFile {
    let variations: Vec<&Variation> = catalog
        .variations()
        .iter()
        .filter(|v| selected_ids.iter().any(|id| id == v.id()))
        .collect();

    let series_points = points
        .iter()
        .map(|point| {
            let values = variations
                .iter()
                .map(|v| (v.data_key().to_string(), point.value(v.id())))
                .collect();
            SeriesPoint {
                date: point.date.clone(),
                label: point.label.clone(),
                timestamp: point.timestamp,
                values,
            }
        })
        .collect();

    SeriesFile {
        tool: "cvr".to_string(),
        mode,
        variations: variations
            .iter()
            .map(|v| SeriesVariation {
                id: v.id().to_string(),
                name: v.name().to_string(),
                data_key: v.data_key().to_string(),
                color: v.color().hex.to_string(),
            })
            .collect(),
        range,
        points: series_points,
    }
}

impl SeriesFile {
    /// Reconstruct catalog + chart points for re-rendering.
    ///
    /// Colors are re-derived by position, which matches how they were
    /// assigned when the file was written.
    pub fn to_catalog_and_points(&self) -> (VariationCatalog, Vec<ChartPoint>) {
        let catalog = VariationCatalog::new(
            self.variations
                .iter()
                .enumerate()
                .map(|(index, v)| Variation::new(v.id.clone(), v.name.clone(), index))
                .collect(),
        );

        let points = self
            .points
            .iter()
            .map(|sp| {
                let values = self
                    .variations
                    .iter()
                    .map(|v| {
                        (
                            v.id.clone(),
                            sp.values.get(&v.data_key).copied().flatten(),
                        )
                    })
                    .collect();
                ChartPoint {
                    date: sp.date.clone(),
                    label: sp.label.clone(),
                    timestamp: sp.timestamp,
                    values,
                }
            })
            .collect();

        (catalog, points)
    }
}

/// Write a series JSON file.
pub fn write_series_json(path: &Path, series: &SeriesFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create series JSON '{}': {e}", path.display()),
        )
    })?;

    serde_json::to_writer_pretty(file, series)
        .map_err(|e| AppError::new(2, format!("Failed to write series JSON: {e}")))?;

    Ok(())
}

/// Read a series JSON file.
pub fn read_series_json(path: &Path) -> Result<SeriesFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open series JSON '{}': {e}", path.display()),
        )
    })?;
    let series: SeriesFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid series JSON: {e}")))?;
    Ok(series)
}
