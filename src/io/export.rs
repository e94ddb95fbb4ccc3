//! Export per-point rates to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one row per bucket, one column per selected variation (by data
//! key), empty cells for null rates.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ChartPoint, VariationCatalog};
use crate::error::AppError;

/// Write the aggregated series to a CSV file.
pub fn write_points_csv(
    path: &Path,
    points: &[ChartPoint],
    catalog: &VariationCatalog,
    selected_ids: &[String],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;

    let columns: Vec<_> = catalog
        .variations()
        .iter()
        .filter(|v| selected_ids.iter().any(|id| id == v.id()))
        .collect();

    let mut header = String::from("date,label,timestamp");
    for v in &columns {
        header.push(',');
        header.push_str(v.data_key());
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for point in points {
        let mut line = format!("{},{},{}", point.date, point.label, point.timestamp);
        for v in &columns {
            line.push(',');
            if let Some(value) = point.value(v.id()) {
                line.push_str(&format!("{value:.4}"));
            }
        }
        writeln!(file, "{line}")
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
