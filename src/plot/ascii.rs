//! ASCII/Unicode chart rendering for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - one marker glyph per variation, cycling `o`, `+`, `x`, `*`
//! - `.` segments connecting consecutive defined values of a series
//!   (null buckets are bridged, like the interactive chart)

use crate::domain::{AxisRange, ChartPoint, VariationCatalog};
use crate::io::series::SeriesFile;

/// Marker glyphs, aligned with the color palette by index.
pub const SERIES_MARKERS: [char; 4] = ['o', '+', 'x', '*'];

/// Render the aggregated series onto a fixed character grid.
///
/// The y-scale comes from the supplied `AxisRange`; it is not recomputed
/// here, so the chart always agrees with the printed range.
pub fn render_ascii_chart(
    points: &[ChartPoint],
    catalog: &VariationCatalog,
    selected_ids: &[String],
    range: AxisRange,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut out = String::new();

    if points.is_empty() {
        out.push_str("Chart: (no points)\n");
        return out;
    }

    out.push_str(&format!(
        "Chart: {} → {} | n={} | y=[{:.0}, {:.0}]%\n",
        points[0].date,
        points[points.len() - 1].date,
        points.len(),
        range.lower,
        range.upper,
    ));

    let range = if range.upper > range.lower {
        range
    } else {
        AxisRange::fallback()
    };

    let mut grid = vec![vec![' '; width]; height];

    for v in catalog.variations() {
        if !selected_ids.iter().any(|id| id == v.id()) {
            continue;
        }
        let marker = SERIES_MARKERS[v.color_index() % SERIES_MARKERS.len()];

        let mut prev: Option<(usize, usize)> = None;
        for (i, point) in points.iter().enumerate() {
            let Some(value) = point.value(v.id()) else {
                continue;
            };
            if !value.is_finite() {
                continue;
            }

            let x = map_x(i, points.len(), width);
            let y = map_y(value, range, height);

            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, x, y, '.');
            }
            grid[y][x] = marker;
            prev = Some((x, y));
        }
    }

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Render a saved series file (selection is whatever was exported).
pub fn render_ascii_chart_from_series(series: &SeriesFile, width: usize, height: usize) -> String {
    let (catalog, points) = series.to_catalog_and_points();
    let selected = catalog.ids();
    render_ascii_chart(&points, &catalog, &selected, series.range, width, height)
}

fn map_x(index: usize, n_points: usize, width: usize) -> usize {
    if n_points < 2 {
        return 0;
    }
    let u = index as f64 / (n_points as f64 - 1.0);
    (u.clamp(0.0, 1.0) * (width as f64 - 1.0)).round() as usize
}

fn map_y(value: f64, range: AxisRange, height: usize) -> usize {
    let u = ((value - range.lower) / (range.upper - range.lower)).clamp(0.0, 1.0);
    // y axis grows downward: max value -> row 0
    (height as f64 - 1.0 - u * (height as f64 - 1.0)).round() as usize
}

/// Integer line drawing (Bresenham-ish); only blank cells are written so
/// markers stay visible.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawVariation;
    use std::collections::BTreeMap;

    fn catalog() -> VariationCatalog {
        VariationCatalog::from_raw(&[RawVariation {
            id: Some(1),
            name: "Control".to_string(),
        }])
    }

    fn point(date: &str, value: Option<f64>) -> ChartPoint {
        let mut values = BTreeMap::new();
        values.insert("1".to_string(), value);
        ChartPoint {
            date: date.to_string(),
            label: date[5..].to_string(),
            timestamp: 0,
            values,
        }
    }

    #[test]
    fn chart_golden_snapshot_small() {
        let catalog = catalog();
        let points = vec![
            point("2023-01-02", Some(10.0)),
            point("2023-01-03", Some(10.0)),
        ];
        let selected = catalog.ids();
        let range = AxisRange {
            lower: 8.0,
            upper: 12.0,
        };

        let txt = render_ascii_chart(&points, &catalog, &selected, range, 5, 3);
        let expected = concat!(
            "Chart: 2023-01-02 → 2023-01-03 | n=2 | y=[8, 12]%\n",
            "     \n",
            "o...o\n",
            "     \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn null_buckets_are_bridged() {
        let catalog = catalog();
        let points = vec![
            point("2023-01-02", Some(10.0)),
            point("2023-01-03", None),
            point("2023-01-04", Some(10.0)),
        ];
        let selected = catalog.ids();
        let range = AxisRange {
            lower: 8.0,
            upper: 12.0,
        };

        let txt = render_ascii_chart(&points, &catalog, &selected, range, 9, 3);
        // Markers at both ends of the gap, a connecting line between them,
        // and no marker at the null bucket's column.
        let middle_row: &str = txt.lines().nth(2).unwrap();
        assert_eq!(middle_row, "o.......o");
    }

    #[test]
    fn empty_input_renders_placeholder() {
        let catalog = catalog();
        let txt = render_ascii_chart(
            &[],
            &catalog,
            &catalog.ids(),
            AxisRange::fallback(),
            20,
            5,
        );
        assert_eq!(txt, "Chart: (no points)\n");
    }

    #[test]
    fn unselected_series_are_not_drawn() {
        let catalog = catalog();
        let points = vec![
            point("2023-01-02", Some(10.0)),
            point("2023-01-03", Some(11.0)),
        ];
        let txt = render_ascii_chart(
            &points,
            &catalog,
            &[],
            AxisRange {
                lower: 8.0,
                upper: 12.0,
            },
            10,
            4,
        );
        // Header plus an entirely blank grid.
        for line in txt.lines().skip(1) {
            assert!(line.chars().all(|c| c == ' '));
        }
    }
}
