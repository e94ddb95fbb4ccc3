//! Value-axis range computation.
//!
//! The range is derived from the selected variations only, padded so the
//! extremes don't sit on the chart border, and snapped to whole numbers for
//! stable axis ticks. It is recomputed on every call — bucketing-mode and
//! selection changes never see a stale range.

use crate::domain::{AxisRange, ChartPoint};

/// Fraction of the observed span used as padding.
const PADDING_FRACTION: f64 = 0.15;

/// Fixed padding used when every observed value is equal (zero span).
const FLAT_PADDING: f64 = 2.0;

/// Compute the `[lower, upper]` axis range over the selected variations.
///
/// Null and non-finite values are ignored. When nothing remains — no points,
/// an empty selection, or all-null series — the `[0, 1]` fallback is
/// returned rather than an error. Otherwise `lower` is floored (and clamped
/// at zero) and `upper` is ceiled, so both bounds are finite integral values
/// with `lower <= min <= max <= upper`.
pub fn compute_range(points: &[ChartPoint], selected_ids: &[String]) -> AxisRange {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for point in points {
        for id in selected_ids {
            if let Some(value) = point.value(id) {
                if value.is_finite() {
                    min = min.min(value);
                    max = max.max(value);
                }
            }
        }
    }

    if !min.is_finite() || !max.is_finite() {
        return AxisRange::fallback();
    }

    let mut padding = (max - min) * PADDING_FRACTION;
    if padding == 0.0 {
        padding = FLAT_PADDING;
    }

    AxisRange {
        lower: (min - padding).max(0.0).floor(),
        upper: (max + padding).ceil(),
    }
}
