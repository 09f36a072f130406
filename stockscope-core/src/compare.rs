//! Comparison normalization: rebase each close to the first close.

use crate::data::DataError;
use crate::domain::{ComparisonSeries, DailySeries};

/// Column written by [`normalize_for_comparison`].
pub const NORMALIZED_COLUMN: &str = "Normalized";

/// Rescale closes so the first observation is exactly 1.0.
///
/// Writes the `Normalized` column on `series` and returns the same values as
/// a standalone view for overlaying several symbols.
pub fn normalize_for_comparison(
    symbol: &str,
    series: &mut DailySeries,
) -> Result<ComparisonSeries, DataError> {
    let base = series.first().ok_or(DataError::EmptySeries)?.close;
    if base == 0.0 {
        return Err(DataError::InvalidBaseline { close: base });
    }

    let values: Vec<f64> = series.observations().iter().map(|o| o.close / base).collect();
    series.set_column(NORMALIZED_COLUMN, values.iter().copied().map(Some).collect());

    Ok(ComparisonSeries {
        symbol: symbol.to_string(),
        dates: series.dates(),
        values,
    })
}
