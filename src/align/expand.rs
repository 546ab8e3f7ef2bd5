//! Wide-to-long expansion of the case-count table.

use std::collections::HashMap;
use std::ops::Range;

use crate::domain::{FeatureRow, LongFeatureTable, WideSeriesTable};
use crate::error::AppError;

/// Expand a wide per-country table into the long training table.
///
/// For each country, one row is emitted per date except the last: the row
/// carries that day's case count and, as the label, the following day's count.
/// Feature columns are declared up front by name and initialized to zero;
/// joiners fill them in afterwards.
///
/// Row order is deterministic: countries in their wide-table order,
/// chronological within a country. The per-country row index is recorded
/// here, while the ranges are known contiguously, so later joins can slice
/// instead of scanning.
///
/// Fails if the table has fewer than two date columns: without a following
/// day there is nothing to label, and a table with unlabelled countries is
/// useless downstream.
pub fn expand(
    wide: &WideSeriesTable,
    feature_columns: &[String],
) -> Result<LongFeatureTable, AppError> {
    let dates = wide.dates();
    if dates.len() < 2 {
        return Err(AppError::insufficient_data(format!(
            "Need at least 2 date observations per country to build labels, got {}.",
            dates.len()
        )));
    }

    let rows_per_country = dates.len() - 1;
    let mut rows = Vec::with_capacity(wide.rows().len() * rows_per_country);
    let mut index: HashMap<String, Range<usize>> = HashMap::with_capacity(wide.rows().len());

    for series in wide.rows() {
        let start = rows.len();
        for i in 0..rows_per_country {
            rows.push(FeatureRow {
                country: series.country.clone(),
                date: dates[i],
                cases: series.values[i],
                features: vec![0.0; feature_columns.len()],
                next_day_cases: series.values[i + 1],
            });
        }
        index.insert(series.country.clone(), start..rows.len());
    }

    Ok(LongFeatureTable::from_parts(
        feature_columns.to_vec(),
        rows,
        index,
    ))
}
