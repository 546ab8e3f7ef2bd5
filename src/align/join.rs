//! Feature joins into the long training table.
//!
//! Both joins write exactly one feature column and never add or remove rows,
//! so joins for different columns are independent and may run in any order.

use crate::domain::{LongFeatureTable, ScalarSource, SeriesSource};
use crate::error::AppError;

/// Broadcast a per-country constant into `column`.
///
/// Every row of a country gets the source's single value for that country, or
/// `default` when the country is missing from the source. Countries present
/// in the source but absent from the table are ignored: there is no row to
/// write into.
pub fn join_scalar(
    table: &mut LongFeatureTable,
    column: &str,
    source: &ScalarSource,
    default: f64,
) -> Result<(), AppError> {
    let col = table.column_index(column)?;

    for (country, range) in table.country_ranges() {
        let value = source.get(&country).unwrap_or(default);
        for row in &mut table.rows_mut()[range] {
            row.features[col] = value;
        }
    }

    Ok(())
}

/// Align a per-country value sequence into `column`, position by position.
///
/// For a country with N table rows and M source values:
///
/// - `M >= N`: the first N values are assigned positionally; extras are
///   dropped.
/// - `0 < M < N`: the M values are assigned positionally and the last one is
///   carried forward over the remaining rows ("not yet reported, assume
///   unchanged from the last report").
/// - `M == 0`, or the country is missing from the source: every row gets
///   `default`. An empty sequence has no last value to carry.
///
/// Alignment is by row index, not by date label: the caller must hand in a
/// source whose sequence starts at the same date as the country's first table
/// row. Carry-forward is a plain positional copy of the last value, not any
/// kind of forecast.
pub fn join_series(
    table: &mut LongFeatureTable,
    column: &str,
    source: &SeriesSource,
    default: f64,
) -> Result<(), AppError> {
    let col = table.column_index(column)?;

    for (country, range) in table.country_ranges() {
        let rows = &mut table.rows_mut()[range];
        match source.get(&country) {
            Some(values) if !values.is_empty() => {
                let last = values[values.len() - 1];
                for (i, row) in rows.iter_mut().enumerate() {
                    row.features[col] = values.get(i).copied().unwrap_or(last);
                }
            }
            _ => {
                for row in rows {
                    row.features[col] = default;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::expand;
    use crate::domain::{CountrySeries, WideSeriesTable};
    use chrono::NaiveDate;

    /// Table with 5 rows each for ES and IT, feature columns `X` and `Y`.
    fn table() -> LongFeatureTable {
        let dates: Vec<NaiveDate> = (1..=6)
            .map(|day| NaiveDate::from_ymd_opt(2020, 3, day).unwrap())
            .collect();
        let rows = vec![
            CountrySeries {
                country: "ES".to_string(),
                values: (0..6).map(|v| v as f64).collect(),
            },
            CountrySeries {
                country: "IT".to_string(),
                values: (0..6).map(|v| (v * 10) as f64).collect(),
            },
        ];
        let wide = WideSeriesTable::new(dates, rows).unwrap();
        let table = expand(&wide, &["X".to_string(), "Y".to_string()]).unwrap();

        assert_eq!(table.country_range("ES"), Some(0..5));
        assert_eq!(table.country_range("IT"), Some(5..10));
        table
    }

    fn column_for<'t>(table: &'t LongFeatureTable, country: &str, column: &str) -> Vec<f64> {
        let col = table.column_index(column).unwrap();
        let range = table.country_range(country).unwrap();
        table.rows()[range].iter().map(|r| r.features[col]).collect()
    }

    #[test]
    fn scalar_broadcasts_to_every_row_of_the_country() {
        let mut t = table();
        let source: ScalarSource = [("ES".to_string(), 7.0)].into_iter().collect();

        join_scalar(&mut t, "X", &source, 0.0).unwrap();

        assert_eq!(column_for(&t, "ES", "X"), vec![7.0; 5]);
        // IT is absent from the source and falls back to the default.
        assert_eq!(column_for(&t, "IT", "X"), vec![0.0; 5]);
    }

    #[test]
    fn scalar_ignores_countries_not_in_the_table() {
        let mut t = table();
        let source: ScalarSource = [
            ("ES".to_string(), 1.0),
            ("ATLANTIS".to_string(), 99.0),
        ]
        .into_iter()
        .collect();

        join_scalar(&mut t, "X", &source, 0.0).unwrap();
        assert_eq!(t.len(), 10, "no rows may be added for unknown countries");
    }

    #[test]
    fn scalar_unknown_column_is_an_error_and_writes_nothing() {
        let mut t = table();
        let before = t.rows().to_vec();
        let source: ScalarSource = [("ES".to_string(), 7.0)].into_iter().collect();

        let err = join_scalar(&mut t, "Nope", &source, 0.0).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(t.rows(), &before[..], "failed join must not touch the table");
    }

    #[test]
    fn series_exact_fit_assigns_positionally() {
        let mut t = table();
        let source: SeriesSource =
            [("ES".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0])].into_iter().collect();

        join_series(&mut t, "X", &source, 0.0).unwrap();
        assert_eq!(column_for(&t, "ES", "X"), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn series_carries_last_value_forward() {
        let mut t = table();
        let source: SeriesSource = [("ES".to_string(), vec![1.0, 2.0, 3.0])].into_iter().collect();

        join_series(&mut t, "X", &source, 0.0).unwrap();
        assert_eq!(column_for(&t, "ES", "X"), vec![1.0, 2.0, 3.0, 3.0, 3.0]);
    }

    #[test]
    fn series_truncates_overlong_sources() {
        let mut t = table();
        let source: SeriesSource = [(
            "ES".to_string(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
        )]
        .into_iter()
        .collect();

        join_series(&mut t, "X", &source, 0.0).unwrap();
        assert_eq!(column_for(&t, "ES", "X"), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn series_empty_sequence_falls_back_to_default() {
        // Degenerate "too short" case: there is no last value to carry.
        let mut t = table();
        let source: SeriesSource = [("ES".to_string(), vec![])].into_iter().collect();

        join_series(&mut t, "X", &source, 9.0).unwrap();
        assert_eq!(column_for(&t, "ES", "X"), vec![9.0; 5]);
    }

    #[test]
    fn series_missing_country_falls_back_to_default() {
        let mut t = table();
        let source: SeriesSource = [("IT".to_string(), vec![1.0, 1.0, 1.0])].into_iter().collect();

        join_series(&mut t, "X", &source, 4.0).unwrap();
        assert_eq!(column_for(&t, "ES", "X"), vec![4.0; 5]);
    }

    #[test]
    fn joins_write_disjoint_columns() {
        let mut t = table();
        let scalar: ScalarSource = [("ES".to_string(), 7.0)].into_iter().collect();
        let series: SeriesSource = [("ES".to_string(), vec![1.0, 2.0])].into_iter().collect();

        join_scalar(&mut t, "X", &scalar, 0.0).unwrap();
        join_series(&mut t, "Y", &series, 0.0).unwrap();

        assert_eq!(column_for(&t, "ES", "X"), vec![7.0; 5]);
        assert_eq!(column_for(&t, "ES", "Y"), vec![1.0, 2.0, 2.0, 2.0, 2.0]);

        // Re-running one join does not disturb the other column.
        join_scalar(&mut t, "X", &scalar, 0.0).unwrap();
        assert_eq!(column_for(&t, "ES", "Y"), vec![1.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn joins_never_touch_cases_or_labels() {
        let mut t = table();
        let before: Vec<(f64, f64)> = t.rows().iter().map(|r| (r.cases, r.next_day_cases)).collect();
        let scalar: ScalarSource = [("ES".to_string(), 7.0)].into_iter().collect();

        join_scalar(&mut t, "X", &scalar, 0.0).unwrap();

        let after: Vec<(f64, f64)> = t.rows().iter().map(|r| (r.cases, r.next_day_cases)).collect();
        assert_eq!(before, after);
    }
}
