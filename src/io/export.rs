//! Export the training table to CSV.
//!
//! The export is the hand-off to the model-training stage; column names and
//! values are written exactly as built (no casting of the label column).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::LongFeatureTable;
use crate::error::AppError;

/// Date format used in the output `Date` column, matching the raw archive's
/// header labels.
const DATE_FORMAT: &str = "%m/%d/%y";

/// Write the training table to a CSV file.
pub fn write_feature_csv(path: &Path, table: &LongFeatureTable) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create output CSV '{}': {e}",
            path.display()
        ))
    })?;
    write_feature_csv_to(file, table)
        .map_err(|e| AppError::input(format!("Failed to write output CSV '{}': {e}", path.display())))
}

fn write_feature_csv_to<W: Write>(out: W, table: &LongFeatureTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Country".to_string(), "Date".to_string(), "Cases".to_string()];
    header.extend(table.feature_columns().iter().cloned());
    header.push("NextDay".to_string());
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![
            row.country.clone(),
            row.date.format(DATE_FORMAT).to_string(),
            row.cases.to_string(),
        ];
        record.extend(row.features.iter().map(f64::to_string));
        record.push(row.next_day_cases.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{expand, join_scalar};
    use crate::domain::{CountrySeries, ScalarSource, WideSeriesTable};
    use chrono::NaiveDate;

    fn sample_table() -> LongFeatureTable {
        let dates = vec![
            NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 23).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 24).unwrap(),
        ];
        let rows = vec![CountrySeries {
            country: "Korea, South".to_string(),
            values: vec![1.0, 2.5, 4.0],
        }];
        let wide = WideSeriesTable::new(dates, rows).unwrap();
        let mut table = expand(&wide, &["Popden".to_string()]).unwrap();
        let source: ScalarSource = [("Korea, South".to_string(), 527.0)].into_iter().collect();
        join_scalar(&mut table, "Popden", &source, 0.0).unwrap();
        table
    }

    #[test]
    fn export_writes_header_and_rows() {
        let mut buf = Vec::new();
        write_feature_csv_to(&mut buf, &sample_table()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Country,Date,Cases,Popden,NextDay"));
        // Comma-bearing country names must be quoted to stay one field.
        assert_eq!(lines.next(), Some("\"Korea, South\",01/22/20,1,527,2.5"));
        assert_eq!(lines.next(), Some("\"Korea, South\",01/23/20,2.5,527,4"));
        assert_eq!(lines.next(), None);
    }
}
