//! Formatted terminal output for build runs.
//!
//! We keep formatting code in one place so:
//! - the alignment/ingest code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{BuildConfig, FeatureKind, LongFeatureTable};
use crate::io::ingest::IngestedWide;

/// Provenance of one feature column after its join.
#[derive(Debug, Clone)]
pub struct FeatureNote {
    pub column: String,
    pub kind: FeatureKind,
    /// Whether the source CSV existed and was loaded. When false the column
    /// holds the default value for every country.
    pub loaded: bool,
    /// Number of countries the loaded source provided values for.
    pub source_countries: usize,
    pub default: f64,
}

/// How many row-level ingest errors to spell out before eliding the rest.
const MAX_ROW_ERRORS_SHOWN: usize = 5;

/// Format the full build summary (archive stats + table shape + feature provenance).
pub fn format_build_summary(
    ingest: &IngestedWide,
    table: &LongFeatureTable,
    features: &[FeatureNote],
    config: &BuildConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== covfeat - training table build ===\n");
    out.push_str(&format!("Case type: {}\n", config.case_type.file_tag()));
    let dates = ingest.table.dates();
    out.push_str(&format!(
        "Archive: {} countries | {} dates [{} .. {}]\n",
        ingest.table.rows().len(),
        dates.len(),
        dates.first().map(|d| d.to_string()).unwrap_or_default(),
        dates.last().map(|d| d.to_string()).unwrap_or_default(),
    ));
    out.push_str(&format!(
        "Ingest: rows read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    if config.reduce {
        out.push_str("Smoothing: case counts rounded to multiples of 5\n");
    }

    for err in ingest.row_errors.iter().take(MAX_ROW_ERRORS_SHOWN) {
        let country = err.country.as_deref().unwrap_or("?");
        out.push_str(&format!(
            "  skipped line {} ({country}): {}\n",
            err.line, err.message
        ));
    }
    if ingest.row_errors.len() > MAX_ROW_ERRORS_SHOWN {
        out.push_str(&format!(
            "  ... and {} more skipped rows\n",
            ingest.row_errors.len() - MAX_ROW_ERRORS_SHOWN
        ));
    }

    out.push_str(&format!(
        "Table: {} rows x ({} feature columns + cases + label)\n",
        table.len(),
        table.feature_columns().len()
    ));

    out.push_str("\nFeatures:\n");
    for note in features {
        let kind = match note.kind {
            FeatureKind::Scalar => "scalar",
            FeatureKind::Series => "series",
        };
        if note.loaded {
            out.push_str(&format!(
                "  {:<10} {kind:<6} {} source countries (default {})\n",
                note.column, note.source_countries, note.default
            ));
        } else {
            out.push_str(&format!(
                "  {:<10} {kind:<6} source missing, default {} everywhere\n",
                note.column, note.default
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::expand;
    use crate::domain::{CaseType, CountrySeries, WideSeriesTable};
    use crate::io::ingest::RowError;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn fixture() -> (IngestedWide, LongFeatureTable, BuildConfig) {
        let dates = vec![
            NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 23).unwrap(),
        ];
        let rows = vec![CountrySeries {
            country: "Spain".to_string(),
            values: vec![1.0, 2.0],
        }];
        let wide = WideSeriesTable::new(dates, rows).unwrap();
        let table = expand(&wide, &["Lockdown".to_string()]).unwrap();
        let ingest = IngestedWide {
            table: wide,
            rows_read: 2,
            rows_used: 1,
            row_errors: vec![RowError {
                line: 3,
                country: Some("France".to_string()),
                message: "Non-numeric case count 'x' for 2020-01-22.".to_string(),
            }],
        };
        let config = BuildConfig {
            case_type: CaseType::Confirmed,
            raw_dir: PathBuf::from("raw"),
            source_url: String::new(),
            offline: true,
            reduce: false,
            features: Vec::new(),
            output: None,
        };
        (ingest, table, config)
    }

    #[test]
    fn summary_reports_shape_and_skipped_rows() {
        let (ingest, table, config) = fixture();
        let notes = vec![FeatureNote {
            column: "Lockdown".to_string(),
            kind: FeatureKind::Series,
            loaded: true,
            source_countries: 1,
            default: 0.0,
        }];

        let text = format_build_summary(&ingest, &table, &notes, &config);

        assert!(text.contains("Case type: confirmed"), "got:\n{text}");
        assert!(text.contains("1 countries | 2 dates"), "got:\n{text}");
        assert!(text.contains("rows read=2 used=1 skipped=1"), "got:\n{text}");
        assert!(text.contains("skipped line 3 (France)"), "got:\n{text}");
        assert!(text.contains("1 rows x (1 feature columns"), "got:\n{text}");
        assert!(text.contains("Lockdown"), "got:\n{text}");
    }

    #[test]
    fn summary_flags_missing_feature_sources() {
        let (ingest, table, config) = fixture();
        let notes = vec![FeatureNote {
            column: "Popden".to_string(),
            kind: FeatureKind::Scalar,
            loaded: false,
            source_countries: 0,
            default: 0.0,
        }];

        let text = format_build_summary(&ingest, &table, &notes, &config);
        assert!(
            text.contains("source missing, default 0 everywhere"),
            "got:\n{text}"
        );
    }
}
