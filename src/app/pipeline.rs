//! Shared build-pipeline logic used by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! archive fetch -> ingest -> wide-to-long expansion -> feature joins
//!
//! The front-end then only does presentation (summary printing, export).

use crate::align;
use crate::data::GithubClient;
use crate::domain::{BuildConfig, FeatureKind, LongFeatureTable, ScalarSource, SeriesSource};
use crate::error::AppError;
use crate::io::ingest::{self, IngestedWide};
use crate::report::FeatureNote;

/// All computed outputs of a single `covfeat build` run.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub ingest: IngestedWide,
    pub table: LongFeatureTable,
    pub features: Vec<FeatureNote>,
}

/// Execute the full build pipeline and return the computed outputs.
pub fn run_build(config: &BuildConfig) -> Result<BuildOutput, AppError> {
    // 1) Refresh the raw archive, unless told to work offline.
    if !config.offline {
        let client = GithubClient::from_env()?;
        client.fetch_case_archive(&config.source_url, &config.raw_dir)?;
    }

    // 2) Ingest the case CSV for the requested case type.
    let cases_csv = ingest::find_case_csv(&config.raw_dir, config.case_type)?;
    let ingested = ingest::load_wide_table(&cases_csv, config.reduce)?;

    run_build_with_ingest(config, ingested)
}

/// Execute the pipeline with an already-ingested wide table.
///
/// This is useful for tests and for callers that ingest from memory.
pub fn run_build_with_ingest(
    config: &BuildConfig,
    ingested: IngestedWide,
) -> Result<BuildOutput, AppError> {
    // 3) Expand wide -> long, declaring one feature column per configured spec.
    let columns: Vec<String> = config.features.iter().map(|f| f.column.clone()).collect();
    let mut table = align::expand(&ingested.table, &columns)?;

    // 4) Join each feature source into its column. A missing source file is
    //    not an error: the column keeps the join default everywhere, and the
    //    summary reports it.
    let mut notes = Vec::with_capacity(config.features.len());
    for spec in &config.features {
        let loaded = spec.path.is_file();
        let source_countries = match spec.kind {
            FeatureKind::Scalar => {
                let source = if loaded {
                    let column = spec.source_column.as_deref().unwrap_or(&spec.column);
                    ingest::load_scalar_source(&spec.path, column)?
                } else {
                    ScalarSource::default()
                };
                align::join_scalar(&mut table, &spec.column, &source, spec.default)?;
                source.len()
            }
            FeatureKind::Series => {
                let source = if loaded {
                    ingest::load_series_source(&spec.path)?
                } else {
                    SeriesSource::default()
                };
                align::join_series(&mut table, &spec.column, &source, spec.default)?;
                source.len()
            }
        };
        notes.push(FeatureNote {
            column: spec.column.clone(),
            kind: spec.kind,
            loaded,
            source_countries,
            default: spec.default,
        });
    }

    Ok(BuildOutput {
        ingest: ingested,
        table,
        features: notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseType, FeatureSpec};
    use std::path::PathBuf;

    const RAW: &str = "\
Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20
,Spain,40.0,-4.0,1,2,4
,Italy,41.9,12.6,10,20,30
";

    fn config(features: Vec<FeatureSpec>) -> BuildConfig {
        BuildConfig {
            case_type: CaseType::Confirmed,
            raw_dir: PathBuf::from("unused"),
            source_url: String::new(),
            offline: true,
            reduce: false,
            features,
            output: None,
        }
    }

    fn spec(column: &str, kind: FeatureKind) -> FeatureSpec {
        FeatureSpec {
            column: column.to_string(),
            kind,
            // Deliberately nonexistent: sources fall back to the default.
            path: PathBuf::from("/nonexistent/feature.csv"),
            source_column: None,
            default: 7.0,
        }
    }

    #[test]
    fn build_declares_columns_in_spec_order() {
        let ingested = ingest::load_wide_table_from_reader(RAW.as_bytes(), false).unwrap();
        let config = config(vec![
            spec("Popden", FeatureKind::Scalar),
            spec("Lockdown", FeatureKind::Series),
        ]);

        let out = run_build_with_ingest(&config, ingested).unwrap();

        assert_eq!(out.table.feature_columns(), &["Popden", "Lockdown"]);
        // 2 countries * (3 dates - 1).
        assert_eq!(out.table.len(), 4);
    }

    #[test]
    fn missing_sources_default_every_row_and_are_reported() {
        let ingested = ingest::load_wide_table_from_reader(RAW.as_bytes(), false).unwrap();
        let config = config(vec![
            spec("Popden", FeatureKind::Scalar),
            spec("Lockdown", FeatureKind::Series),
        ]);

        let out = run_build_with_ingest(&config, ingested).unwrap();

        for row in out.table.rows() {
            assert_eq!(row.features, vec![7.0, 7.0]);
        }
        for note in &out.features {
            assert!(!note.loaded);
            assert_eq!(note.source_countries, 0);
        }
    }

    #[test]
    fn build_without_features_still_labels_rows() {
        let ingested = ingest::load_wide_table_from_reader(RAW.as_bytes(), false).unwrap();
        let out = run_build_with_ingest(&config(Vec::new()), ingested).unwrap();

        assert!(out.features.is_empty());
        assert_eq!(out.table.rows()[0].cases, 1.0);
        assert_eq!(out.table.rows()[0].next_day_cases, 2.0);
    }
}
