//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while building the training table
//! - exported to CSV for the model-training stage
//! - reloaded later for inspection or comparisons

use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which case-count series to build the table from.
///
/// The raw archive ships one time-series CSV per case type; the file is picked
/// by matching this name against the CSV file names in the raw-data folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Confirmed,
    Deaths,
    Recovered,
}

impl CaseType {
    /// Substring expected in the raw CSV file name for this case type.
    pub fn file_tag(&self) -> &'static str {
        match self {
            CaseType::Confirmed => "confirmed",
            CaseType::Deaths => "deaths",
            CaseType::Recovered => "recovered",
        }
    }
}

/// One country's case-count series, aligned to the owning table's date axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountrySeries {
    pub country: String,
    pub values: Vec<f64>,
}

/// Rectangular per-country table: one row per country, one column per date.
///
/// Invariants (enforced by [`WideSeriesTable::new`]):
///
/// - every row has exactly `dates.len()` values
/// - the date axis is strictly increasing
/// - each country appears in exactly one row
///
/// Row order is preserved from the input; it determines the country order of
/// the expanded training table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WideSeriesTable {
    dates: Vec<NaiveDate>,
    rows: Vec<CountrySeries>,
}

impl WideSeriesTable {
    pub fn new(dates: Vec<NaiveDate>, rows: Vec<CountrySeries>) -> Result<Self, AppError> {
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(AppError::input(format!(
                "Date axis is not strictly increasing near {}.",
                w[0]
            )));
        }

        let mut seen: HashMap<&str, ()> = HashMap::with_capacity(rows.len());
        for row in &rows {
            if row.values.len() != dates.len() {
                return Err(AppError::input(format!(
                    "Country '{}' has {} values but the date axis has {} entries.",
                    row.country,
                    row.values.len(),
                    dates.len()
                )));
            }
            if seen.insert(row.country.as_str(), ()).is_some() {
                return Err(AppError::input(format!(
                    "Country '{}' appears in more than one row.",
                    row.country
                )));
            }
        }

        Ok(Self { dates, rows })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[CountrySeries] {
        &self.rows
    }
}

/// One (country, date) observation of the training table.
///
/// `features` is parallel to the owning table's declared feature columns and
/// starts out all-zero; joiners fill it in column by column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub country: String,
    pub date: NaiveDate,
    pub cases: f64,
    pub features: Vec<f64>,
    pub next_day_cases: f64,
}

/// The long training table: one row per (country, date) pair, grouped by
/// country and chronological within a country.
///
/// Built once by [`crate::align::expand`]; after that, rows are never added or
/// removed — joiners only write values into their own feature column. The
/// per-country row index is computed at expansion time so joins can slice
/// directly instead of rescanning the whole table per country per column.
#[derive(Debug, Clone)]
pub struct LongFeatureTable {
    feature_columns: Vec<String>,
    rows: Vec<FeatureRow>,
    index: HashMap<String, Range<usize>>,
}

impl LongFeatureTable {
    pub(crate) fn from_parts(
        feature_columns: Vec<String>,
        rows: Vec<FeatureRow>,
        index: HashMap<String, Range<usize>>,
    ) -> Self {
        Self {
            feature_columns,
            rows,
            index,
        }
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [FeatureRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a declared feature column.
    ///
    /// Writing to a column the table never declared is a caller error, not a
    /// silent no-op.
    pub fn column_index(&self, column: &str) -> Result<usize, AppError> {
        self.feature_columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| {
                AppError::input(format!(
                    "Unknown feature column '{column}' (declared: {}).",
                    self.feature_columns.join(", ")
                ))
            })
    }

    /// Contiguous row range for one country, if it is present in the table.
    pub fn country_range(&self, country: &str) -> Option<Range<usize>> {
        self.index.get(country).cloned()
    }

    /// All (country, row range) pairs, in table row order.
    pub fn country_ranges(&self) -> Vec<(String, Range<usize>)> {
        let mut ranges: Vec<(String, Range<usize>)> = self
            .index
            .iter()
            .map(|(c, r)| (c.clone(), r.clone()))
            .collect();
        ranges.sort_by_key(|(_, r)| r.start);
        ranges
    }
}

/// A per-country constant feature: one value per country.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalarSource {
    values: HashMap<String, f64>,
}

impl ScalarSource {
    pub fn new(values: HashMap<String, f64>) -> Self {
        Self { values }
    }

    pub fn get(&self, country: &str) -> Option<f64> {
        self.values.get(country).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for ScalarSource {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A per-country time-varying feature: an ordered value sequence per country.
///
/// Sequences do not have to match the training table's per-country row count;
/// the series join truncates long sequences and carries the last value forward
/// over short ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesSource {
    values: HashMap<String, Vec<f64>>,
}

impl SeriesSource {
    pub fn new(values: HashMap<String, Vec<f64>>) -> Self {
        Self { values }
    }

    pub fn get(&self, country: &str) -> Option<&[f64]> {
        self.values.get(country).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Vec<f64>)> for SeriesSource {
    fn from_iter<T: IntoIterator<Item = (String, Vec<f64>)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// How a feature source's values relate to the date axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// One constant value per country, broadcast to all of its rows.
    Scalar,
    /// One value per date per country, aligned positionally.
    Series,
}

/// One feature column of the training table and where its values come from.
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    /// Column name in the output table (e.g. `Lockdown`).
    pub column: String,
    pub kind: FeatureKind,
    /// CSV file holding the source data. A missing file is not an error: the
    /// column then keeps `default` for every country (and the build summary
    /// says so).
    pub path: PathBuf,
    /// For scalar sources: the value column to read. Defaults to `column`.
    pub source_column: Option<String>,
    /// Value for countries absent from the source.
    pub default: f64,
}

/// Resolved configuration for a single build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub case_type: CaseType,
    /// Folder holding the downloaded raw time-series CSVs.
    pub raw_dir: PathBuf,
    /// GitHub contents-API URL of the folder to fetch raw CSVs from.
    pub source_url: String,
    /// Skip the download step and build from whatever is already on disk.
    pub offline: bool,
    /// Round every case count to the nearest multiple of 5.
    pub reduce: bool,
    pub features: Vec<FeatureSpec>,
    pub output: Option<PathBuf>,
}
