//! CSV ingest and normalization.
//!
//! This module turns the raw per-province time-series CSV into a clean
//! [`WideSeriesTable`] that is safe to expand, and loads per-country feature
//! source CSVs.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** for the bulky case archive (skip bad rows, but
//!   report what happened)
//! - **Fail-fast** for feature sources: a malformed feature value is a caller
//!   contract violation, not something to coerce or skip
//! - **Deterministic behavior**: country order follows first appearance in
//!   the input

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{CaseType, CountrySeries, ScalarSource, SeriesSource, WideSeriesTable};
use crate::error::AppError;

/// Date format of the raw archive's column headers (e.g. `1/22/20`).
const DATE_FORMAT: &str = "%m/%d/%y";

const COUNTRY_COL: &str = "country/region";
const SOURCE_COUNTRY_COL: &str = "country";

/// Per-province metadata columns of the raw archive that the table drops.
const DROPPED_COLS: [&str; 3] = ["province/state", "lat", "long"];

/// A row-level problem encountered during case ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub country: Option<String>,
    pub message: String,
}

/// Ingest output: the wide table plus bookkeeping for the build summary.
#[derive(Debug, Clone)]
pub struct IngestedWide {
    pub table: WideSeriesTable,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Locate the raw CSV for a case type by file-name tag.
///
/// The archive ships one time-series file per case type (`confirmed`,
/// `deaths`, `recovered`); the match is on the file name, not its contents.
pub fn find_case_csv(raw_dir: &Path, case_type: CaseType) -> Result<PathBuf, AppError> {
    let entries = std::fs::read_dir(raw_dir).map_err(|e| {
        AppError::input(format!(
            "Failed to read raw data folder '{}': {e}",
            raw_dir.display()
        ))
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "csv")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains(case_type.file_tag()))
        })
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(|| {
        AppError::input(format!(
            "Type '{}' not found in raw data folder '{}'.",
            case_type.file_tag(),
            raw_dir.display()
        ))
    })
}

/// Load and normalize a raw time-series CSV into a wide per-country table.
///
/// Normalization steps, in order:
/// 1. drop the per-province metadata columns (`Province/State`, `Lat`, `Long`)
/// 2. parse the remaining headers as the shared date axis
/// 3. sum province rows into their country
/// 4. optionally round every value to the nearest multiple of 5 (`reduce`)
///
/// Rows with unparseable values are skipped and reported; a broken schema
/// (missing country column, non-date header) is fatal.
pub fn load_wide_table(path: &Path, reduce: bool) -> Result<IngestedWide, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    load_wide_table_from_reader(file, reduce)
}

pub fn load_wide_table_from_reader<R: Read>(
    input: R,
    reduce: bool,
) -> Result<IngestedWide, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let layout = resolve_wide_layout(&headers)?;

    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, Vec<f64>> = HashMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_used = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    country: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_case_row(&record, &layout) {
            Ok((country, values)) => {
                let sums = totals.entry(country.clone()).or_insert_with(|| {
                    order.push(country);
                    vec![0.0; layout.date_cols.len()]
                });
                for (sum, value) in sums.iter_mut().zip(values) {
                    *sum += value;
                }
                rows_used += 1;
            }
            Err((country, message)) => {
                row_errors.push(RowError {
                    line,
                    country,
                    message,
                });
            }
        }
    }

    if rows_used == 0 {
        return Err(AppError::insufficient_data(
            "No usable country rows remain after ingest.",
        ));
    }

    let dates: Vec<NaiveDate> = layout.date_cols.iter().map(|(_, d)| *d).collect();
    let rows: Vec<CountrySeries> = order
        .into_iter()
        .map(|country| {
            let mut values = totals.remove(&country).unwrap_or_default();
            if reduce {
                for v in &mut values {
                    *v = (*v / 5.0).round() * 5.0;
                }
            }
            CountrySeries { country, values }
        })
        .collect();

    Ok(IngestedWide {
        table: WideSeriesTable::new(dates, rows)?,
        rows_read,
        rows_used,
        row_errors,
    })
}

/// Load a per-country constant feature from a `Country` + value-column CSV.
///
/// Unlike case ingest, feature sources fail fast: a non-numeric value or a
/// duplicate country is a contract violation by whoever prepared the file.
pub fn load_scalar_source(path: &Path, column: &str) -> Result<ScalarSource, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    load_scalar_source_from_reader(file, column)
}

pub fn load_scalar_source_from_reader<R: Read>(
    input: R,
    column: &str,
) -> Result<ScalarSource, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let header_map = build_header_map(
        reader
            .headers()
            .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?,
    );

    let country_idx = *header_map.get(SOURCE_COUNTRY_COL).ok_or_else(|| {
        AppError::input("Feature source is missing the required `Country` column.")
    })?;
    let value_idx = *header_map
        .get(&normalize_header_name(column))
        .ok_or_else(|| {
            AppError::input(format!("Feature source is missing the `{column}` column."))
        })?;

    let mut values: HashMap<String, f64> = HashMap::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::input(format!("CSV parse error at line {line}: {e}")))?;

        let country = get_required(&record, country_idx, line, "Country")?.to_string();
        let raw = get_required(&record, value_idx, line, column)?;
        let value = parse_value(raw)
            .ok_or_else(|| AppError::input(format!("Non-numeric `{column}` value '{raw}' at line {line}.")))?;

        if values.insert(country.clone(), value).is_some() {
            return Err(AppError::input(format!(
                "Country '{country}' appears twice in the feature source (line {line})."
            )));
        }
    }

    Ok(ScalarSource::new(values))
}

/// Load a per-country time-varying feature from a `Country` + per-date CSV.
///
/// Value columns are read in file order; their labels are not interpreted
/// (alignment to the training table is positional, see
/// [`crate::align::join_series`]). Trailing empty cells end a country's
/// sequence, which is how sources end up shorter than the table: the feature
/// simply has not been reported for recent dates yet. A value after an empty
/// cell would make the sequence non-contiguous and is rejected.
pub fn load_series_source(path: &Path) -> Result<SeriesSource, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    load_series_source_from_reader(file)
}

pub fn load_series_source_from_reader<R: Read>(input: R) -> Result<SeriesSource, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let header_map = build_header_map(
        reader
            .headers()
            .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?,
    );

    let country_idx = *header_map.get(SOURCE_COUNTRY_COL).ok_or_else(|| {
        AppError::input("Feature source is missing the required `Country` column.")
    })?;

    let mut values: HashMap<String, Vec<f64>> = HashMap::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::input(format!("CSV parse error at line {line}: {e}")))?;

        let country = get_required(&record, country_idx, line, "Country")?.to_string();

        let mut series = Vec::new();
        let mut ended = false;
        for (col, cell) in record.iter().enumerate() {
            if col == country_idx {
                continue;
            }
            if cell.is_empty() {
                ended = true;
                continue;
            }
            if ended {
                return Err(AppError::input(format!(
                    "Country '{country}' has a gap in its series at line {line}; \
                     sequences must be contiguous from the start date."
                )));
            }
            let value = parse_value(cell).ok_or_else(|| {
                AppError::input(format!(
                    "Non-numeric series value '{cell}' for country '{country}' at line {line}."
                ))
            })?;
            series.push(value);
        }

        if values.insert(country.clone(), series).is_some() {
            return Err(AppError::input(format!(
                "Country '{country}' appears twice in the feature source (line {line})."
            )));
        }
    }

    Ok(SeriesSource::new(values))
}

/// Resolved column layout of a raw wide CSV.
struct WideLayout {
    country_idx: usize,
    /// (column index, parsed date) for every date column, in header order.
    date_cols: Vec<(usize, NaiveDate)>,
}

fn resolve_wide_layout(headers: &StringRecord) -> Result<WideLayout, AppError> {
    let mut country_idx = None;
    let mut date_cols = Vec::new();

    for (idx, name) in headers.iter().enumerate() {
        let normalized = normalize_header_name(name);
        if normalized == COUNTRY_COL {
            country_idx = Some(idx);
            continue;
        }
        if DROPPED_COLS.contains(&normalized.as_str()) {
            continue;
        }
        let date = NaiveDate::parse_from_str(name.trim(), DATE_FORMAT).map_err(|_| {
            AppError::input(format!(
                "Unexpected column '{name}': not a known metadata column and not a `{DATE_FORMAT}` date."
            ))
        })?;
        date_cols.push((idx, date));
    }

    let country_idx = country_idx.ok_or_else(|| {
        AppError::input("Missing required column: `Country/Region`")
    })?;
    if date_cols.is_empty() {
        return Err(AppError::input("Raw CSV has no date columns."));
    }

    Ok(WideLayout {
        country_idx,
        date_cols,
    })
}

/// Parse one province row into (country, per-date values).
///
/// Errors carry the country name when it could at least be read, so the
/// report can say which rows were dropped.
fn parse_case_row(
    record: &StringRecord,
    layout: &WideLayout,
) -> Result<(String, Vec<f64>), (Option<String>, String)> {
    let country = record
        .get(layout.country_idx)
        .filter(|c| !c.is_empty())
        .ok_or((None, "Missing country value.".to_string()))?
        .to_string();

    let mut values = Vec::with_capacity(layout.date_cols.len());
    for &(idx, date) in &layout.date_cols {
        let cell = record.get(idx).unwrap_or("");
        let value = parse_value(cell).ok_or_else(|| {
            (
                Some(country.clone()),
                format!("Non-numeric case count '{cell}' for {date}."),
            )
        })?;
        values.push(value);
    }

    Ok((country, values))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on
    // the first header. If we don't strip it, schema validation will
    // incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    idx: usize,
    line: usize,
    name: &str,
) -> Result<&'a str, AppError> {
    record
        .get(idx)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::input(format!("Missing `{name}` value at line {line}.")))
}

fn parse_value(s: &str) -> Option<f64> {
    let v: f64 = s.parse().ok()?;
    v.is_finite().then_some(v)
}
