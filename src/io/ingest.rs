//! CSV ingest of a daily repayment series.
//!
//! The input has one header row and no date column: row `i` is the value for
//! `data_start + i` days. We read either the first column or a named one.
//!
//! Design goals:
//! - **Nothing silently dropped**: an unparseable cell becomes a missing value
//!   at its date, so the calendar stays aligned
//! - **Row-level reporting**: every such cell is reported with its line number
//! - **Separation of concerns**: no preprocessing here

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use csv::StringRecord;

use crate::domain::DatedSeries;
use crate::error::AppError;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub date: NaiveDate,
    pub message: String,
}

/// Summary of the values that were read.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_points: usize,
    pub n_missing: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Ingest output: the dated series plus diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub series: DatedSeries,
    pub column: String,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
}

impl IngestedData {
    pub fn data_start(&self) -> Option<NaiveDate> {
        self.series.first_date()
    }

    pub fn data_end(&self) -> Option<NaiveDate> {
        self.series.last_date()
    }
}

/// Open `path` and ingest it.
pub fn load_series(path: &Path, column: Option<&str>, data_start: NaiveDate) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_series(file, column, data_start)?;
    tracing::info!(
        path = %path.display(),
        column = %data.column,
        points = data.stats.n_points,
        missing = data.stats.n_missing,
        row_errors = data.row_errors.len(),
        "loaded series"
    );
    Ok(data)
}

/// Ingest from any reader (used directly by tests).
pub fn read_series<R: Read>(reader: R, column: Option<&str>, data_start: NaiveDate) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let (col_idx, col_name) = resolve_column(&headers, column)?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; lines are 1-based.
        let line = idx + 2;
        let date = data_start + Duration::days(idx as i64);

        let value = match result {
            Ok(record) => match parse_cell(&record, col_idx) {
                Ok(v) => Some(v),
                Err(message) => {
                    row_errors.push(RowError { line, date, message });
                    None
                }
            },
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    date,
                    message: format!("CSV parse error: {e}"),
                });
                None
            }
        };
        points.push(value);
    }

    if points.is_empty() {
        return Err(AppError::new(2, "CSV contains no data rows."));
    }
    let series = DatedSeries::from_start_opt(data_start, points);
    let stats = compute_stats(&series)
        .ok_or_else(|| AppError::new(2, format!("Column '{col_name}' has no numeric values.")))?;

    for err in &row_errors {
        tracing::warn!(line = err.line, date = %err.date, "{}", err.message);
    }

    Ok(IngestedData {
        series,
        column: col_name,
        stats,
        row_errors,
    })
}

fn resolve_column(headers: &StringRecord, column: Option<&str>) -> Result<(usize, String), AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    match column {
        None => names
            .first()
            .map(|n| (0, n.clone()))
            .ok_or_else(|| AppError::new(2, "CSV has no columns.")),
        Some(wanted) => {
            let wanted_norm = normalize_header_name(wanted);
            names
                .iter()
                .position(|n| n.eq_ignore_ascii_case(&wanted_norm))
                .map(|idx| (idx, names[idx].clone()))
                .ok_or_else(|| {
                    AppError::new(
                        2,
                        format!("Missing column '{wanted}'. Available: {}", names.join(", ")),
                    )
                })
        }
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_cell(record: &StringRecord, idx: usize) -> Result<f64, String> {
    let raw = record.get(idx).unwrap_or("").trim();
    if raw.is_empty() {
        return Err("empty value".to_string());
    }
    let cleaned = raw.replace(',', "");
    let value: f64 = cleaned
        .parse()
        .map_err(|_| format!("cannot parse '{raw}' as a number"))?;
    if !value.is_finite() {
        return Err(format!("non-finite value '{raw}'"));
    }
    Ok(value)
}

fn compute_stats(series: &DatedSeries) -> Option<DatasetStats> {
    let present: Vec<f64> = series.values().flatten().collect();
    if present.is_empty() {
        return None;
    }
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(DatasetStats {
        n_points: series.len(),
        n_missing: series.missing_count(),
        min,
        max,
        mean: crate::math::mean(&present),
    })
}
