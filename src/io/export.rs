//! Export the forecast table to CSV.
//!
//! One row per forecast day; `actual` and `error` are empty when the day is
//! outside the known data.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ForecastPoint;
use crate::error::AppError;

/// Write forecast rows to a CSV file.
pub fn write_forecast_csv(path: &Path, rows: &[ForecastPoint]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_forecast_rows(&mut file, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote forecast CSV");
    Ok(())
}

pub fn write_forecast_rows<W: Write>(out: &mut W, rows: &[ForecastPoint]) -> Result<(), AppError> {
    writeln!(out, "date,weekday,forecast,actual,error")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in rows {
        writeln!(
            out,
            "{},{},{:.4},{},{}",
            r.date,
            r.date.format("%a"),
            r.value,
            r.actual.map(|v| format!("{v:.4}")).unwrap_or_default(),
            r.actual.map(|v| format!("{:.4}", r.value - v)).unwrap_or_default(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rows_leave_unknown_actuals_empty() {
        let d = NaiveDate::from_ymd_opt(2018, 4, 1).unwrap();
        let rows = [
            ForecastPoint {
                date: d,
                value: 10.0,
                actual: Some(12.5),
            },
            ForecastPoint {
                date: d.succ_opt().unwrap(),
                value: 11.0,
                actual: None,
            },
        ];
        let mut buf = Vec::new();
        write_forecast_rows(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,weekday,forecast,actual,error");
        assert_eq!(lines[1], "2018-04-01,Sun,10.0000,12.5000,-2.5000");
        assert_eq!(lines[2], "2018-04-02,Mon,11.0000,,");
    }
}
