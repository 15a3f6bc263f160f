//! Outlier-window removal.

use chrono::NaiveDate;

use crate::domain::DatedSeries;
use crate::error::{ForecastError, Result};

/// Remove the inclusive window `[start, end]` from `series`.
///
/// The remaining points keep their real dates, so the result has a gap. There
/// is no inverse: forecasts are never produced inside the dropped window.
pub fn drop_window(series: &DatedSeries, start: NaiveDate, end: NaiveDate) -> Result<DatedSeries> {
    let kept = series.exclude(start, end);
    if kept.is_empty() {
        return Err(ForecastError::config(format!(
            "drop window {start}..={end} removes every observation"
        )));
    }
    tracing::debug!(
        removed = series.len() - kept.len(),
        %start,
        %end,
        "dropped outlier window"
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn drops_spring_festival_trough() {
        let s = DatedSeries::from_start(d(2018, 2, 1), (0..28).map(f64::from));
        let kept = drop_window(&s, d(2018, 2, 14), d(2018, 2, 22)).unwrap();
        assert_eq!(kept.len(), 28 - 9);
        assert!(kept.contains_date(d(2018, 2, 13)));
        assert!(!kept.contains_date(d(2018, 2, 14)));
        assert!(!kept.contains_date(d(2018, 2, 22)));
        assert!(kept.contains_date(d(2018, 2, 23)));
    }

    #[test]
    fn dropping_everything_is_an_error() {
        let s = DatedSeries::from_start(d(2018, 2, 14), [1.0, 2.0]);
        assert!(drop_window(&s, d(2018, 2, 1), d(2018, 2, 28)).is_err());
    }
}
