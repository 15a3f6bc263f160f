//! Forecast error metrics against known actuals.
//!
//! Only dates present in both series with a value on each side count.

use serde::{Deserialize, Serialize};

use crate::domain::DatedSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Number of aligned (actual, forecast) pairs.
    pub n: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Percent; days with a zero actual add nothing to the sum.
    pub mape: f64,
    /// Explained over total sum of squares around the actual mean.
    pub r2: f64,
}

/// Align `forecast` with `actual` by date.
pub fn aligned_pairs(actual: &DatedSeries, forecast: &DatedSeries) -> Vec<(f64, f64)> {
    forecast
        .points()
        .iter()
        .filter_map(|(date, f)| Some((actual.get(*date)?, (*f)?)))
        .collect()
}

/// Metrics over the overlap; `None` when nothing overlaps.
pub fn compute_metrics(actual: &DatedSeries, forecast: &DatedSeries) -> Option<ErrorMetrics> {
    let pairs = aligned_pairs(actual, forecast);
    if pairs.is_empty() {
        return None;
    }
    let n = pairs.len() as f64;

    let mse = pairs.iter().map(|(a, f)| (a - f).powi(2)).sum::<f64>() / n;
    let mae = pairs.iter().map(|(a, f)| (a - f).abs()).sum::<f64>() / n;
    let mape = pairs
        .iter()
        .filter(|(a, _)| *a != 0.0)
        .map(|(a, f)| ((a - f) / a).abs())
        .sum::<f64>()
        * 100.0
        / n;

    let mean_actual = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let ss_reg: f64 = pairs.iter().map(|(_, f)| (f - mean_actual).powi(2)).sum();
    let ss_tot: f64 = pairs.iter().map(|(a, _)| (a - mean_actual).powi(2)).sum();
    let r2 = if ss_tot > 0.0 { ss_reg / ss_tot } else { f64::NAN };

    Some(ErrorMetrics {
        n: pairs.len(),
        mse,
        rmse: mse.sqrt(),
        mae,
        mape,
        r2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 4, day).unwrap()
    }

    #[test]
    fn metrics_over_partial_overlap() {
        let actual = DatedSeries::from_start(d(1), [100.0, 200.0]);
        let forecast = DatedSeries::from_start(d(1), [110.0, 180.0, 999.0]);
        let m = compute_metrics(&actual, &forecast).unwrap();
        assert_eq!(m.n, 2);
        assert_relative_eq!(m.mse, 250.0);
        assert_relative_eq!(m.rmse, 250f64.sqrt());
        assert_relative_eq!(m.mae, 15.0);
        assert_relative_eq!(m.mape, 10.0);
        // mean 150: reg = 40² + 30², tot = 2 * 50²
        assert_relative_eq!(m.r2, 2500.0 / 5000.0);
    }

    #[test]
    fn no_overlap_means_no_metrics() {
        let actual = DatedSeries::from_start(d(1), [1.0]);
        let forecast = DatedSeries::from_start(d(2), [1.0]);
        assert!(compute_metrics(&actual, &forecast).is_none());
    }

    #[test]
    fn missing_actuals_are_skipped() {
        let actual = DatedSeries::from_start_opt(d(1), [Some(10.0), None, Some(0.0)]);
        let forecast = DatedSeries::from_start(d(1), [12.0, 5.0, 1.0]);
        let m = compute_metrics(&actual, &forecast).unwrap();
        assert_eq!(m.n, 2);
        assert_relative_eq!(m.mae, 1.5);
        assert_relative_eq!(m.mape, 10.0);
    }
}
