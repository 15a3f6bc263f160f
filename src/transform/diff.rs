//! Lag differencing and its inverses.
//!
//! Forward differencing is positional (`v[i] - v[i-lag]`), which is the same as
//! date arithmetic on a contiguous series.
//!
//! Recovery of a lag-7 difference over a forecast horizon has to look back 7
//! steps. For the first 7 forecast steps that lands inside the known series;
//! after that it lands on values recovered earlier in the same horizon, so the
//! loop below must run strictly in forecast order.

use crate::domain::DatedSeries;
use crate::error::{ForecastError, Result};

/// Weekly lag used by seasonal differencing.
pub const SEASONAL_LAG: usize = 7;

/// `v[i] - v[i-lag]`; the first `lag` points are dropped.
pub fn difference(series: &DatedSeries, lag: usize) -> Result<DatedSeries> {
    if lag == 0 {
        return Err(ForecastError::config("difference lag must be positive"));
    }
    if series.len() <= lag {
        return Err(ForecastError::config(format!(
            "series of {} points is too short for a lag-{lag} difference",
            series.len()
        )));
    }
    Ok(series.lagged_difference(lag))
}

/// Invert a lag-1 difference: running sum of `predicted` on top of `last`.
pub fn integrate(predicted: &[f64], last: f64) -> Vec<f64> {
    predicted
        .iter()
        .scan(last, |level, diff| {
            *level += diff;
            Some(*level)
        })
        .collect()
}

/// Invert a lag-`lag` difference over a forecast horizon.
///
/// `history` is the full pre-difference series; forecast step `h` (0-based)
/// sits at position `history.len() + h`. Its lag partner is taken from
/// `history` when it falls inside it, otherwise from the values recovered so
/// far.
pub fn seasonal_integrate(predicted: &[f64], history: &[f64], lag: usize) -> Result<Vec<f64>> {
    if lag == 0 {
        return Err(ForecastError::recovery("seasonal lag must be positive"));
    }
    if history.len() < lag {
        return Err(ForecastError::recovery(format!(
            "seasonal recovery needs at least {lag} known values, got {}",
            history.len()
        )));
    }

    let n = history.len();
    let mut recovered: Vec<f64> = Vec::with_capacity(predicted.len());
    for (h, value) in predicted.iter().enumerate() {
        let partner = n + h - lag;
        let base = if partner < n {
            history[partner]
        } else {
            recovered[partner - n]
        };
        recovered.push(value + base);
    }
    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 3, 1).unwrap()
    }

    #[test]
    fn difference_drops_leading_points() {
        let s = DatedSeries::from_start(start(), [1.0, 4.0, 9.0, 16.0]);
        let d1 = difference(&s, 1).unwrap();
        assert_eq!(d1.complete_values().unwrap(), vec![3.0, 5.0, 7.0]);
        assert_eq!(d1.first_date(), NaiveDate::from_ymd_opt(2018, 3, 2));
        assert!(difference(&s, 4).is_err());
    }

    #[test]
    fn integrate_undoes_lag_one() {
        let values = [10.0, 12.0, 11.0, 13.0, 15.0, 20.0, 18.0, 11.0];
        let s = DatedSeries::from_start(start(), values);
        let (known, future) = values.split_at(5);

        let diffs = difference(&s, 1).unwrap().complete_values().unwrap();
        let future_diffs = &diffs[known.len() - 1..];
        let rebuilt = integrate(future_diffs, known[known.len() - 1]);
        assert_eq!(rebuilt, future.to_vec());
    }

    #[test]
    fn seasonal_integrate_identity_within_one_week() {
        let values: Vec<f64> = (0..21).map(|i| f64::from(i * i % 11) + f64::from(i)).collect();
        let s = DatedSeries::from_start(start(), values.iter().copied());
        let d7 = difference(&s, SEASONAL_LAG).unwrap().complete_values().unwrap();

        // Last 5 points are the "future".
        let (known, future) = values.split_at(16);
        let predicted = &d7[d7.len() - 5..];
        let rebuilt = seasonal_integrate(predicted, known, SEASONAL_LAG).unwrap();
        assert_eq!(rebuilt, future.to_vec());
    }

    #[test]
    fn seasonal_integrate_chains_past_one_week() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i % 7) * 3.0 + f64::from(i) * 0.5).collect();
        let s = DatedSeries::from_start(start(), values.iter().copied());
        let d7 = difference(&s, SEASONAL_LAG).unwrap().complete_values().unwrap();

        // A 12-day horizon: steps 7..12 must reuse recovered values.
        let (known, future) = values.split_at(18);
        let predicted = &d7[d7.len() - 12..];
        let rebuilt = seasonal_integrate(predicted, known, SEASONAL_LAG).unwrap();
        for (a, b) in rebuilt.iter().zip(future) {
            assert!((a - b).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn seasonal_integrate_repeats_last_week_for_zero_prediction() {
        let history = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let rebuilt = seasonal_integrate(&[0.0; 9], &history, SEASONAL_LAG).unwrap();
        assert_eq!(rebuilt, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 2.0, 3.0]);
    }

    #[test]
    fn seasonal_integrate_needs_a_full_week() {
        let err = seasonal_integrate(&[0.0], &[1.0, 2.0], SEASONAL_LAG).unwrap_err();
        assert!(matches!(err, ForecastError::Recovery(_)));
    }
}
