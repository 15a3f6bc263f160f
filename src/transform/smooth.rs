//! Rolling and exponential smoothing, with sequential inverses.
//!
//! Both filters drop their first `window - 1` outputs (the warm-up period where
//! a rolling mean is undefined).
//!
//! Inverting a rolling mean needs the trailing `window - 1` raw values: each
//! recovered point is `mean * window - (sum of the previous window - 1 raw
//! values)`, and it immediately joins the trailing window for the next step.

use std::collections::VecDeque;

use crate::domain::{DatedSeries, SmoothingKind};
use crate::error::{ForecastError, Result};

/// Dispatch on the smoothing kind.
pub fn smooth(series: &DatedSeries, kind: SmoothingKind, window: usize) -> Result<DatedSeries> {
    match kind {
        SmoothingKind::Rolling => rolling_mean(series, window),
        SmoothingKind::Exponential => ewm_mean(series, window),
    }
}

/// Trailing mean over `window` points. A window containing a missing value
/// yields a missing value.
pub fn rolling_mean(series: &DatedSeries, window: usize) -> Result<DatedSeries> {
    check_window(series, window)?;
    let points = series.points();
    let out = points
        .windows(window)
        .map(|w| {
            let date = w[window - 1].0;
            let sum: Option<f64> = w.iter().map(|(_, v)| *v).sum();
            (date, sum.map(|s| s / window as f64))
        })
        .collect();
    DatedSeries::from_points(out)
}

/// Smoothing constant for an exponential mean with span `window`.
pub fn ewm_alpha(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

/// Exponentially weighted mean `s_t = α x_t + (1 - α) s_{t-1}`, `s_0 = x_0`.
///
/// Missing inputs produce missing outputs and leave the running state as is.
pub fn ewm_mean(series: &DatedSeries, window: usize) -> Result<DatedSeries> {
    check_window(series, window)?;
    let alpha = ewm_alpha(window);
    let mut state: Option<f64> = None;
    let mut out = Vec::with_capacity(series.len());
    for (date, value) in series.points() {
        let smoothed = value.map(|x| {
            let s = match state {
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
                None => x,
            };
            state = Some(s);
            s
        });
        out.push((*date, smoothed));
    }
    DatedSeries::from_points(out.split_off(window - 1))
}

fn check_window(series: &DatedSeries, window: usize) -> Result<()> {
    if window < 2 {
        return Err(ForecastError::config("smoothing window must be at least 2"));
    }
    if series.len() < window {
        return Err(ForecastError::config(format!(
            "series of {} points is shorter than the smoothing window {window}",
            series.len()
        )));
    }
    Ok(())
}

/// Invert a rolling mean over a forecast horizon.
///
/// `trailing` holds the last `window - 1` raw values before the horizon.
pub fn unroll_mean(predicted: &[f64], trailing: &[f64], window: usize) -> Result<Vec<f64>> {
    if window < 2 || trailing.len() != window - 1 {
        return Err(ForecastError::recovery(format!(
            "rolling recovery needs {} trailing values, got {}",
            window.saturating_sub(1),
            trailing.len()
        )));
    }

    let mut buffer: VecDeque<f64> = trailing.iter().copied().collect();
    let mut recovered = Vec::with_capacity(predicted.len());
    for mean in predicted {
        let trailing_sum: f64 = buffer.iter().sum();
        let value = mean * window as f64 - trailing_sum;
        recovered.push(value);
        buffer.pop_front();
        buffer.push_back(value);
    }
    Ok(recovered)
}

/// Invert an exponential mean, starting from the last smoothed value.
pub fn unsmooth_ewm(predicted: &[f64], last_smoothed: f64, window: usize) -> Vec<f64> {
    let alpha = ewm_alpha(window);
    let mut prev = last_smoothed;
    predicted
        .iter()
        .map(|s| {
            let x = (s - (1.0 - alpha) * prev) / alpha;
            prev = *s;
            x
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 3, 1).unwrap()
    }

    fn sample() -> Vec<f64> {
        vec![10.0, 12.0, 11.0, 13.0, 15.0, 20.0, 18.0, 11.0, 13.0, 12.0, 14.0, 16.0, 21.0, 19.0]
    }

    #[test]
    fn rolling_mean_drops_warm_up() {
        let s = DatedSeries::from_start(start(), sample());
        let m = rolling_mean(&s, 7).unwrap();
        assert_eq!(m.len(), 8);
        assert_eq!(m.first_date(), NaiveDate::from_ymd_opt(2018, 3, 7));
        assert_relative_eq!(m.complete_values().unwrap()[0], 99.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn rolling_mean_propagates_missing() {
        let s = DatedSeries::from_start_opt(start(), [Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)]);
        let m = rolling_mean(&s, 2).unwrap();
        let values: Vec<Option<f64>> = m.values().collect();
        assert_eq!(values, vec![None, None, Some(3.5), Some(4.5)]);
    }

    #[test]
    fn unroll_mean_recovers_future_values() {
        let values = sample();
        let s = DatedSeries::from_start(start(), values.iter().copied());
        let means = rolling_mean(&s, 7).unwrap().complete_values().unwrap();

        // Pretend the last 4 days are the forecast horizon.
        let (known, future) = values.split_at(10);
        let trailing = &known[known.len() - 6..];
        let rebuilt = unroll_mean(&means[means.len() - 4..], trailing, 7).unwrap();
        for (a, b) in rebuilt.iter().zip(future) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn unroll_mean_checks_context_length() {
        assert!(matches!(
            unroll_mean(&[1.0], &[1.0, 2.0], 7),
            Err(ForecastError::Recovery(_))
        ));
    }

    #[test]
    fn ewm_round_trip() {
        let values = sample();
        let s = DatedSeries::from_start(start(), values.iter().copied());
        let smoothed = ewm_mean(&s, 5).unwrap().complete_values().unwrap();
        assert_eq!(smoothed.len(), values.len() - 4);

        let (known, future) = values.split_at(9);
        let known_smoothed = ewm_mean(&DatedSeries::from_start(start(), known.iter().copied()), 5)
            .unwrap()
            .complete_values()
            .unwrap();
        let last = known_smoothed[known_smoothed.len() - 1];
        let rebuilt = unsmooth_ewm(&smoothed[smoothed.len() - future.len()..], last, 5);
        for (a, b) in rebuilt.iter().zip(future) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn window_longer_than_series_is_rejected() {
        let s = DatedSeries::from_start(start(), [1.0, 2.0]);
        assert!(smooth(&s, SmoothingKind::Rolling, 7).is_err());
        assert!(smooth(&s, SmoothingKind::Exponential, 7).is_err());
    }
}
