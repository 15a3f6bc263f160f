//! No-change baseline.
//!
//! In-sample it predicts yesterday's value; out of sample it repeats the last
//! observation. On a seasonally differenced series this is the "next week
//! looks like this week" forecast.

use chrono::{Duration, NaiveDate};

use crate::domain::{ArmaOrder, DatedSeries};
use crate::error::Result;
use crate::models::{FitDiagnostics, FittedModel, Forecaster, check_fit_input, predict_positions};

#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveForecaster;

impl Forecaster for NaiveForecaster {
    fn name(&self) -> &'static str {
        "naive"
    }

    /// The order is ignored.
    fn fit(&self, series: &DatedSeries, _order: ArmaOrder) -> Result<Box<dyn FittedModel>> {
        let (start, values) = check_fit_input(series, 2)?;
        let sse: f64 = values.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
        let diagnostics = FitDiagnostics::from_sse(values.len() - 1, sse, 0);
        Ok(Box::new(NaiveModel {
            start,
            values,
            diagnostics,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct NaiveModel {
    start: NaiveDate,
    values: Vec<f64>,
    diagnostics: FitDiagnostics,
}

impl FittedModel for NaiveModel {
    fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    fn sample_end(&self) -> NaiveDate {
        self.start + Duration::days(self.values.len() as i64 - 1)
    }

    fn predict(&self, start: NaiveDate, end: NaiveDate) -> Result<DatedSeries> {
        let (first, last) = predict_positions(self.start, start, end)?;
        let n = self.values.len();
        let values = (first..=last).map(|t| match t {
            0 => self.values[0],
            t if t <= n => self.values[t - 1],
            _ => self.values[n - 1],
        });
        Ok(DatedSeries::from_start(start, values))
    }
}
