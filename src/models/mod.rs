//! Forecasting models behind a small trait seam.
//!
//! The pipeline only needs two operations from a model: fit on a regular daily
//! series and predict over a date range. Keeping that behind
//! [`Forecaster`] / [`FittedModel`] lets tests swap in stub models and lets the
//! CLI choose between the ARMA estimator and a naive baseline.

pub mod arma;
pub mod naive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{ArmaOrder, DatedSeries, ModelChoice};
use crate::error::{ForecastError, Result};
use crate::fit::CssEstimator;

pub use arma::*;
pub use naive::*;

/// Fit quality and estimated parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Observations entering the objective.
    pub nobs: usize,
    pub sse: f64,
    pub sigma2: f64,
    pub llf: f64,
    pub aic: f64,
    pub bic: f64,
    pub hqic: f64,
    /// Solver iterations used by the winning candidate.
    pub iterations: usize,
    pub constant: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
}

impl FitDiagnostics {
    /// Gaussian log-likelihood and information criteria from a residual sum of
    /// squares over `nobs` observations with `k` estimated coefficients.
    pub fn from_sse(nobs: usize, sse: f64, k: usize) -> Self {
        let n = nobs.max(1) as f64;
        let sigma2 = (sse / n).max(f64::MIN_POSITIVE);
        let llf = -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0);
        let k = k as f64;
        Self {
            nobs,
            sse,
            sigma2,
            llf,
            aic: -2.0 * llf + 2.0 * k,
            bic: -2.0 * llf + k * n.ln(),
            hqic: -2.0 * llf + 2.0 * k * n.ln().ln(),
            ..Self::default()
        }
    }
}

/// Something that can be fitted to a stationary daily series.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &'static str;

    fn fit(&self, series: &DatedSeries, order: ArmaOrder) -> Result<Box<dyn FittedModel>>;
}

/// A fitted model.
pub trait FittedModel: std::fmt::Debug + Send + Sync {
    fn diagnostics(&self) -> &FitDiagnostics;

    /// Last date of the series the model was fitted on.
    fn sample_end(&self) -> NaiveDate;

    /// Values for every day in `[start, end]`: one-step-ahead fitted values
    /// inside the sample, recursive forecasts after it.
    fn predict(&self, start: NaiveDate, end: NaiveDate) -> Result<DatedSeries>;
}

/// Build the forecaster selected on the command line.
pub fn forecaster_for(choice: ModelChoice) -> Box<dyn Forecaster> {
    match choice {
        ModelChoice::Arma => Box::new(CssEstimator::default()),
        ModelChoice::Naive => Box::new(NaiveForecaster),
    }
}

/// Validate model input: non-empty, complete, finite, daily, long enough.
///
/// Returns the first date and the values.
pub fn check_fit_input(series: &DatedSeries, min_len: usize) -> Result<(NaiveDate, Vec<f64>)> {
    let Some(start) = series.first_date() else {
        return Err(ForecastError::fit("cannot fit an empty series"));
    };
    let values = series.complete_values().ok_or_else(|| {
        ForecastError::fit(format!(
            "model input has {} missing values",
            series.missing_count()
        ))
    })?;
    if !series.is_contiguous() {
        return Err(ForecastError::fit("model input must have a regular daily index"));
    }
    if values.len() < min_len {
        return Err(ForecastError::fit(format!(
            "insufficient data: need at least {min_len} points, got {}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::fit("model input contains non-finite values"));
    }
    Ok((start, values))
}

/// Estimators that need variation in the data call this after
/// [`check_fit_input`].
pub fn reject_constant(values: &[f64]) -> Result<()> {
    let mean = crate::math::mean(values);
    let var = crate::math::variance(values);
    if var <= f64::EPSILON * mean.abs().max(1.0).powi(2) {
        return Err(ForecastError::fit("cannot fit a constant series"));
    }
    Ok(())
}

/// Map `[start, end]` onto positions relative to `origin`.
pub(crate) fn predict_positions(origin: NaiveDate, start: NaiveDate, end: NaiveDate) -> Result<(usize, usize)> {
    if end < start {
        return Err(ForecastError::config(format!("predict end {end} precedes start {start}")));
    }
    if start < origin {
        return Err(ForecastError::config(format!(
            "predict start {start} precedes the model sample start {origin}"
        )));
    }
    Ok((
        (start - origin).num_days() as usize,
        (end - origin).num_days() as usize,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 3, 1).unwrap()
    }

    #[test]
    fn check_fit_input_rejects_degenerate_series() {
        assert!(matches!(
            check_fit_input(&DatedSeries::default(), 2),
            Err(ForecastError::Fit(_))
        ));
        assert!(matches!(
            check_fit_input(&DatedSeries::from_start_opt(start(), [Some(1.0), None, Some(2.0)]), 2),
            Err(ForecastError::Fit(_))
        ));
        assert!(matches!(
            check_fit_input(&DatedSeries::from_start(start(), [1.0, 2.0]), 5),
            Err(ForecastError::Fit(_))
        ));
    }

    #[test]
    fn constant_values_are_rejected_on_request() {
        let flat = DatedSeries::from_start(start(), [5.0; 20]);
        let (_, values) = check_fit_input(&flat, 2).unwrap();
        assert!(matches!(reject_constant(&values), Err(ForecastError::Fit(_))));
        assert!(reject_constant(&[1.0, 2.0]).is_ok());
    }

    #[test]
    fn information_criteria_penalize_parameters() {
        let a = FitDiagnostics::from_sse(100, 50.0, 2);
        let b = FitDiagnostics::from_sse(100, 50.0, 4);
        assert!(b.aic > a.aic);
        assert!(b.bic - a.bic > b.aic - a.aic);
        assert!((a.sigma2 - 0.5).abs() < 1e-12);
    }
}
