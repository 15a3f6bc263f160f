//! ARMA(p, q) model evaluation.
//!
//! Parameterization (constant = process mean `c`):
//!
//! ```text
//! y_t - c = Σ φ_i (y_{t-i} - c) + e_t + Σ θ_j e_{t-j}
//! ```
//!
//! Residuals are computed conditionally: lags before the start of the series
//! count as `c` (zero deviation) and pre-sample errors as zero. The same
//! recursion drives both the CSS objective and prediction.

use chrono::{Duration, NaiveDate};

use crate::domain::{ArmaOrder, DatedSeries};
use crate::error::Result;
use crate::models::{FitDiagnostics, FittedModel, predict_positions};

/// ARMA coefficients in the order used by the estimator: `[c, φ.., θ..]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmaParams {
    pub constant: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
}

impl ArmaParams {
    pub fn from_vec(order: ArmaOrder, params: &[f64]) -> Self {
        Self {
            constant: params[0],
            ar: params[1..=order.p].to_vec(),
            ma: params[order.p + 1..order.p + 1 + order.q].to_vec(),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(1 + self.ar.len() + self.ma.len());
        out.push(self.constant);
        out.extend_from_slice(&self.ar);
        out.extend_from_slice(&self.ma);
        out
    }

    /// One-step prediction for position `t` given the series and errors so far.
    pub fn one_step(&self, y: &[f64], e: &[f64], t: usize) -> f64 {
        let mut pred = self.constant;
        for (i, phi) in self.ar.iter().enumerate() {
            if let Some(lag) = t.checked_sub(i + 1) {
                pred += phi * (y[lag] - self.constant);
            }
        }
        for (j, theta) in self.ma.iter().enumerate() {
            if let Some(lag) = t.checked_sub(j + 1) {
                pred += theta * e[lag];
            }
        }
        pred
    }

    /// Conditional residuals for every position; the first `p` are zero.
    pub fn residuals(&self, y: &[f64]) -> Vec<f64> {
        let p = self.ar.len();
        let mut e = vec![0.0; y.len()];
        for t in p..y.len() {
            e[t] = y[t] - self.one_step(y, &e, t);
        }
        e
    }
}

/// Fitted ARMA model over a daily series.
#[derive(Debug, Clone)]
pub struct ArmaModel {
    order: ArmaOrder,
    params: ArmaParams,
    start: NaiveDate,
    series: Vec<f64>,
    residuals: Vec<f64>,
    diagnostics: FitDiagnostics,
}

impl ArmaModel {
    pub fn new(
        order: ArmaOrder,
        params: ArmaParams,
        start: NaiveDate,
        series: Vec<f64>,
        diagnostics: FitDiagnostics,
    ) -> Self {
        let residuals = params.residuals(&series);
        Self {
            order,
            params,
            start,
            series,
            residuals,
            diagnostics,
        }
    }

    pub fn order(&self) -> ArmaOrder {
        self.order
    }

    pub fn params(&self) -> &ArmaParams {
        &self.params
    }
}

impl FittedModel for ArmaModel {
    fn diagnostics(&self) -> &FitDiagnostics {
        &self.diagnostics
    }

    fn sample_end(&self) -> NaiveDate {
        self.start + Duration::days(self.series.len() as i64 - 1)
    }

    fn predict(&self, start: NaiveDate, end: NaiveDate) -> Result<DatedSeries> {
        let (first, last) = predict_positions(self.start, start, end)?;
        let n = self.series.len();

        // Extend with recursive forecasts; future errors are zero.
        let mut y = self.series.clone();
        let mut e = self.residuals.clone();
        for t in n..=last {
            let yhat = self.params.one_step(&y, &e, t);
            y.push(yhat);
            e.push(0.0);
        }

        let values = (first..=last).map(|t| {
            if t < n {
                self.params.one_step(&y, &e, t)
            } else {
                y[t]
            }
        });
        Ok(DatedSeries::from_start(start, values))
    }
}
