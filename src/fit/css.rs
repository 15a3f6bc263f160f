//! Conditional-sum-of-squares ARMA estimator.
//!
//! For each starting vector we run Gauss–Newton on
//!
//! ```text
//! S(c, φ, θ) = Σ_{t ≥ p} e_t²
//! ```
//!
//! with a forward-difference Jacobian and step halving. Starts are independent,
//! so they are refined in parallel; the winner is the lowest SSE, ties broken by
//! start index, which keeps the result deterministic regardless of scheduling.
//!
//! A search stops when the relative SSE improvement or the relative parameter
//! step falls below its tolerance. Over-parameterised orders sit on a flat
//! ridge where SSE keeps creeping down; if no start converges within
//! `max_iter`, the best finite candidate is returned with a warning.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{ArmaOrder, DatedSeries};
use crate::error::{ForecastError, Result};
use crate::fit::starting_points;
use crate::math::solve_least_squares;
use crate::models::{ArmaModel, ArmaParams, FitDiagnostics, FittedModel, Forecaster, check_fit_input, reject_constant};

/// Extra observations required beyond `p + (p + q + 1)`.
pub const MIN_N_BUFFER: usize = 5;

/// Largest absolute coefficient we accept; anything beyond is a diverged search.
const COEF_LIMIT: f64 = 1e6;

/// Step halvings tried before declaring a local minimum.
const MAX_HALVINGS: usize = 30;

#[derive(Debug, Clone, Copy)]
pub struct CssEstimator {
    pub max_iter: usize,
    /// Relative SSE improvement below which the search stops.
    pub tol: f64,
    /// Relative parameter step `‖Δβ‖ / max(‖β‖, 1)` below which the search stops.
    pub step_tol: f64,
}

impl Default for CssEstimator {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol: 1e-8,
            step_tol: 1e-6,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: Vec<f64>,
    sse: f64,
    iterations: usize,
    converged: bool,
}

impl CssEstimator {
    /// Minimum series length for an order.
    pub fn min_len(order: ArmaOrder) -> usize {
        order.p + order.param_count() + MIN_N_BUFFER
    }

    /// Estimate `[c, φ.., θ..]` on raw values.
    pub fn estimate(&self, y: &[f64], order: ArmaOrder) -> Result<(Vec<f64>, f64, usize)> {
        let starts = starting_points(y, order);

        let candidates: Vec<Candidate> = starts
            .par_iter()
            .enumerate()
            .filter_map(|(idx, start)| self.refine(y, order, start.clone(), idx))
            .collect();

        let converged: Vec<&Candidate> = candidates.iter().filter(|c| c.converged).collect();
        let pool: Vec<&Candidate> = if converged.is_empty() {
            candidates.iter().collect()
        } else {
            converged
        };
        let Some(best) = lowest_sse(&pool) else {
            return Err(ForecastError::fit(format!("no valid ARMA{order} candidates")));
        };
        if !best.converged {
            tracing::warn!(
                order = %order,
                max_iter = self.max_iter,
                sse = best.sse,
                "css search did not converge; using the best candidate"
            );
        }
        tracing::debug!(
            candidates = candidates.len(),
            winner = best.idx,
            sse = best.sse,
            iterations = best.iterations,
            "css search finished"
        );
        Ok((best.params.clone(), best.sse, best.iterations))
    }

    fn refine(&self, y: &[f64], order: ArmaOrder, mut params: Vec<f64>, idx: usize) -> Option<Candidate> {
        let mut sse = css_objective(y, order, &params)?;

        for iter in 1..=self.max_iter {
            let Some(step) = gauss_newton_step(y, order, &params) else {
                return Some(Candidate {
                    idx,
                    params,
                    sse,
                    iterations: iter,
                    converged: true,
                });
            };

            let mut scale = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_HALVINGS {
                let trial: Vec<f64> = params.iter().zip(&step).map(|(p, d)| p + scale * d).collect();
                if let Some(trial_sse) = css_objective(y, order, &trial) {
                    if trial_sse < sse {
                        accepted = Some((trial, trial_sse));
                        break;
                    }
                }
                scale *= 0.5;
            }

            let Some((next, next_sse)) = accepted else {
                // No descent direction left.
                return Some(Candidate {
                    idx,
                    params,
                    sse,
                    iterations: iter,
                    converged: true,
                });
            };

            let improvement = (sse - next_sse) / sse.max(f64::MIN_POSITIVE);
            let rel_step = norm_diff(&next, &params) / norm(&params).max(1.0);
            params = next;
            sse = next_sse;
            if improvement < self.tol || rel_step < self.step_tol {
                return Some(Candidate {
                    idx,
                    params,
                    sse,
                    iterations: iter,
                    converged: true,
                });
            }
        }

        Some(Candidate {
            idx,
            params,
            sse,
            iterations: self.max_iter,
            converged: false,
        })
    }
}

/// Lowest SSE, ties broken by start index.
fn lowest_sse<'a>(pool: &[&'a Candidate]) -> Option<&'a Candidate> {
    let (first, rest) = pool.split_first()?;
    let mut best = *first;
    for &c in rest {
        if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
            best = c;
        }
    }
    Some(best)
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn norm_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Conditional residuals for a parameter vector.
pub fn css_residuals(y: &[f64], order: ArmaOrder, params: &[f64]) -> Vec<f64> {
    ArmaParams::from_vec(order, params).residuals(y)
}

/// `Σ e_t²` over `t ≥ p`; `None` when the recursion blows up.
pub fn css_objective(y: &[f64], order: ArmaOrder, params: &[f64]) -> Option<f64> {
    if params.iter().any(|v| !v.is_finite() || v.abs() > COEF_LIMIT) {
        return None;
    }
    let e = css_residuals(y, order, params);
    let sse: f64 = e[order.p..].iter().map(|v| v * v).sum();
    sse.is_finite().then_some(sse)
}

/// Solve `J δ ≈ -e` with a forward-difference Jacobian of the residuals.
fn gauss_newton_step(y: &[f64], order: ArmaOrder, params: &[f64]) -> Option<Vec<f64>> {
    let k = params.len();
    let base = css_residuals(y, order, params);
    let rows = &base[order.p..];
    let n = rows.len();

    let mut jac = DMatrix::<f64>::zeros(n, k);
    for j in 0..k {
        let h = 1e-6 * params[j].abs().max(1.0);
        let mut bumped = params.to_vec();
        bumped[j] += h;
        let e = css_residuals(y, order, &bumped);
        for i in 0..n {
            jac[(i, j)] = (e[order.p + i] - rows[i]) / h;
        }
    }
    let rhs = DVector::from_iterator(n, rows.iter().map(|v| -v));
    let step = solve_least_squares(&jac, &rhs)?;
    if step.iter().all(|d| d.abs() < 1e-14) {
        return None;
    }
    Some(step.iter().copied().collect())
}

impl Forecaster for CssEstimator {
    fn name(&self) -> &'static str {
        "arma"
    }

    fn fit(&self, series: &DatedSeries, order: ArmaOrder) -> Result<Box<dyn FittedModel>> {
        let (start, values) = check_fit_input(series, Self::min_len(order))?;
        reject_constant(&values)?;
        let (params, sse, iterations) = self.estimate(&values, order)?;

        let arma = ArmaParams::from_vec(order, &params);
        let mut diagnostics = FitDiagnostics::from_sse(values.len() - order.p, sse, order.param_count());
        diagnostics.iterations = iterations;
        diagnostics.constant = arma.constant;
        diagnostics.ar = arma.ar.clone();
        diagnostics.ma = arma.ma.clone();

        tracing::info!(
            order = %order,
            nobs = diagnostics.nobs,
            aic = diagnostics.aic,
            sigma2 = diagnostics.sigma2,
            "fitted ARMA model"
        );
        Ok(Box::new(ArmaModel::new(order, arma, start, values, diagnostics)))
    }
}
