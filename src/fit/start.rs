//! Starting values for the conditional-sum-of-squares search.
//!
//! Hannan–Rissanen in two regressions:
//!
//! 1. a long AR(m) fitted by least squares gives innovation estimates `ê_t`
//! 2. `y_t` is regressed on `[1, y_{t-1..p}, ê_{t-1..q}]`
//!
//! The intercept of step 2 is `c (1 - Σφ)`; we convert it back to the process
//! mean so the parameter vector matches [`ArmaParams`](crate::models::ArmaParams).

use nalgebra::DVector;

use crate::domain::ArmaOrder;
use crate::math::{design_matrix, mean, solve_least_squares};

/// Order of the long autoregression used for innovation estimates.
pub fn long_ar_order(order: ArmaOrder, n: usize) -> usize {
    let floor = order.p + order.q;
    floor.max((n / 4).min(10)).max(1)
}

/// Least squares AR(m) with intercept; returns residuals aligned with `y`
/// (the first `m` are zero).
pub fn long_ar_residuals(y: &[f64], m: usize) -> Option<Vec<f64>> {
    if y.len() <= 2 * m + 1 {
        return None;
    }
    let rows: Vec<Vec<f64>> = (m..y.len())
        .map(|t| {
            let mut row = Vec::with_capacity(m + 1);
            row.push(1.0);
            row.extend((1..=m).map(|i| y[t - i]));
            row
        })
        .collect();
    let x = design_matrix(&rows)?;
    let target = DVector::from_iterator(y.len() - m, y[m..].iter().copied());
    let beta = solve_least_squares(&x, &target)?;
    let fitted = &x * &beta;

    let mut e = vec![0.0; y.len()];
    for (i, t) in (m..y.len()).enumerate() {
        e[t] = y[t] - fitted[i];
    }
    Some(e)
}

/// Hannan–Rissanen starting vector `[c, φ.., θ..]`.
pub fn hannan_rissanen(y: &[f64], order: ArmaOrder) -> Option<Vec<f64>> {
    let ArmaOrder { p, q } = order;
    if q == 0 {
        return ar_start(y, p);
    }
    let m = long_ar_order(order, y.len());
    let e = long_ar_residuals(y, m)?;

    let first = m + q.max(p);
    if y.len() <= first + p + q + 1 {
        return None;
    }
    let rows: Vec<Vec<f64>> = (first..y.len())
        .map(|t| {
            let mut row = Vec::with_capacity(1 + p + q);
            row.push(1.0);
            row.extend((1..=p).map(|i| y[t - i]));
            row.extend((1..=q).map(|j| e[t - j]));
            row
        })
        .collect();
    let x = design_matrix(&rows)?;
    let target = DVector::from_iterator(y.len() - first, y[first..].iter().copied());
    let beta = solve_least_squares(&x, &target)?;
    Some(to_mean_form(beta.as_slice(), p, y))
}

/// Pure AR start by a single least squares regression.
fn ar_start(y: &[f64], p: usize) -> Option<Vec<f64>> {
    if p == 0 {
        return Some(vec![mean(y)]);
    }
    if y.len() <= 2 * p + 1 {
        return None;
    }
    let rows: Vec<Vec<f64>> = (p..y.len())
        .map(|t| {
            let mut row = Vec::with_capacity(1 + p);
            row.push(1.0);
            row.extend((1..=p).map(|i| y[t - i]));
            row
        })
        .collect();
    let x = design_matrix(&rows)?;
    let target = DVector::from_iterator(y.len() - p, y[p..].iter().copied());
    let beta = solve_least_squares(&x, &target)?;
    Some(to_mean_form(beta.as_slice(), p, y))
}

fn to_mean_form(beta: &[f64], p: usize, y: &[f64]) -> Vec<f64> {
    let ar_sum: f64 = beta[1..=p].iter().sum();
    let denom = 1.0 - ar_sum;
    let constant = if denom.abs() > 1e-6 {
        beta[0] / denom
    } else {
        mean(y)
    };
    let mut out = beta.to_vec();
    out[0] = constant;
    out
}

/// Candidate starting vectors, in a fixed order.
///
/// - Hannan–Rissanen
/// - Hannan–Rissanen with the MA part zeroed
/// - flat: sample mean and zero coefficients
pub fn starting_points(y: &[f64], order: ArmaOrder) -> Vec<Vec<f64>> {
    let k = order.param_count();
    let mut flat = vec![0.0; k];
    flat[0] = mean(y);

    let mut out = Vec::with_capacity(3);
    if let Some(hr) = hannan_rissanen(y, order) {
        if order.q > 0 {
            let mut ar_only = hr.clone();
            ar_only[1 + order.p..].iter_mut().for_each(|v| *v = 0.0);
            out.push(hr);
            out.push(ar_only);
        } else {
            out.push(hr);
        }
    }
    out.push(flat);
    out
}
