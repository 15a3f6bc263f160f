//! Augmented Dickey–Fuller unit-root test (constant, no trend).
//!
//! ```text
//! Δy_t = α + β y_{t-1} + Σ_{i=1..k} γ_i Δy_{t-i} + ε_t
//! ```
//!
//! The statistic is the t-ratio of `β`. The lag count `k` is picked by AIC over
//! `0..=max_lag` on a common sample, then the regression is refitted on every
//! usable row. Critical values come from the MacKinnon (2010) response
//! surfaces and the p-value from the MacKinnon (1994) approximation, the same
//! tables `adfuller` uses.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{ForecastError, Result};
use crate::math::solve_least_squares;

/// `b0 + b1/n + b2/n² + b3/n³` for the 1%, 5% and 10% levels.
const TAU_C_2010: [[f64; 4]; 3] = [
    [-3.43035, -6.5393, -16.786, -79.433],
    [-2.86154, -2.8903, -4.234, -40.040],
    [-2.56677, -1.5384, -2.809, 0.0],
];

const TAU_MAX_C: f64 = 2.74;
const TAU_MIN_C: f64 = -18.83;
const TAU_STAR_C: f64 = -1.61;
const TAU_C_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_C_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Smallest series the test accepts.
pub const ADF_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalValues {
    pub one: f64,
    pub five: f64,
    pub ten: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    /// Lagged differences in the final regression.
    pub used_lag: usize,
    /// Rows in the final regression.
    pub nobs: usize,
    pub critical: CriticalValues,
}

impl AdfResult {
    /// Unit root rejected at 5%.
    pub fn is_stationary(&self) -> bool {
        self.statistic < self.critical.five
    }
}

/// `ceil(12 (n / 100)^¼)`.
pub fn default_adf_lag(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Run the test on `y`; `max_lag` defaults to [`default_adf_lag`] and is capped
/// at `n / 2 - 2`.
pub fn adf_test(y: &[f64], max_lag: Option<usize>) -> Result<AdfResult> {
    let n = y.len();
    if n < ADF_MIN_LEN {
        return Err(ForecastError::config(format!(
            "ADF test needs at least {ADF_MIN_LEN} values, got {n}"
        )));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::config("ADF test input contains non-finite values"));
    }
    let max_lag = max_lag.unwrap_or_else(|| default_adf_lag(n)).min(n / 2 - 2);
    let dy: Vec<f64> = y.windows(2).map(|w| w[1] - w[0]).collect();

    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let (x, target) = regression(y, &dy, lag, max_lag);
        let Some(fit) = ols(&x, &target) else {
            continue;
        };
        let rows = target.len() as f64;
        let aic = rows * (fit.ssr / rows).ln() + 2.0 * x.ncols() as f64;
        if best.is_none_or(|(b, _)| aic < b) {
            best = Some((aic, lag));
        }
    }
    let (_, used_lag) = best.ok_or_else(|| ForecastError::fit("ADF lag search found no solvable regression"))?;

    let (x, target) = regression(y, &dy, used_lag, used_lag);
    let nobs = target.len();
    let fit = ols(&x, &target).ok_or_else(|| ForecastError::fit("ADF regression is singular"))?;
    let dof = nobs.saturating_sub(x.ncols());
    if dof == 0 {
        return Err(ForecastError::fit("ADF regression has no residual degrees of freedom"));
    }
    let xtx_inv = (x.transpose() * &x)
        .try_inverse()
        .ok_or_else(|| ForecastError::fit("ADF regression is singular"))?;
    let se = (fit.ssr / dof as f64 * xtx_inv[(1, 1)]).sqrt();
    if !(se.is_finite() && se > 0.0) {
        return Err(ForecastError::fit("ADF regression fits exactly; the statistic is undefined"));
    }
    let statistic = fit.beta[1] / se;

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p(statistic)?,
        used_lag,
        nobs,
        critical: mackinnon_critical(nobs),
    })
}

/// Critical values for `nobs` regression rows.
pub fn mackinnon_critical(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs.max(1) as f64;
    let at = |b: &[f64; 4]| b[0] + b[1] * inv + b[2] * inv.powi(2) + b[3] * inv.powi(3);
    CriticalValues {
        one: at(&TAU_C_2010[0]),
        five: at(&TAU_C_2010[1]),
        ten: at(&TAU_C_2010[2]),
    }
}

/// Approximate p-value of an ADF statistic.
pub fn mackinnon_p(statistic: f64) -> Result<f64> {
    if statistic > TAU_MAX_C {
        return Ok(1.0);
    }
    if statistic < TAU_MIN_C {
        return Ok(0.0);
    }
    let coef: &[f64] = if statistic <= TAU_STAR_C {
        &TAU_C_SMALLP
    } else {
        &TAU_C_LARGEP
    };
    let z = coef.iter().rev().fold(0.0, |acc, c| acc * statistic + c);
    let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::fit(format!("normal distribution: {e}")))?;
    Ok(normal.cdf(z))
}

struct OlsFit {
    beta: DVector<f64>,
    ssr: f64,
}

fn ols(x: &DMatrix<f64>, target: &DVector<f64>) -> Option<OlsFit> {
    let beta = solve_least_squares(x, target)?;
    let resid = target - x * &beta;
    let ssr = resid.norm_squared();
    // An exact fit leaves only rounding noise in the residuals.
    let floor = 1e-20 * target.norm_squared().max(f64::MIN_POSITIVE);
    (ssr.is_finite() && ssr > floor).then_some(OlsFit { beta, ssr })
}

/// Rows `t = first..dy.len()` of `[1, y_t, Δy_{t-1}, .., Δy_{t-lag}]` against
/// `Δy_t` (with `Δy_t = y_{t+1} - y_t`).
fn regression(y: &[f64], dy: &[f64], lag: usize, first: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = dy.len() - first;
    let x = DMatrix::from_fn(rows, lag + 2, |i, j| {
        let t = first + i;
        match j {
            0 => 1.0,
            1 => y[t],
            _ => dy[t - (j - 1)],
        }
    });
    let target = DVector::from_iterator(rows, dy[first..].iter().copied());
    (x, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal as Gaussian};

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let dist = Gaussian::new(0.0, 1.0).unwrap();
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        noise(n, seed)
            .into_iter()
            .scan(0.0, |level, e| {
                *level += e;
                Some(*level)
            })
            .collect()
    }

    #[test]
    fn critical_values_follow_the_response_surface() {
        let cv = mackinnon_critical(100);
        assert_relative_eq!(cv.one, -3.497501033, epsilon = 1e-9);
        assert_relative_eq!(cv.five, -2.89090644, epsilon = 1e-9);
        assert_relative_eq!(cv.ten, -2.5824349, epsilon = 1e-9);
    }

    #[test]
    fn p_value_matches_the_asymptotic_levels() {
        assert_relative_eq!(mackinnon_p(-2.86154).unwrap(), 0.05, epsilon = 1e-3);
        assert_relative_eq!(mackinnon_p(-3.43035).unwrap(), 0.01, epsilon = 1e-3);
        assert_relative_eq!(mackinnon_p(-1.0).unwrap(), 0.7533, epsilon = 1e-3);
        assert_eq!(mackinnon_p(3.0).unwrap(), 1.0);
        assert_eq!(mackinnon_p(-20.0).unwrap(), 0.0);
    }

    #[test]
    fn white_noise_rejects_the_unit_root() {
        let rejected = (0..20)
            .filter(|&seed| adf_test(&noise(200, seed), None).unwrap().is_stationary())
            .count();
        assert!(rejected >= 19, "rejected on {rejected}/20 seeds");
    }

    #[test]
    fn random_walk_keeps_the_unit_root() {
        let kept = (0..20)
            .filter(|&seed| !adf_test(&random_walk(200, 100 + seed), None).unwrap().is_stationary())
            .count();
        assert!(kept >= 15, "unit root kept on {kept}/20 seeds");
    }

    #[test]
    fn differencing_a_random_walk_makes_it_stationary() {
        let walk = random_walk(300, 7);
        let diff: Vec<f64> = walk.windows(2).map(|w| w[1] - w[0]).collect();
        let r = adf_test(&diff, Some(4)).unwrap();
        assert!(r.used_lag <= 4);
        assert_eq!(r.nobs, diff.len() - 1 - r.used_lag);
        assert!(r.p_value < 0.01, "p = {}", r.p_value);
    }

    #[test]
    fn short_or_degenerate_input_is_an_error() {
        assert!(matches!(adf_test(&[1.0, 2.0, 3.0], None), Err(ForecastError::Configuration(_))));
        let line: Vec<f64> = (0..50).map(f64::from).collect();
        assert!(adf_test(&line, None).is_err());
        assert!(adf_test(&[3.0; 40], None).is_err());
    }
}
