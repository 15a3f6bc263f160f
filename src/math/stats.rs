//! Descriptive statistics for the `analyze` command and model checks.

/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`); `NaN` for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Sample autocorrelation for lags `0..=max_lag`.
///
/// Uses the biased estimator (denominator `n` at every lag), so the sequence is
/// positive semi-definite and safe to feed into Durbin–Levinson.
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let m = mean(values);
    let denom: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    let max_lag = max_lag.min(n - 1);
    (0..=max_lag)
        .map(|lag| {
            if denom == 0.0 {
                return if lag == 0 { 1.0 } else { 0.0 };
            }
            let num: f64 = (lag..n).map(|t| (values[t] - m) * (values[t - lag] - m)).sum();
            num / denom
        })
        .collect()
}

/// Partial autocorrelation for lags `0..=max_lag` via Durbin–Levinson.
pub fn pacf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let r = acf(values, max_lag);
    if r.is_empty() {
        return r;
    }
    let max_lag = r.len() - 1;
    let mut out = vec![1.0];
    let mut phi_prev: Vec<f64> = Vec::new();
    for k in 1..=max_lag {
        let num = r[k] - (1..k).map(|j| phi_prev[j - 1] * r[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi_prev[j - 1] * r[j]).sum::<f64>();
        let phi_kk = if den.abs() < 1e-12 { 0.0 } else { num / den };
        let mut phi = Vec::with_capacity(k);
        for j in 1..k {
            phi.push(phi_prev[j - 1] - phi_kk * phi_prev[k - j - 1]);
        }
        phi.push(phi_kk);
        out.push(phi_kk);
        phi_prev = phi;
    }
    out
}

/// Trailing rolling mean; the first `window - 1` positions are `None`.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

/// Trailing rolling standard deviation (population).
pub fn trailing_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, std_dev)
}

fn rolling(values: &[f64], window: usize, f: fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| (i + 1 >= window).then(|| f(&values[i + 1 - window..=i])))
        .collect()
}

/// Approximate 95% confidence bound for a white-noise autocorrelation.
pub fn white_noise_bound(n: usize) -> f64 {
    if n == 0 {
        return f64::NAN;
    }
    1.96 / (n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_variance() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(&v), 2.5);
        assert_relative_eq!(variance(&v), 1.25);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn acf_of_alternating_series_is_negative_at_lag_one() {
        let v: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let r = acf(&v, 2);
        assert_relative_eq!(r[0], 1.0);
        assert!(r[1] < -0.9);
        assert!(r[2] > 0.9);
    }

    #[test]
    fn pacf_lag_one_equals_acf_lag_one() {
        let v = [1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 5.0, 8.0, 7.0, 9.0];
        let r = acf(&v, 3);
        let p = pacf(&v, 3);
        assert_eq!(p.len(), 4);
        assert_relative_eq!(p[1], r[1], epsilon = 1e-12);
        // Second partial from the closed form.
        let expected = (r[2] - r[1] * r[1]) / (1.0 - r[1] * r[1]);
        assert_relative_eq!(p[2], expected, epsilon = 1e-12);
    }

    #[test]
    fn trailing_mean_has_warm_up() {
        let r = trailing_mean(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(r, vec![None, None, Some(2.0), Some(3.0)]);
    }
}
