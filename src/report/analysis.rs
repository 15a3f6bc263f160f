//! Series diagnostics for the `analyze` command.
//!
//! - summary statistics
//! - ACF / PACF with the white-noise band, to pick `p` and `q`
//! - rolling mean / std trend, sampled weekly
//! - augmented Dickey–Fuller test, to check the differencing stages made the
//!   series stationary

use chrono::NaiveDate;

use crate::domain::DatedSeries;
use crate::error::{ForecastError, Result};
use crate::math::{AdfResult, acf, adf_test, mean, pacf, std_dev, trailing_mean, trailing_std, white_noise_bound};

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub n: usize,
    pub missing: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesAnalysis {
    pub label: String,
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub stats: SeriesStats,
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
    /// ±bound outside which a correlation is significant at ~95%.
    pub bound: f64,
    pub trend_window: usize,
    pub trend: Vec<TrendPoint>,
    /// Why the test could not run, when it could not.
    pub adf: std::result::Result<AdfResult, ForecastError>,
}

/// Analyze the present values of `series`; missing values are skipped.
pub fn analyze_series(
    label: &str,
    series: &DatedSeries,
    max_lag: usize,
    trend_window: usize,
    adf_max_lag: Option<usize>,
) -> Result<SeriesAnalysis> {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return Err(ForecastError::config(format!("{label}: series is empty")));
    };
    let present: Vec<(NaiveDate, f64)> = series
        .points()
        .iter()
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .collect();
    let values: Vec<f64> = present.iter().map(|(_, v)| *v).collect();
    if values.len() < 2 {
        return Err(ForecastError::config(format!(
            "{label}: need at least 2 values, got {}",
            values.len()
        )));
    }

    let stats = SeriesStats {
        n: series.len(),
        missing: series.missing_count(),
        mean: mean(&values),
        std: std_dev(&values),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };

    let window = trend_window.max(1);
    let means = trailing_mean(&values, window);
    let stds = trailing_std(&values, window);
    let trend = present
        .iter()
        .zip(means.iter().zip(&stds))
        .enumerate()
        .filter(|(i, _)| (i + 1) % window == 0 || *i + 1 == values.len())
        .filter_map(|(_, ((date, _), (m, s)))| {
            Some(TrendPoint {
                date: *date,
                mean: (*m)?,
                std: (*s)?,
            })
        })
        .collect();

    Ok(SeriesAnalysis {
        label: label.to_string(),
        first,
        last,
        stats,
        acf: acf(&values, max_lag),
        pacf: pacf(&values, max_lag),
        bound: white_noise_bound(values.len()),
        trend_window: window,
        trend,
        adf: adf_test(&values, adf_max_lag),
    })
}

pub fn format_analysis(a: &SeriesAnalysis) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ({} ~ {}) ===\n", a.label, a.first, a.last));
    out.push_str(&format!(
        "n={} missing={} mean={:.4} std={:.4} min={:.4} max={:.4}\n",
        a.stats.n, a.stats.missing, a.stats.mean, a.stats.std, a.stats.min, a.stats.max
    ));

    out.push_str(&format!("\nCorrelogram (|r| > {:.3} marked *):\n", a.bound));
    out.push_str(&format!("{:>4} {:>8} {:>8}\n", "lag", "acf", "pacf"));
    for lag in 1..a.acf.len() {
        let mark = |r: f64| if r.abs() > a.bound { '*' } else { ' ' };
        out.push_str(&format!(
            "{lag:>4} {:>8.3}{} {:>8.3}{}\n",
            a.acf[lag],
            mark(a.acf[lag]),
            a.pacf[lag],
            mark(a.pacf[lag])
        ));
    }

    out.push_str(&format!("\nRolling trend (window={}):\n", a.trend_window));
    for t in &a.trend {
        out.push_str(&format!("{} mean={:.4} std={:.4}\n", t.date, t.mean, t.std));
    }

    out.push_str(&format_adf(&a.adf));
    out
}

fn format_adf(adf: &std::result::Result<AdfResult, ForecastError>) -> String {
    let r = match adf {
        Ok(r) => r,
        Err(e) => return format!("\nDickey-Fuller test: n/a ({e})\n"),
    };
    let mut out = String::new();
    out.push_str("\nDickey-Fuller test (constant):\n");
    let row = |name: &str, value: String| format!("{name:<30} {value:>12}\n");
    out.push_str(&row("Test Statistic", format!("{:.6}", r.statistic)));
    out.push_str(&row("p-value", format!("{:.6}", r.p_value)));
    out.push_str(&row("#Lags Used", r.used_lag.to_string()));
    out.push_str(&row("Number of Observations Used", r.nobs.to_string()));
    out.push_str(&row("Critical Value (1%)", format!("{:.6}", r.critical.one)));
    out.push_str(&row("Critical Value (5%)", format!("{:.6}", r.critical.five)));
    out.push_str(&row("Critical Value (10%)", format!("{:.6}", r.critical.ten)));
    out.push_str(if r.is_stationary() {
        "=> unit root rejected at 5%: stationary\n"
    } else {
        "=> unit root not rejected at 5%: not stationary\n"
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn weekly_pattern_shows_lag_seven_correlation() {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let week = [5.0, 1.0, 2.0, 1.5, 3.0, 8.0, 2.5];
        let series = DatedSeries::from_start(start, (0..70).map(|i| week[i % 7]));
        let a = analyze_series("raw", &series, 14, 7, None).unwrap();

        assert_eq!(a.acf.len(), 15);
        assert!(a.acf[7] > 0.8);
        assert!(a.acf[7] > a.bound);
        assert_eq!(a.trend.len(), 10);
        // Every full week has the same mean.
        assert!((a.trend[0].mean - a.trend[9].mean).abs() < 1e-12);

        let text = format_analysis(&a);
        assert!(text.starts_with("=== raw (2018-01-01 ~ 2018-03-11) ==="));
    }

    #[test]
    fn empty_series_is_rejected() {
        assert!(analyze_series("x", &DatedSeries::default(), 5, 7, None).is_err());
    }

    #[test]
    fn stationarity_section_reports_the_dickey_fuller_test() {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let noise = Normal::new(0.0, 1.0).unwrap();
        let mut level = 0.0;
        let values: Vec<f64> = (0..150)
            .map(|_| {
                level = 0.3 * level + noise.sample(&mut rng);
                10.0 + level
            })
            .collect();
        let series = DatedSeries::from_start(start, values);
        let a = analyze_series("stationary", &series, 7, 7, Some(3)).unwrap();
        let adf = a.adf.clone().unwrap();
        assert!(adf.used_lag <= 3);
        assert!(adf.is_stationary(), "statistic {}", adf.statistic);

        let text = format_analysis(&a);
        assert!(text.contains("Test Statistic"));
        assert!(text.contains("Critical Value (5%)"));
        assert!(text.contains("stationary"));
    }

    #[test]
    fn short_series_reports_the_test_as_unavailable() {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let series = DatedSeries::from_start(start, [1.0, 3.0, 2.0, 5.0]);
        let a = analyze_series("short", &series, 2, 2, None).unwrap();
        assert!(a.adf.is_err());
        assert!(format_analysis(&a).contains("Dickey-Fuller test: n/a"));
    }
}
