//! Natural-log transform and its inverse.

use crate::domain::DatedSeries;
use crate::error::{ForecastError, Result};

/// Elementwise `ln`. Every present value must be strictly positive.
pub fn log_transform(series: &DatedSeries) -> Result<DatedSeries> {
    if let Some((date, value)) = series
        .points()
        .iter()
        .find_map(|(d, v)| v.filter(|x| !(*x > 0.0 && x.is_finite())).map(|x| (*d, x)))
    {
        return Err(ForecastError::config(format!(
            "log transform needs strictly positive values, found {value} on {date}"
        )));
    }
    Ok(series.map_values(|_, v| v.ln()))
}

/// Elementwise `exp` over predicted values.
pub fn exp_values(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.exp()).collect()
}
