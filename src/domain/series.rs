//! Daily dated series.
//!
//! A [`DatedSeries`] is an ordered list of `(date, value)` pairs with strictly
//! increasing dates. Values are `Option<f64>` so a missing observation stays
//! visible through every transform instead of disappearing.
//!
//! Dates are not required to be contiguous: dropping an outlier window leaves a
//! gap. Consumers that need a regular daily index (the forecaster) call
//! [`DatedSeries::reindex_daily`].

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatedSeries {
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl DatedSeries {
    /// Build a contiguous daily series starting at `start`.
    pub fn from_start(start: NaiveDate, values: impl IntoIterator<Item = f64>) -> Self {
        Self::from_start_opt(start, values.into_iter().map(Some))
    }

    /// Same as [`DatedSeries::from_start`] but with explicit missing values.
    pub fn from_start_opt(start: NaiveDate, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let points = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), v))
            .collect();
        Self { points }
    }

    /// Build from explicit points; dates must be strictly increasing.
    pub fn from_points(points: Vec<(NaiveDate, Option<f64>)>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ForecastError::config(format!(
                    "series dates must be strictly increasing ({} followed by {})",
                    pair[0].0, pair[1].0
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(NaiveDate, Option<f64>)] {
        &self.points
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    pub fn last_value(&self) -> Option<f64> {
        self.points.last().and_then(|(_, v)| *v)
    }

    /// Value observed on `date` (None when the date is absent or missing).
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .and_then(|idx| self.points[idx].1)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.points.binary_search_by_key(&date, |(d, _)| *d).is_ok()
    }

    /// Number of missing observations.
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_none()).count()
    }

    /// All values, or `None` if any observation is missing.
    pub fn complete_values(&self) -> Option<Vec<f64>> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Points within the inclusive window `[start, end]`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let points = self
            .points
            .iter()
            .filter(|(d, _)| *d >= start && *d <= end)
            .copied()
            .collect();
        Self { points }
    }

    /// Points outside the inclusive window `[start, end]`.
    pub fn exclude(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let points = self
            .points
            .iter()
            .filter(|(d, _)| *d < start || *d > end)
            .copied()
            .collect();
        Self { points }
    }

    /// The last `n` observations (fewer if the series is shorter).
    pub fn tail(&self, n: usize) -> Self {
        let skip = self.points.len().saturating_sub(n);
        Self {
            points: self.points[skip..].to_vec(),
        }
    }

    /// Apply `f` to every present value; missing values stay missing.
    pub fn map_values(&self, mut f: impl FnMut(NaiveDate, f64) -> f64) -> Self {
        let points = self
            .points
            .iter()
            .map(|(d, v)| (*d, v.map(|x| f(*d, x))))
            .collect();
        Self { points }
    }

    /// True when consecutive dates are exactly one day apart.
    pub fn is_contiguous(&self) -> bool {
        self.points
            .windows(2)
            .all(|pair| pair[1].0 - pair[0].0 == Duration::days(1))
    }

    /// Relabel the values onto a contiguous daily index starting at `start`.
    pub fn reindex_daily(&self, start: NaiveDate) -> Self {
        Self::from_start_opt(start, self.values())
    }

    /// Positional lagged difference `v[i] - v[i-lag]`, labelled with `date[i]`.
    ///
    /// The first `lag` points have no predecessor and are dropped.
    pub fn lagged_difference(&self, lag: usize) -> Self {
        let points = self
            .points
            .iter()
            .skip(lag)
            .zip(self.points.iter())
            .map(|((date, cur), (_, prev))| {
                let value = match (cur, prev) {
                    (Some(c), Some(p)) => Some(c - p),
                    _ => None,
                };
                (*date, value)
            })
            .collect();
        Self { points }
    }
}

/// Inclusive daily range `[start, end]`.
pub fn day_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let days = (end - start).num_days().max(-1) + 1;
    (0..days).map(move |i| start + Duration::days(i))
}
