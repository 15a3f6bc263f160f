//! Calendar-effect weighting and its exact inverse.
//!
//! Repayments dip during holidays, spike on the unified repayment day (the
//! 23rd, onto which the 28th..31st due dates are consolidated) and shrink at
//! month end. `weighting` multiplies each observation by a per-date factor to
//! flatten those effects; `recover` divides by the very same factor.
//!
//! Factor for a date, as a product of two independent parts:
//!
//! 1. spring festival → `w_sf`; else ordinary holiday → `w_h`; else the day
//!    before a holiday → `w_before`; else the day after → `w_after`
//! 2. `day == united_repayment_day` and `month < 12` → `1 - ratio * w_urd`,
//!    `ratio = days_in_month - 27`; else `day >= 28` and `month < 12` →
//!    `1 + w_me`
//!
//! December is exempt from part 2.
//!
//! `w_before` and `w_after` are opt-in: they default to `1.0`, so the days
//! around a holiday are tagged (and reported) but not reweighted unless a
//! calendar file sets them.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::calendar::config::{CalendarConfig, CalendarWeights, HolidaySpan};
use crate::domain::DatedSeries;
use crate::error::{ForecastError, Result};

/// First day-of-month counted as "month end".
const MONTH_END_FIRST_DAY: u32 = 28;

/// Tagged date sets derived from a [`CalendarConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedCalendar {
    pub spring_festival: BTreeSet<NaiveDate>,
    pub ordinary_holidays: BTreeSet<NaiveDate>,
    pub before_holiday: BTreeSet<NaiveDate>,
    pub after_holiday: BTreeSet<NaiveDate>,
}

/// How a date is treated by the calendar (highest-priority tag wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCategory {
    SpringFestival,
    Holiday,
    BeforeHoliday,
    AfterHoliday,
    UnitedRepaymentDay,
    MonthEnd,
    Ordinary,
}

impl DayCategory {
    pub fn label(self) -> &'static str {
        match self {
            DayCategory::SpringFestival => "spring festival",
            DayCategory::Holiday => "holiday",
            DayCategory::BeforeHoliday => "before holiday",
            DayCategory::AfterHoliday => "after holiday",
            DayCategory::UnitedRepaymentDay => "repayment day",
            DayCategory::MonthEnd => "month end",
            DayCategory::Ordinary => "",
        }
    }
}

/// Expand configured spans into tagged date sets.
///
/// Each `(start, days)` covers `[start, start + days - 1]`; the day before is
/// tagged `before_holiday` and the day after `after_holiday`.
pub fn expand(config: &CalendarConfig) -> Result<ExpandedCalendar> {
    let mut out = ExpandedCalendar::default();
    let mut seen = BTreeSet::new();

    for (span, is_spring) in config
        .spring_festival
        .iter()
        .map(|s| (s, true))
        .chain(config.holidays.iter().map(|s| (s, false)))
    {
        let (first, last) = span_bounds(span)?;
        let mut date = first;
        while date <= last {
            if !seen.insert(date) {
                return Err(ForecastError::calendar(format!(
                    "holiday span starting {} overlaps another span on {date}",
                    span.start
                )));
            }
            if is_spring {
                out.spring_festival.insert(date);
            } else {
                out.ordinary_holidays.insert(date);
            }
            date += Duration::days(1);
        }

        let before = first
            .pred_opt()
            .ok_or_else(|| ForecastError::calendar(format!("span start {first} has no previous day")))?;
        let after = last
            .succ_opt()
            .ok_or_else(|| ForecastError::calendar(format!("span end {last} has no next day")))?;
        out.before_holiday.insert(before);
        out.after_holiday.insert(after);
    }

    Ok(out)
}

fn span_bounds(span: &HolidaySpan) -> Result<(NaiveDate, NaiveDate)> {
    if span.days == 0 {
        return Err(ForecastError::calendar(format!(
            "holiday span starting {} has zero days",
            span.start
        )));
    }
    let last = span
        .start
        .checked_add_signed(Duration::days(i64::from(span.days) - 1))
        .ok_or_else(|| ForecastError::calendar(format!("holiday span starting {} overflows", span.start)))?;
    Ok((span.start, last))
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 30,
    }
}

/// Immutable calendar: configuration constants plus expanded date sets.
///
/// Holds no per-run state, so one instance can serve any number of runs.
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayCalendar {
    united_repayment_day: u32,
    weights: CalendarWeights,
    dates: ExpandedCalendar,
}

impl HolidayCalendar {
    pub fn new(config: &CalendarConfig) -> Result<Self> {
        validate_constants(config)?;
        let dates = expand(config)?;
        Ok(Self {
            united_repayment_day: config.united_repayment_day,
            weights: config.weights,
            dates,
        })
    }

    pub fn dates(&self) -> &ExpandedCalendar {
        &self.dates
    }

    pub fn weights(&self) -> &CalendarWeights {
        &self.weights
    }

    pub fn united_repayment_day(&self) -> u32 {
        self.united_repayment_day
    }

    /// Multiplicative factor `weighting` applies on `date`.
    pub fn factor(&self, date: NaiveDate) -> f64 {
        self.holiday_factor(date) * self.monthly_factor(date)
    }

    fn holiday_factor(&self, date: NaiveDate) -> f64 {
        let w = &self.weights;
        if self.dates.spring_festival.contains(&date) {
            w.spring_festival
        } else if self.dates.ordinary_holidays.contains(&date) {
            w.holiday
        } else if self.dates.before_holiday.contains(&date) {
            w.before_holiday
        } else if self.dates.after_holiday.contains(&date) {
            w.after_holiday
        } else {
            1.0
        }
    }

    fn monthly_factor(&self, date: NaiveDate) -> f64 {
        if date.month() >= 12 {
            return 1.0;
        }
        if date.day() == self.united_repayment_day {
            let ratio = f64::from(days_in_month(date.year(), date.month())) - 27.0;
            1.0 - ratio * self.weights.united_repayment
        } else if date.day() >= MONTH_END_FIRST_DAY {
            1.0 + self.weights.month_end
        } else {
            1.0
        }
    }

    /// Flatten calendar effects.
    pub fn weighting(&self, series: &DatedSeries) -> DatedSeries {
        series.map_values(|date, v| v * self.factor(date))
    }

    /// Undo [`HolidayCalendar::weighting`].
    pub fn recover(&self, series: &DatedSeries) -> DatedSeries {
        series.map_values(|date, v| v / self.factor(date))
    }

    /// Highest-priority tag for `date`.
    pub fn category(&self, date: NaiveDate) -> DayCategory {
        if self.dates.spring_festival.contains(&date) {
            DayCategory::SpringFestival
        } else if self.dates.ordinary_holidays.contains(&date) {
            DayCategory::Holiday
        } else if self.dates.before_holiday.contains(&date) {
            DayCategory::BeforeHoliday
        } else if self.dates.after_holiday.contains(&date) {
            DayCategory::AfterHoliday
        } else if date.month() < 12 && date.day() == self.united_repayment_day {
            DayCategory::UnitedRepaymentDay
        } else if date.month() < 12 && date.day() >= MONTH_END_FIRST_DAY {
            DayCategory::MonthEnd
        } else {
            DayCategory::Ordinary
        }
    }
}

/// Reject constants that would make `weighting` non-invertible.
fn validate_constants(config: &CalendarConfig) -> Result<()> {
    if !(1..=31).contains(&config.united_repayment_day) {
        return Err(ForecastError::calendar(format!(
            "united repayment day must be within 1..=31, got {}",
            config.united_repayment_day
        )));
    }

    let w = &config.weights;
    for (name, value) in [
        ("spring_festival", w.spring_festival),
        ("holiday", w.holiday),
        ("before_holiday", w.before_holiday),
        ("after_holiday", w.after_holiday),
    ] {
        if !value.is_finite() || value == 0.0 {
            return Err(ForecastError::calendar(format!(
                "weight `{name}` must be finite and non-zero, got {value}"
            )));
        }
    }

    // Month lengths 28..=31 give ratios 1..=4.
    for ratio in 1..=4 {
        let f = 1.0 - f64::from(ratio) * w.united_repayment;
        if !f.is_finite() || f == 0.0 {
            return Err(ForecastError::calendar(format!(
                "united repayment weight {} zeroes the factor for ratio {ratio}",
                w.united_repayment
            )));
        }
    }
    let f = 1.0 + w.month_end;
    if !f.is_finite() || f == 0.0 {
        return Err(ForecastError::calendar(format!(
            "month end weight {} zeroes the factor",
            w.month_end
        )));
    }
    Ok(())
}
