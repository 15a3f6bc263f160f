//! Declarative holiday calendar configuration.
//!
//! This is the serializable form read from `--calendar <JSON>`. It is expanded
//! once into an immutable [`HolidayCalendar`](super::HolidayCalendar).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A holiday span: `days` consecutive days starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidaySpan {
    pub start: NaiveDate,
    pub days: u32,
}

impl HolidaySpan {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }
}

/// Weight constants.
///
/// `spring_festival`, `holiday`, `before_holiday` and `after_holiday` are
/// multiplicative. `united_repayment` and `month_end` are proportional
/// adjustments applied as `1 - ratio * w` and `1 + w`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarWeights {
    pub spring_festival: f64,
    pub holiday: f64,
    pub before_holiday: f64,
    pub after_holiday: f64,
    pub united_repayment: f64,
    pub month_end: f64,
}

impl Default for CalendarWeights {
    fn default() -> Self {
        Self {
            spring_festival: 1.0,
            holiday: 1.0,
            before_holiday: 1.0,
            after_holiday: 1.0,
            united_repayment: 0.055,
            month_end: 0.093,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Day of month onto which late-month due dates are consolidated.
    pub united_repayment_day: u32,
    pub spring_festival: Vec<HolidaySpan>,
    pub holidays: Vec<HolidaySpan>,
    pub weights: CalendarWeights,
}

impl Default for CalendarConfig {
    /// The 2017/2018 calendar the repayment data was collected under.
    fn default() -> Self {
        Self {
            united_repayment_day: 23,
            spring_festival: vec![HolidaySpan::new(ymd(2018, 2, 15), 7)],
            holidays: vec![
                HolidaySpan::new(ymd(2017, 12, 30), 3),
                HolidaySpan::new(ymd(2018, 4, 5), 3),
            ],
            weights: CalendarWeights::default(),
        }
    }
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "holidays": [{ "start": "2018-05-01", "days": 3 }], "weights": { "holiday": 0.8 } }"#;
        let cfg: CalendarConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.united_repayment_day, 23);
        assert_eq!(cfg.holidays, vec![HolidaySpan::new(ymd(2018, 5, 1), 3)]);
        assert_eq!(cfg.spring_festival.len(), 1);
        assert!((cfg.weights.holiday - 0.8).abs() < 1e-12);
        assert!((cfg.weights.month_end - 0.093).abs() < 1e-12);
    }
}
