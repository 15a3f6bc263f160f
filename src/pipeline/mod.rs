//! Reversible preprocessing pipeline around a forecaster.
//!
//! One run moves through these phases, each logged as it is entered:
//!
//! ```text
//! Configured -> SampleLoaded -> Preprocessed -> Fitted -> Forecasted -> Recovered -> Reported
//! ```
//!
//! - forward pass with context capture (`preprocess`)
//! - backward pass in reverse stage order (`recover`)
//! - per-stage inverse state (`context`)

pub mod context;
pub mod preprocess;
pub mod recover;

pub use context::*;
pub use preprocess::*;
pub use recover::*;

use chrono::{Duration, NaiveDate};

use crate::calendar::HolidayCalendar;
use crate::domain::{ArmaOrder, DatedSeries, StageParams, StageSwitches};
use crate::error::{ForecastError, Result};
use crate::models::{FittedModel, Forecaster};

/// Lifecycle of a forecast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Configured,
    SampleLoaded,
    Preprocessed,
    Fitted,
    Forecasted,
    Recovered,
    Reported,
}

impl RunPhase {
    pub fn name(self) -> &'static str {
        match self {
            RunPhase::Configured => "configured",
            RunPhase::SampleLoaded => "sample-loaded",
            RunPhase::Preprocessed => "preprocessed",
            RunPhase::Fitted => "fitted",
            RunPhase::Forecasted => "forecasted",
            RunPhase::Recovered => "recovered",
            RunPhase::Reported => "reported",
        }
    }

    /// Log entry into this phase.
    pub fn enter(self) -> Self {
        tracing::info!(phase = self.name(), "run phase");
        self
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage switches, parameters and the calendar for one configuration.
///
/// Immutable once built; the same pipeline can serve any number of runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    switches: StageSwitches,
    params: StageParams,
    calendar: Option<HolidayCalendar>,
}

/// Everything one run produced, kept for reporting.
#[derive(Debug)]
pub struct PipelineRun {
    pub preprocessed: Preprocessed,
    pub model: Box<dyn FittedModel>,
    /// Model output in model time.
    pub raw: DatedSeries,
    /// Forecast on the original scale and real dates.
    pub recovered: DatedSeries,
}

impl Pipeline {
    pub fn new(switches: StageSwitches, params: StageParams, calendar: Option<HolidayCalendar>) -> Result<Self> {
        params.validate()?;
        if switches.calendar_weight && calendar.is_none() {
            return Err(ForecastError::config(
                "calendar stage enabled without a holiday calendar",
            ));
        }
        Ok(Self {
            switches,
            params,
            calendar,
        })
    }

    pub fn switches(&self) -> &StageSwitches {
        &self.switches
    }

    pub fn params(&self) -> &StageParams {
        &self.params
    }

    pub fn calendar(&self) -> Option<&HolidayCalendar> {
        self.calendar.as_ref()
    }

    pub fn preprocess(&self, sample: &DatedSeries) -> Result<Preprocessed> {
        preprocess(sample, &self.switches, &self.params, self.calendar.as_ref())
    }

    /// Fit on the stationary series relabelled onto a contiguous daily range
    /// from its first date.
    pub fn fit(
        &self,
        forecaster: &dyn Forecaster,
        stationary: &DatedSeries,
        order: ArmaOrder,
    ) -> Result<Box<dyn FittedModel>> {
        let first = stationary
            .first_date()
            .ok_or_else(|| ForecastError::fit("cannot fit an empty series"))?;
        let model_input = stationary.reindex_daily(first);
        tracing::debug!(
            model = forecaster.name(),
            order = %order,
            points = model_input.len(),
            "fitting"
        );
        forecaster.fit(&model_input, order)
    }

    /// `horizon` steps after the model sample, in model time.
    pub fn forecast(&self, model: &dyn FittedModel, horizon: usize) -> Result<DatedSeries> {
        if horizon == 0 {
            return Err(ForecastError::config("forecast horizon must be positive"));
        }
        let last = model.sample_end();
        model.predict(
            last + Duration::days(1),
            last + Duration::days(horizon as i64),
        )
    }

    pub fn recover_forecast(&self, raw: &DatedSeries, contexts: &StageContexts) -> Result<DatedSeries> {
        recover_forecast(raw, contexts, &self.switches, self.calendar.as_ref())
    }

    /// Preprocess, fit, forecast every day after the sample through `through`,
    /// and recover.
    pub fn run(
        &self,
        sample: &DatedSeries,
        forecaster: &dyn Forecaster,
        order: ArmaOrder,
        through: NaiveDate,
    ) -> Result<PipelineRun> {
        let preprocessed = self.preprocess(sample)?;
        RunPhase::Preprocessed.enter();

        let origin = preprocessed.contexts.origin;
        let horizon = (through - origin).num_days();
        if horizon <= 0 {
            return Err(ForecastError::config(format!(
                "forecast end {through} is not after the last sample date {origin}"
            )));
        }
        let horizon = horizon as usize;

        let model = self.fit(forecaster, &preprocessed.stationary, order)?;
        RunPhase::Fitted.enter();
        let diag = model.diagnostics();
        tracing::info!(aic = diag.aic, bic = diag.bic, hqic = diag.hqic, "fit diagnostics");

        let raw = self.forecast(model.as_ref(), horizon)?;
        RunPhase::Forecasted.enter();

        let recovered = self.recover_forecast(&raw, &preprocessed.contexts)?;
        RunPhase::Recovered.enter();

        Ok(PipelineRun {
            preprocessed,
            model,
            raw,
            recovered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarConfig;
    use crate::domain::{SmoothingKind, Stage};
    use crate::models::NaiveForecaster;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::new(&CalendarConfig::default()).unwrap()
    }

    fn two_weeks(first: [f64; 7], scale: f64, shift: f64) -> Vec<f64> {
        first
            .iter()
            .copied()
            .chain(first.iter().map(|v| v * scale + shift))
            .collect()
    }

    const WEEK: [f64; 7] = [10.0, 12.0, 11.0, 13.0, 15.0, 20.0, 18.0];

    #[test]
    fn golden_forecast_with_log() {
        // Week two doubles week one, so the diff-7 series of log diffs is zero
        // and a no-change model forecasts another doubling.
        let sample = DatedSeries::from_start(d(2018, 3, 1), two_weeks(WEEK, 2.0, 0.0));
        let switches = StageSwitches::from_stages(&[Stage::CalendarWeight, Stage::Log, Stage::Diff1, Stage::Diff7]);
        let pipeline = Pipeline::new(switches, StageParams::default(), Some(calendar())).unwrap();

        let run = pipeline.run(&sample, &NaiveForecaster, ArmaOrder::new(2, 1), d(2018, 3, 21)).unwrap();
        assert_eq!(run.recovered.first_date(), Some(d(2018, 3, 15)));
        let got = run.recovered.complete_values().unwrap();
        let want = [40.0, 48.0, 44.0, 52.0, 60.0, 80.0, 72.0];
        for (g, w) in got.iter().zip(want) {
            assert_relative_eq!(*g, w, max_relative = 1e-10);
        }
    }

    #[test]
    fn golden_forecast_without_log() {
        let sample = DatedSeries::from_start(d(2018, 3, 1), two_weeks(WEEK, 1.0, 1.0));
        let switches = StageSwitches::from_stages(&[Stage::CalendarWeight, Stage::Diff1, Stage::Diff7]);
        let pipeline = Pipeline::new(switches, StageParams::default(), Some(calendar())).unwrap();

        let run = pipeline.run(&sample, &NaiveForecaster, ArmaOrder::new(2, 1), d(2018, 3, 21)).unwrap();
        let got = run.recovered.complete_values().unwrap();
        let want = [12.0, 14.0, 13.0, 15.0, 17.0, 22.0, 20.0];
        for (g, w) in got.iter().zip(want) {
            assert_relative_eq!(*g, w, epsilon = 1e-9);
        }
    }

    #[test]
    fn calendar_effect_is_removed_and_restored() {
        // Underlying demand doubles week over week; observed values carry the
        // inverse calendar factor (03-23 and the month end fall in the window).
        let cal = calendar();
        let start = d(2018, 3, 10);
        let base = two_weeks(WEEK, 2.0, 0.0);
        let observed = DatedSeries::from_start(start, base.iter().copied()).map_values(|date, v| v / cal.factor(date));

        let switches = StageSwitches::from_stages(&[Stage::CalendarWeight, Stage::Log, Stage::Diff1, Stage::Diff7]);
        let pipeline = Pipeline::new(switches, StageParams::default(), Some(cal.clone())).unwrap();
        let run = pipeline.run(&observed, &NaiveForecaster, ArmaOrder::new(1, 0), d(2018, 3, 30)).unwrap();

        let future_start = d(2018, 3, 24);
        let want: Vec<f64> = WEEK
            .iter()
            .enumerate()
            .map(|(i, v)| v * 4.0 / cal.factor(future_start + Duration::days(i as i64)))
            .collect();
        let got = run.recovered.complete_values().unwrap();
        assert_ne!(cal.factor(d(2018, 3, 28)), 1.0);
        for (g, w) in got.iter().zip(&want) {
            assert_relative_eq!(*g, *w, max_relative = 1e-10);
        }
    }

    #[test]
    fn oracle_model_reproduces_future_for_every_stage_combination() {
        let cal = calendar();
        let full: Vec<f64> = (0..70)
            .map(|i| 200.0 + 15.0 * f64::from(i % 7) + 0.8 * f64::from(i) + if i % 3 == 0 { 4.0 } else { 0.0 })
            .collect();
        let full = DatedSeries::from_start(d(2018, 1, 25), full);
        let sample_end = d(2018, 3, 25);
        let sample = full.slice(d(2018, 1, 25), sample_end);
        let future = full.slice(sample_end + Duration::days(1), d(2018, 4, 4));

        for mask in 0u32..64 {
            for kind in [SmoothingKind::Rolling, SmoothingKind::Exponential] {
                let stages: Vec<Stage> = Stage::PIPELINE
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, s)| s)
                    .collect();
                let switches = StageSwitches::from_stages(&stages);
                let params = StageParams {
                    smoothing: kind,
                    ..StageParams::default()
                };
                let pipeline = Pipeline::new(switches, params, Some(cal.clone())).unwrap();

                let pre_sample = pipeline.preprocess(&sample).unwrap();
                let pre_full = pipeline.preprocess(&full).unwrap();
                let oracle = pre_full.stationary.tail(future.len());

                let recovered = pipeline.recover_forecast(&oracle, &pre_sample.contexts).unwrap();
                assert_eq!(recovered.first_date(), Some(sample_end + Duration::days(1)));
                let got = recovered.complete_values().unwrap();
                let want = future.complete_values().unwrap();
                for (g, w) in got.iter().zip(&want) {
                    assert_relative_eq!(*g, *w, max_relative = 1e-8);
                }
            }
        }
    }

    #[test]
    fn forecast_end_inside_sample_is_rejected() {
        let sample = DatedSeries::from_start(d(2018, 3, 1), two_weeks(WEEK, 2.0, 0.0));
        let pipeline = Pipeline::new(StageSwitches::none(), StageParams::default(), None).unwrap();
        let err = pipeline.run(&sample, &NaiveForecaster, ArmaOrder::new(1, 0), d(2018, 3, 14)).unwrap_err();
        assert!(matches!(err, ForecastError::Configuration(_)));
    }

    #[test]
    fn calendar_stage_without_calendar_is_rejected() {
        let switches = StageSwitches::default();
        assert!(Pipeline::new(switches, StageParams::default(), None).is_err());
    }
}
