//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - derived from CLI flags once per run
//! - passed read-only through the pipeline
//! - exported to JSON alongside the forecast

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Preprocessing stages, declared in pipeline order.
///
/// The derived `Ord` follows declaration order, so sorting a list of stages
/// yields the forward pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Exclude a configured outlier window.
    Drop,
    /// Holiday / repayment-day reweighting.
    #[value(name = "calendar")]
    #[serde(rename = "calendar")]
    CalendarWeight,
    /// Rolling or exponential mean.
    Smooth,
    /// Natural log.
    Log,
    /// Order-1 differencing.
    Diff1,
    /// Order-7 (weekly) differencing.
    Diff7,
}

impl Stage {
    /// Forward pipeline order.
    pub const PIPELINE: [Stage; 6] = [
        Stage::Drop,
        Stage::CalendarWeight,
        Stage::Smooth,
        Stage::Log,
        Stage::Diff1,
        Stage::Diff7,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Drop => "drop",
            Stage::CalendarWeight => "calendar",
            Stage::Smooth => "smooth",
            Stage::Log => "log",
            Stage::Diff1 => "diff1",
            Stage::Diff7 => "diff7",
        }
    }

    /// Whether the stage has an inverse applied during recovery.
    pub fn is_invertible(self) -> bool {
        !matches!(self, Stage::Drop)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which smoothing filter the `smooth` stage applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingKind {
    /// Unweighted trailing mean over `window` days.
    Rolling,
    /// Exponentially weighted mean with span `window`.
    Exponential,
}

/// Typed on/off switch for each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSwitches {
    pub drop: bool,
    pub calendar_weight: bool,
    pub smooth: bool,
    pub log: bool,
    pub diff1: bool,
    pub diff7: bool,
}

impl Default for StageSwitches {
    /// The analyst's standard configuration: calendar, log, diff1, diff7.
    fn default() -> Self {
        Self {
            drop: false,
            calendar_weight: true,
            smooth: false,
            log: true,
            diff1: true,
            diff7: true,
        }
    }
}

impl StageSwitches {
    /// Everything disabled.
    pub fn none() -> Self {
        Self {
            drop: false,
            calendar_weight: false,
            smooth: false,
            log: false,
            diff1: false,
            diff7: false,
        }
    }

    /// Enable exactly the given stages.
    pub fn from_stages(stages: &[Stage]) -> Self {
        let mut out = Self::none();
        for stage in stages {
            out.set(*stage, true);
        }
        out
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Drop => self.drop,
            Stage::CalendarWeight => self.calendar_weight,
            Stage::Smooth => self.smooth,
            Stage::Log => self.log,
            Stage::Diff1 => self.diff1,
            Stage::Diff7 => self.diff7,
        }
    }

    pub fn set(&mut self, stage: Stage, enabled: bool) {
        match stage {
            Stage::Drop => self.drop = enabled,
            Stage::CalendarWeight => self.calendar_weight = enabled,
            Stage::Smooth => self.smooth = enabled,
            Stage::Log => self.log = enabled,
            Stage::Diff1 => self.diff1 = enabled,
            Stage::Diff7 => self.diff7 = enabled,
        }
    }

    /// Enabled stages in forward pipeline order.
    pub fn enabled(&self) -> Vec<Stage> {
        Stage::PIPELINE
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }
}

/// Parameters of the configurable stages. Diff lags are fixed at 1 and 7.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageParams {
    /// Inclusive window removed by the `drop` stage.
    pub drop_start: NaiveDate,
    pub drop_end: NaiveDate,
    pub smooth_window: usize,
    pub smoothing: SmoothingKind,
}

impl Default for StageParams {
    fn default() -> Self {
        Self {
            // The 2018 spring-festival trough: keep `..=02-13` and `02-23..`.
            drop_start: NaiveDate::from_ymd_opt(2018, 2, 14).unwrap_or_default(),
            drop_end: NaiveDate::from_ymd_opt(2018, 2, 22).unwrap_or_default(),
            smooth_window: 7,
            smoothing: SmoothingKind::Rolling,
        }
    }
}

impl StageParams {
    pub fn validate(&self) -> Result<()> {
        if self.drop_end < self.drop_start {
            return Err(ForecastError::config(format!(
                "drop window end {} precedes start {}",
                self.drop_end, self.drop_start
            )));
        }
        if self.smooth_window < 2 {
            return Err(ForecastError::config("smoothing window must be at least 2 days"));
        }
        Ok(())
    }
}

/// ARMA lag orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmaOrder {
    pub p: usize,
    pub q: usize,
}

impl ArmaOrder {
    pub fn new(p: usize, q: usize) -> Self {
        Self { p, q }
    }

    /// Number of estimated coefficients including the constant.
    pub fn param_count(self) -> usize {
        self.p + self.q + 1
    }
}

impl std::fmt::Display for ArmaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.p, self.q)
    }
}

/// Sample and prediction windows for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub sample_start: NaiveDate,
    pub sample_end: NaiveDate,
    pub predict_start: NaiveDate,
    pub predict_end: NaiveDate,
    pub predict_days: usize,
}

impl ForecastRequest {
    /// Validate the windows against the available data range.
    ///
    /// `predict_start` defaults to the day after `sample_end`.
    pub fn new(
        data_start: NaiveDate,
        data_end: NaiveDate,
        sample_start: NaiveDate,
        sample_end: NaiveDate,
        predict_start: Option<NaiveDate>,
        predict_days: i64,
    ) -> Result<Self> {
        if predict_days <= 0 {
            return Err(ForecastError::config(format!(
                "predict days must be a positive integer, got {predict_days}"
            )));
        }
        if sample_end < sample_start {
            return Err(ForecastError::config(format!(
                "sample end {sample_end} precedes sample start {sample_start}"
            )));
        }
        if sample_start < data_start {
            return Err(ForecastError::config(format!(
                "sample start {sample_start} precedes the first observation {data_start}"
            )));
        }
        if sample_end > data_end {
            return Err(ForecastError::config(format!(
                "sample end {sample_end} is after the last observation {data_end}"
            )));
        }

        let predict_start = match predict_start {
            Some(date) => date,
            None => sample_end
                .succ_opt()
                .ok_or_else(|| ForecastError::config(format!("no date follows sample end {sample_end}")))?,
        };
        if predict_start <= sample_end {
            return Err(ForecastError::config(format!(
                "predict start {predict_start} must be after sample end {sample_end}"
            )));
        }
        let predict_end = Duration::try_days(predict_days - 1)
            .and_then(|span| predict_start.checked_add_signed(span))
            .ok_or_else(|| {
                ForecastError::config(format!(
                    "{predict_days} predict days from {predict_start} run past the calendar"
                ))
            })?;

        Ok(Self {
            sample_start,
            sample_end,
            predict_start,
            predict_end,
            predict_days: predict_days as usize,
        })
    }

    /// Use every observation as the sample and forecast the following days.
    pub fn automatic(data_start: NaiveDate, data_end: NaiveDate, predict_days: i64) -> Result<Self> {
        Self::new(data_start, data_end, data_start, data_end, None, predict_days)
    }

    /// Steps from the end of the sample through `predict_end`.
    pub fn horizon_days(&self) -> usize {
        (self.predict_end - self.sample_end).num_days() as usize
    }

    pub fn sample_days(&self) -> usize {
        ((self.sample_end - self.sample_start).num_days() + 1) as usize
    }
}

/// Which forecaster backs the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    /// ARMA(p,q) fitted by conditional sum of squares.
    Arma,
    /// No-change baseline: repeats the last stationary value.
    Naive,
}

/// Where the sample and window definitions come from.
#[derive(Debug, Clone)]
pub enum WindowSpec {
    /// Explicit sample window (defaults fill in from the data range).
    Manual {
        sample_start: Option<NaiveDate>,
        sample_end: Option<NaiveDate>,
        predict_start: Option<NaiveDate>,
    },
    /// Whole data set as sample, forecast the next days.
    Automatic,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    /// Column holding the values (first column when absent).
    pub column: Option<String>,
    pub data_start: NaiveDate,
    pub window: WindowSpec,
    pub predict_days: i64,

    pub switches: StageSwitches,
    pub params: StageParams,
    /// Optional JSON calendar; the built-in 2018 calendar otherwise.
    pub calendar_path: Option<PathBuf>,

    pub model: ModelChoice,
    pub order: ArmaOrder,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    /// HTML report folder; `None` disables the report.
    pub html_folder: Option<PathBuf>,
    /// Chart folder, relative to `html_folder`.
    pub fig_folder: PathBuf,
    pub export_csv: Option<PathBuf>,
    pub export_summary: Option<PathBuf>,
}

/// Serializable digest of one run (written by `--export-summary`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummaryFile {
    pub tool: String,
    pub request: ForecastRequest,
    pub stages: Vec<Stage>,
    pub params: StageParams,
    pub model: String,
    pub order: ArmaOrder,
    pub diagnostics: crate::models::FitDiagnostics,
    pub forecast: Vec<ForecastPoint>,
    pub metrics: Option<crate::report::ErrorMetrics>,
}

/// One forecast row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub actual: Option<f64>,
}
