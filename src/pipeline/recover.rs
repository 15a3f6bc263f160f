//! Backward pass: raw model forecast to the original scale.
//!
//! Inverses run in strict reverse pipeline order:
//!
//! ```text
//! diff7 -> diff1 -> log -> smooth -> calendar
//! ```
//!
//! Every inverse reads only its own captured context, so the stage set
//! recorded in the forward pass must match the stage set requested here.

use chrono::Duration;

use crate::calendar::HolidayCalendar;
use crate::domain::{DatedSeries, SmoothingKind, Stage, StageSwitches};
use crate::error::{ForecastError, Result};
use crate::pipeline::{StageContext, StageContexts};
use crate::transform::{SEASONAL_LAG, exp_values, integrate, seasonal_integrate, unroll_mean, unsmooth_ewm};

/// Undo every enabled invertible stage on a raw model forecast.
///
/// The raw values are relabelled onto real dates starting the day after
/// `contexts.origin`, whatever their model-time labels were.
pub fn recover_forecast(
    raw: &DatedSeries,
    contexts: &StageContexts,
    switches: &StageSwitches,
    calendar: Option<&HolidayCalendar>,
) -> Result<DatedSeries> {
    let enabled: Vec<Stage> = switches
        .enabled()
        .into_iter()
        .filter(|s| s.is_invertible())
        .collect();
    let recorded = contexts.invertible_stages();
    if enabled != recorded {
        return Err(ForecastError::recovery(format!(
            "stage mismatch: enabled [{}], recorded [{}]",
            join(&enabled),
            join(&recorded)
        )));
    }

    let mut values = raw.complete_values().ok_or_else(|| {
        ForecastError::recovery(format!("raw forecast has {} missing values", raw.missing_count()))
    })?;
    let first = contexts.origin + Duration::days(1);

    for stage in enabled.iter().rev() {
        let context = contexts
            .get(*stage)
            .ok_or_else(|| ForecastError::recovery(format!("no context recorded for {stage}")))?;
        values = match (stage, context) {
            (Stage::Diff7, StageContext::Diff7 { history }) => {
                let history = complete(history, *stage)?;
                seasonal_integrate(&values, &history, SEASONAL_LAG)?
            }
            (Stage::Diff1, StageContext::Diff1 { last }) => {
                let last = last.ok_or_else(|| missing(*stage))?;
                integrate(&values, last)
            }
            (Stage::Log, StageContext::Log) => exp_values(&values),
            (
                Stage::Smooth,
                StageContext::Smooth {
                    kind,
                    window,
                    trailing,
                    last_smoothed,
                },
            ) => match kind {
                SmoothingKind::Rolling => {
                    let trailing = complete(trailing, *stage)?;
                    unroll_mean(&values, &trailing, *window)?
                }
                SmoothingKind::Exponential => {
                    let last = last_smoothed.ok_or_else(|| missing(*stage))?;
                    unsmooth_ewm(&values, last, *window)
                }
            },
            (Stage::CalendarWeight, StageContext::CalendarWeight) => {
                let calendar = calendar.ok_or_else(|| {
                    ForecastError::recovery("calendar stage enabled but no holiday calendar supplied")
                })?;
                let dated = DatedSeries::from_start(first, values);
                calendar
                    .recover(&dated)
                    .complete_values()
                    .ok_or_else(|| missing(*stage))?
            }
            (stage, other) => {
                return Err(ForecastError::recovery(format!(
                    "context for {stage} has the wrong shape: {other:?}"
                )));
            }
        };
        tracing::debug!(stage = %stage, "inverted stage");
    }

    Ok(DatedSeries::from_start(first, values))
}

fn complete(values: &[Option<f64>], stage: Stage) -> Result<Vec<f64>> {
    values.iter().copied().collect::<Option<Vec<f64>>>().ok_or_else(|| missing(stage))
}

fn missing(stage: Stage) -> ForecastError {
    ForecastError::recovery(format!("context for {stage} contains missing values"))
}

fn join(stages: &[Stage]) -> String {
    stages.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
}
