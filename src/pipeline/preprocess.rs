//! Forward pass: raw sample to stationary series.

use crate::calendar::HolidayCalendar;
use crate::domain::{DatedSeries, Stage, StageParams, StageSwitches};
use crate::error::{ForecastError, Result};
use crate::pipeline::{StageContext, StageContexts};
use crate::transform::{SEASONAL_LAG, difference, drop_window, log_transform, smooth};

/// Output of the forward pass.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// The sample after the drop stage (real dates).
    pub sample: DatedSeries,
    /// Input to the model, still on real dates.
    pub stationary: DatedSeries,
    pub contexts: StageContexts,
    /// Stages applied, in order.
    pub applied: Vec<Stage>,
}

/// Apply every enabled stage in pipeline order, capturing each stage's context
/// before it runs.
pub fn preprocess(
    sample: &DatedSeries,
    switches: &StageSwitches,
    params: &StageParams,
    calendar: Option<&HolidayCalendar>,
) -> Result<Preprocessed> {
    if sample.is_empty() {
        return Err(ForecastError::config("sample window contains no observations"));
    }
    params.validate()?;

    let mut current = sample.clone();
    let mut kept = sample.clone();
    let mut contexts: Vec<StageContext> = Vec::new();
    let applied = switches.enabled();

    for stage in &applied {
        let before = current.len();
        current = match stage {
            Stage::Drop => {
                let next = drop_window(&current, params.drop_start, params.drop_end)?;
                contexts.push(StageContext::Drop {
                    start: params.drop_start,
                    end: params.drop_end,
                    removed: current.len() - next.len(),
                });
                kept = next.clone();
                next
            }
            Stage::CalendarWeight => {
                let calendar = calendar.ok_or_else(|| {
                    ForecastError::config("calendar stage enabled without a holiday calendar")
                })?;
                contexts.push(StageContext::CalendarWeight);
                calendar.weighting(&current)
            }
            Stage::Smooth => {
                let window = params.smooth_window;
                let next = smooth(&current, params.smoothing, window)?;
                contexts.push(StageContext::Smooth {
                    kind: params.smoothing,
                    window,
                    trailing: current.tail(window - 1).values().collect(),
                    last_smoothed: next.last_value(),
                });
                next
            }
            Stage::Log => {
                contexts.push(StageContext::Log);
                log_transform(&current)?
            }
            Stage::Diff1 => {
                contexts.push(StageContext::Diff1 {
                    last: current.last_value(),
                });
                difference(&current, 1)?
            }
            Stage::Diff7 => {
                contexts.push(StageContext::Diff7 {
                    history: current.values().collect(),
                });
                difference(&current, SEASONAL_LAG)?
            }
        };
        tracing::debug!(stage = %stage, before, after = current.len(), "applied stage");
    }

    let origin = kept
        .last_date()
        .ok_or_else(|| ForecastError::config("sample window contains no observations"))?;
    let mut map = StageContexts::new(origin);
    for context in contexts {
        map.insert(context);
    }

    Ok(Preprocessed {
        sample: kept,
        stationary: current,
        contexts: map,
        applied,
    })
}
