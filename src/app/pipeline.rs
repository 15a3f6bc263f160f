//! Shared "forecast run" logic used by the `forecast`, `analyze` and
//! `backtest` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> windows -> preprocess -> fit -> forecast -> recover -> metrics
//!
//! The commands can then focus on presentation.

use chrono::NaiveDate;

use crate::calendar::HolidayCalendar;
use crate::domain::{DatedSeries, ForecastPoint, ForecastRequest, RunConfig, RunSummaryFile, WindowSpec};
use crate::error::{AppError, Result};
use crate::io::{IngestedData, load_calendar, load_series};
use crate::models::forecaster_for;
use crate::pipeline::{Pipeline, PipelineRun, RunPhase};
use crate::report::{ErrorMetrics, compute_metrics};

/// All computed outputs of a single `repay forecast` run.
#[derive(Debug)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub request: ForecastRequest,
    pub calendar: HolidayCalendar,
    pub model_name: &'static str,
    pub run: PipelineRun,
    /// The `[predict_start, predict_end]` slice of the recovered forecast.
    pub forecast: DatedSeries,
    pub rows: Vec<ForecastPoint>,
    /// Present when the forecast window overlaps the data.
    pub metrics: Option<ErrorMetrics>,
}

impl RunOutput {
    pub fn summary(&self, config: &RunConfig) -> RunSummaryFile {
        RunSummaryFile {
            tool: format!("repay {}", env!("CARGO_PKG_VERSION")),
            request: self.request,
            stages: self.run.preprocessed.applied.clone(),
            params: config.params,
            model: self.model_name.to_string(),
            order: config.order,
            diagnostics: self.run.model.diagnostics().clone(),
            forecast: self.rows.clone(),
            metrics: self.metrics,
        }
    }
}

/// Resolve the sample and forecast windows against the loaded data.
pub fn build_request(window: &WindowSpec, data: &DatedSeries, predict_days: i64) -> Result<ForecastRequest> {
    let (Some(data_start), Some(data_end)) = (data.first_date(), data.last_date()) else {
        return Err(crate::error::ForecastError::config("data set is empty"));
    };
    match window {
        WindowSpec::Automatic => ForecastRequest::automatic(data_start, data_end, predict_days),
        WindowSpec::Manual {
            sample_start,
            sample_end,
            predict_start,
        } => ForecastRequest::new(
            data_start,
            data_end,
            sample_start.unwrap_or(data_start),
            sample_end.unwrap_or(data_end),
            *predict_start,
            predict_days,
        ),
    }
}

/// Load the calendar and assemble the pipeline for a configuration.
pub fn build_pipeline(config: &RunConfig) -> std::result::Result<(Pipeline, HolidayCalendar), AppError> {
    let calendar = load_calendar(config.calendar_path.as_deref())?;
    let pipeline = Pipeline::new(config.switches, config.params, Some(calendar.clone()))?;
    Ok((pipeline, calendar))
}

/// Execute the full forecast run and return the computed outputs.
pub fn run_forecast(config: &RunConfig) -> std::result::Result<RunOutput, AppError> {
    RunPhase::Configured.enter();
    let ingest = load_series(&config.data_path, config.column.as_deref(), config.data_start)?;
    run_forecast_with_data(config, ingest)
}

/// Execute the run on already ingested data.
pub fn run_forecast_with_data(config: &RunConfig, ingest: IngestedData) -> std::result::Result<RunOutput, AppError> {
    let (pipeline, calendar) = build_pipeline(config)?;
    let request = build_request(&config.window, &ingest.series, config.predict_days)?;

    let sample = ingest.series.slice(request.sample_start, request.sample_end);
    RunPhase::SampleLoaded.enter();
    tracing::info!(
        sample_start = %request.sample_start,
        sample_end = %request.sample_end,
        days = sample.len(),
        predict_start = %request.predict_start,
        predict_end = %request.predict_end,
        "sample window"
    );

    let forecaster = forecaster_for(config.model);
    let run = pipeline.run(&sample, forecaster.as_ref(), config.order, request.predict_end)?;

    let forecast = run.recovered.slice(request.predict_start, request.predict_end);
    let rows = forecast_rows(&forecast, &ingest.series);
    let metrics = compute_metrics(&ingest.series, &forecast);
    if let Some(m) = &metrics {
        tracing::info!(n = m.n, mape = m.mape, rmse = m.rmse, "forecast error against actuals");
    }

    Ok(RunOutput {
        ingest,
        request,
        calendar,
        model_name: forecaster.name(),
        run,
        forecast,
        rows,
        metrics,
    })
}

/// Pair each forecast day with the actual value, when known.
pub fn forecast_rows(forecast: &DatedSeries, actual: &DatedSeries) -> Vec<ForecastPoint> {
    forecast
        .points()
        .iter()
        .filter_map(|(date, value)| {
            Some(ForecastPoint {
                date: *date,
                value: (*value)?,
                actual: actual.get(*date),
            })
        })
        .collect()
}

/// Known data from the start through `end`, for charts.
pub fn actuals_through(data: &DatedSeries, end: NaiveDate) -> DatedSeries {
    match data.first_date() {
        Some(first) => data.slice(first, end),
        None => DatedSeries::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArmaOrder, ModelChoice, Stage, StageParams, StageSwitches};
    use crate::io::read_series;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config(window: WindowSpec, model: ModelChoice) -> RunConfig {
        RunConfig {
            data_path: "unused.csv".into(),
            column: None,
            data_start: d(2018, 3, 1),
            window,
            predict_days: 7,
            switches: StageSwitches::from_stages(&[Stage::Log, Stage::Diff1, Stage::Diff7]),
            params: StageParams::default(),
            calendar_path: None,
            model,
            order: ArmaOrder::new(2, 1),
            plot: false,
            plot_width: 80,
            plot_height: 20,
            html_folder: None,
            fig_folder: "fig".into(),
            export_csv: None,
            export_summary: None,
        }
    }

    fn ingest() -> IngestedData {
        // Three identical weeks, so the no-change forecast is exact.
        let week = ["10", "12", "11", "13", "15", "20", "18"];
        let mut csv = String::from("amount\n");
        for _ in 0..3 {
            for v in week {
                csv.push_str(v);
                csv.push('\n');
            }
        }
        read_series(csv.as_bytes(), None, d(2018, 3, 1)).unwrap()
    }

    #[test]
    fn manual_window_overlapping_data_reports_metrics() {
        let window = WindowSpec::Manual {
            sample_start: None,
            sample_end: Some(d(2018, 3, 14)),
            predict_start: None,
        };
        let out = run_forecast_with_data(&config(window, ModelChoice::Naive), ingest()).unwrap();
        assert_eq!(out.request.predict_start, d(2018, 3, 15));
        assert_eq!(out.rows.len(), 7);
        assert!(out.rows.iter().all(|r| r.actual.is_some()));
        let m = out.metrics.unwrap();
        assert_eq!(m.n, 7);
        assert!(m.mape < 1e-8, "mape = {}", m.mape);
    }

    #[test]
    fn automatic_window_forecasts_past_the_data() {
        let out = run_forecast_with_data(&config(WindowSpec::Automatic, ModelChoice::Naive), ingest()).unwrap();
        assert_eq!(out.request.sample_end, d(2018, 3, 21));
        assert_eq!(out.forecast.first_date(), Some(d(2018, 3, 22)));
        assert_eq!(out.forecast.last_date(), Some(d(2018, 3, 28)));
        assert!(out.metrics.is_none());
        assert!(out.rows.iter().all(|r| r.actual.is_none()));

        let summary = out.summary(&config(WindowSpec::Automatic, ModelChoice::Naive));
        assert_eq!(summary.model, "naive");
        assert_eq!(summary.forecast.len(), 7);
    }

    #[test]
    fn sample_past_the_data_is_a_configuration_error() {
        let window = WindowSpec::Manual {
            sample_start: None,
            sample_end: Some(d(2018, 4, 30)),
            predict_start: None,
        };
        let err = run_forecast_with_data(&config(window, ModelChoice::Naive), ingest()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
