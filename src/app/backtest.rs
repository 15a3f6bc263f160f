//! Rolling-origin backtest.
//!
//! Cutoffs are counted back from the end of the data so every fold's forecast
//! window is fully observed:
//!
//! ```text
//! cutoff_k = data_end - predict_days - k * step      (k = 0..folds)
//! sample   = [sample_start, cutoff_k]
//! forecast = [cutoff_k + 1, cutoff_k + predict_days]
//! ```
//!
//! Folds are independent, so they run in parallel (rayon). A fold that fails
//! to fit is reported, not fatal.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;

use crate::domain::{DatedSeries, ForecastRequest, RunConfig};
use crate::error::{AppError, ForecastError};
use crate::models::{Forecaster, forecaster_for};
use crate::pipeline::Pipeline;
use crate::report::{ErrorMetrics, compute_metrics};

#[derive(Debug, Clone)]
pub struct BacktestFold {
    pub cutoff: NaiveDate,
    pub forecast: DatedSeries,
    pub metrics: ErrorMetrics,
}

#[derive(Debug, Clone)]
pub struct BacktestFailure {
    pub cutoff: NaiveDate,
    pub error: ForecastError,
}

#[derive(Debug, Clone, Default)]
pub struct BacktestReport {
    /// Sorted by cutoff, oldest first.
    pub folds: Vec<BacktestFold>,
    pub failures: Vec<BacktestFailure>,
}

impl BacktestReport {
    /// Mean of the per-fold MAPE values.
    pub fn mean_mape(&self) -> Option<f64> {
        if self.folds.is_empty() {
            return None;
        }
        Some(self.folds.iter().map(|f| f.metrics.mape).sum::<f64>() / self.folds.len() as f64)
    }

    pub fn mean_rmse(&self) -> Option<f64> {
        if self.folds.is_empty() {
            return None;
        }
        Some(self.folds.iter().map(|f| f.metrics.rmse).sum::<f64>() / self.folds.len() as f64)
    }
}

/// Cutoff dates, most recent first. Cutoffs before `earliest`, or that would
/// fall off the calendar, are skipped.
pub fn cutoffs(earliest: NaiveDate, data_end: NaiveDate, predict_days: i64, folds: usize, step: usize) -> Vec<NaiveDate> {
    (0..folds)
        .map_while(|k| {
            let back = i64::try_from(k.checked_mul(step)?).ok()?.checked_add(predict_days)?;
            data_end.checked_sub_signed(Duration::try_days(back)?)
        })
        .take_while(|c| *c >= earliest)
        .collect()
}

/// Run every fold of the backtest on `data`.
pub fn run_backtest(
    config: &RunConfig,
    pipeline: &Pipeline,
    data: &DatedSeries,
    folds: usize,
    step: usize,
) -> Result<BacktestReport, AppError> {
    let (Some(data_start), Some(data_end)) = (data.first_date(), data.last_date()) else {
        return Err(ForecastError::config("data set is empty").into());
    };
    if config.predict_days <= 0 {
        return Err(ForecastError::config(format!(
            "predict days must be a positive integer, got {}",
            config.predict_days
        ))
        .into());
    }
    if folds == 0 || step == 0 {
        return Err(ForecastError::config("backtest needs at least one fold and a positive step").into());
    }

    let sample_start = match &config.window {
        crate::domain::WindowSpec::Manual {
            sample_start: Some(start),
            ..
        } => *start,
        _ => data_start,
    };
    let cuts = cutoffs(sample_start, data_end, config.predict_days, folds, step);
    if cuts.is_empty() {
        return Err(ForecastError::config(format!(
            "data {data_start} ~ {data_end} is too short for a {}-day backtest",
            config.predict_days
        ))
        .into());
    }

    let forecaster = forecaster_for(config.model);
    let results: Vec<(NaiveDate, Result<BacktestFold, ForecastError>)> = cuts
        .par_iter()
        .map(|&cutoff| {
            let fold = run_fold(config, pipeline, forecaster.as_ref(), data, sample_start, cutoff);
            (cutoff, fold)
        })
        .collect();

    let mut report = BacktestReport::default();
    for (cutoff, result) in results {
        match result {
            Ok(fold) => report.folds.push(fold),
            Err(error) => {
                tracing::warn!(%cutoff, %error, "backtest fold failed");
                report.failures.push(BacktestFailure { cutoff, error });
            }
        }
    }
    report.folds.sort_by_key(|f| f.cutoff);
    report.failures.sort_by_key(|f| f.cutoff);
    Ok(report)
}

fn run_fold(
    config: &RunConfig,
    pipeline: &Pipeline,
    forecaster: &dyn Forecaster,
    data: &DatedSeries,
    sample_start: NaiveDate,
    cutoff: NaiveDate,
) -> Result<BacktestFold, ForecastError> {
    let (Some(data_start), Some(data_end)) = (data.first_date(), data.last_date()) else {
        return Err(ForecastError::config("data set is empty"));
    };
    let request = ForecastRequest::new(data_start, data_end, sample_start, cutoff, None, config.predict_days)?;
    let sample = data.slice(request.sample_start, request.sample_end);
    let run = pipeline.run(&sample, forecaster, config.order, request.predict_end)?;
    let forecast = run.recovered.slice(request.predict_start, request.predict_end);
    let metrics = compute_metrics(data, &forecast)
        .ok_or_else(|| ForecastError::config(format!("no actuals after cutoff {cutoff}")))?;
    Ok(BacktestFold {
        cutoff,
        forecast,
        metrics,
    })
}

pub fn format_backtest(report: &BacktestReport, model_name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Backtest ({model_name}) ===\n"));
    out.push_str(&format!(
        "{:<12} {:>4} {:>12} {:>12} {:>10} {:>9}\n",
        "cutoff", "n", "RMSE", "MAE", "MAPE%", "R2"
    ));
    for f in &report.folds {
        let m = &f.metrics;
        out.push_str(&format!(
            "{:<12} {:>4} {:>12.4} {:>12.4} {:>10.4} {:>9.4}\n",
            f.cutoff.to_string(),
            m.n,
            m.rmse,
            m.mae,
            m.mape,
            m.r2
        ));
    }
    for f in &report.failures {
        out.push_str(&format!("{:<12} failed: {}\n", f.cutoff.to_string(), f.error));
    }
    if let (Some(mape), Some(rmse)) = (report.mean_mape(), report.mean_rmse()) {
        out.push_str(&format!(
            "mean over {} folds: RMSE {rmse:.4} | MAPE {mape:.4}%\n",
            report.folds.len()
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArmaOrder, ModelChoice, Stage, StageParams, StageSwitches, WindowSpec};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config() -> RunConfig {
        RunConfig {
            data_path: "unused.csv".into(),
            column: None,
            data_start: d(2018, 1, 1),
            window: WindowSpec::Automatic,
            predict_days: 7,
            switches: StageSwitches::from_stages(&[Stage::Log, Stage::Diff7]),
            params: StageParams::default(),
            calendar_path: None,
            model: ModelChoice::Naive,
            order: ArmaOrder::new(1, 0),
            plot: false,
            plot_width: 80,
            plot_height: 20,
            html_folder: None,
            fig_folder: "fig".into(),
            export_csv: None,
            export_summary: None,
        }
    }

    #[test]
    fn cutoffs_step_back_from_the_end() {
        let cuts = cutoffs(d(2018, 1, 1), d(2018, 3, 31), 7, 3, 7);
        assert_eq!(cuts, vec![d(2018, 3, 24), d(2018, 3, 17), d(2018, 3, 10)]);
    }

    #[test]
    fn cutoffs_stop_at_the_sample_start() {
        let cuts = cutoffs(d(2018, 3, 12), d(2018, 3, 31), 7, 5, 7);
        assert_eq!(cuts, vec![d(2018, 3, 24), d(2018, 3, 17)]);
    }

    #[test]
    fn oversized_offsets_yield_no_cutoffs() {
        assert!(cutoffs(d(2018, 1, 1), d(2018, 3, 31), i64::MAX, 3, 7).is_empty());
        assert!(cutoffs(d(2018, 1, 1), d(2018, 3, 31), 1_000_000_000, 3, 7).is_empty());
        assert_eq!(cutoffs(d(2018, 1, 1), d(2018, 3, 31), 7, 3, usize::MAX), vec![d(2018, 3, 24)]);
    }

    #[test]
    fn weekly_pattern_is_forecast_exactly_in_every_fold() {
        let week = [10.0, 12.0, 11.0, 13.0, 15.0, 20.0, 18.0];
        let data = DatedSeries::from_start(d(2018, 1, 1), (0..8).flat_map(|_| week));
        let cfg = config();
        let pipeline = Pipeline::new(cfg.switches, cfg.params, None).unwrap();

        let report = run_backtest(&cfg, &pipeline, &data, 3, 7).unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.folds.len(), 3);
        assert!(report.folds.windows(2).all(|w| w[0].cutoff < w[1].cutoff));
        for fold in &report.folds {
            assert_eq!(fold.metrics.n, 7);
            assert!(fold.metrics.mape < 1e-8, "cutoff {}: {}", fold.cutoff, fold.metrics.mape);
        }
        assert!(report.mean_mape().unwrap() < 1e-8);

        let text = format_backtest(&report, "naive");
        assert!(text.starts_with("=== Backtest (naive) ==="));
        assert!(text.contains("mean over 3 folds"));
    }

    #[test]
    fn too_short_data_is_rejected() {
        let data = DatedSeries::from_start(d(2018, 1, 1), [1.0, 2.0, 3.0]);
        let cfg = config();
        let pipeline = Pipeline::new(cfg.switches, cfg.params, None).unwrap();
        let err = run_backtest(&cfg, &pipeline, &data, 2, 7).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
