//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the tracing subscriber
//! - runs the forecast pipeline, analysis or backtest
//! - prints reports/plots
//! - writes the HTML report and optional exports

use chrono::Local;
use clap::Parser;

use crate::cli::{AnalyzeArgs, BacktestArgs, Command, DemoArgs, ForecastArgs, PipelineArgs};
use crate::domain::{ArmaOrder, RunConfig, StageParams, StageSwitches, WindowSpec};
use crate::error::AppError;
use crate::pipeline::RunPhase;

pub mod backtest;
pub mod pipeline;

/// Entry point for the `repay` binary.
pub fn run() -> Result<(), AppError> {
    // Best effort: a missing .env is normal.
    dotenvy::dotenv().ok();

    let cli = crate::cli::Cli::parse();
    crate::logging::init_logging(cli.log_level.as_str());

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Analyze(args) => handle_analyze(args),
        Command::Backtest(args) => handle_backtest(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let out = pipeline::run_forecast(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &out.ingest,
            &out.request,
            &out.run.preprocessed.applied,
            out.model_name,
            out.run.model.diagnostics(),
            &config,
        )
    );
    println!(
        "{}",
        crate::report::format_forecast_table(&out.rows, Some(&out.calendar))
    );
    if let Some(m) = &out.metrics {
        println!("{}", crate::report::format_metrics(m));
    }

    let actual = pipeline::actuals_through(&out.ingest.series, out.request.predict_end);
    if config.plot {
        let plot = crate::plot::render_forecast_plot(&actual, &out.forecast, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    if let Some(html_folder) = &config.html_folder {
        let paths = crate::io::ArtifactPaths::at(html_folder, &config.fig_folder, Local::now());
        let title = match &out.metrics {
            Some(m) => format!("Repayment forecast (MAPE {:.2}%)", m.mape),
            None => "Repayment forecast".to_string(),
        };
        let svg = crate::report::render_forecast_svg(&actual, &out.forecast, &title, 1000, 500)?;
        crate::io::write_replacing(&paths.figure, &svg)?;
        let html = crate::report::render_html_report(
            Local::now().date_naive(),
            &out.rows,
            out.metrics.as_ref(),
            &paths.figure_relative,
        );
        crate::io::write_replacing(&paths.html, &html)?;
        println!("Report: {}", paths.html.display());
    }

    // Optional exports.
    if let Some(path) = &config.export_csv {
        crate::io::write_forecast_csv(path, &out.rows)?;
    }
    if let Some(path) = &config.export_summary {
        crate::io::write_summary_json(path, &out.summary(&config))?;
    }

    RunPhase::Reported.enter();
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = base_config(&args.data, &args.pipeline, 1);
    let ingest = crate::io::load_series(&config.data_path, config.column.as_deref(), config.data_start)?;
    let (pipeline, _calendar) = pipeline::build_pipeline(&config)?;
    let request = pipeline::build_request(&config.window, &ingest.series, config.predict_days)?;

    let sample = ingest.series.slice(request.sample_start, request.sample_end);
    let preprocessed = pipeline.preprocess(&sample)?;

    let raw = crate::report::analyze_series(
        "raw sample",
        &sample,
        args.max_lag,
        args.trend_window,
        args.adf_max_lag,
    )?;
    println!("{}", crate::report::format_analysis(&raw));

    let label = format!(
        "preprocessed ({})",
        crate::report::fmt_stages(&preprocessed.applied)
    );
    let stationary = crate::report::analyze_series(
        &label,
        &preprocessed.stationary,
        args.max_lag,
        args.trend_window,
        args.adf_max_lag,
    )?;
    println!("{}", crate::report::format_analysis(&stationary));
    Ok(())
}

fn handle_backtest(args: BacktestArgs) -> Result<(), AppError> {
    let config = base_config(&args.data, &args.pipeline, args.predict_days);
    RunPhase::Configured.enter();
    let ingest = crate::io::load_series(&config.data_path, config.column.as_deref(), config.data_start)?;
    let (pipeline, _calendar) = pipeline::build_pipeline(&config)?;

    let report = backtest::run_backtest(&config, &pipeline, &ingest.series, args.folds, args.step)?;
    let model_name = crate::models::forecaster_for(config.model).name();
    println!("{}", backtest::format_backtest(&report, model_name));
    if report.folds.is_empty() {
        return Err(AppError::new(4, "Every backtest fold failed."));
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let calendar = crate::io::load_calendar(None)?;
    let synthetic = crate::data::SyntheticConfig {
        start: args.start,
        days: args.days,
        seed: args.seed,
        ..Default::default()
    };
    let series = crate::data::generate_repayment_series(&synthetic, &calendar)?;
    crate::data::write_series_csv(&args.out, &series, "repayment")?;
    println!(
        "Wrote {} days ({} ~ {}) to {}",
        series.len(),
        args.start,
        series.last_date().unwrap_or(args.start),
        args.out.display()
    );
    Ok(())
}

pub fn run_config_from_args(args: &ForecastArgs) -> RunConfig {
    let mut config = base_config(&args.data, &args.pipeline, args.predict_days);
    if args.auto {
        config.window = WindowSpec::Automatic;
    } else if let WindowSpec::Manual { predict_start, .. } = &mut config.window {
        *predict_start = args.predict_start;
    }
    config.plot = !args.no_plot;
    config.plot_width = args.width;
    config.plot_height = args.height;
    config.html_folder = (!args.no_report).then(|| args.html_folder.clone());
    config.fig_folder = args.fig_folder.clone();
    config.export_csv = args.export.clone();
    config.export_summary = args.export_summary.clone();
    config
}

/// Settings shared by every pipeline-driven command.
fn base_config(data: &crate::cli::DataArgs, p: &PipelineArgs, predict_days: i64) -> RunConfig {
    let switches = if p.no_stages {
        StageSwitches::none()
    } else {
        StageSwitches::from_stages(&p.stages)
    };
    RunConfig {
        data_path: data.data.clone(),
        column: data.column.clone(),
        data_start: data.data_start,
        window: WindowSpec::Manual {
            sample_start: p.sample_start,
            sample_end: p.sample_end,
            predict_start: None,
        },
        predict_days,
        switches,
        params: StageParams {
            drop_start: p.drop_start,
            drop_end: p.drop_end,
            smooth_window: p.smooth_window,
            smoothing: p.smoothing,
        },
        calendar_path: p.calendar.clone(),
        model: p.model,
        order: ArmaOrder::new(p.p, p.q),
        plot: false,
        plot_width: 100,
        plot_height: 25,
        html_folder: None,
        fig_folder: "fig".into(),
        export_csv: None,
        export_summary: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::Stage;

    fn forecast_args(argv: &[&str]) -> ForecastArgs {
        let mut full = vec!["repay", "forecast", "--data", "x.csv"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Forecast(args) => args,
            other => panic!("expected forecast, got {other:?}"),
        }
    }

    #[test]
    fn defaults_map_to_a_manual_window_with_report() {
        let config = run_config_from_args(&forecast_args(&[]));
        assert!(matches!(
            config.window,
            WindowSpec::Manual {
                sample_start: None,
                sample_end: None,
                predict_start: None
            }
        ));
        assert_eq!(config.switches.enabled(), vec![Stage::CalendarWeight, Stage::Log, Stage::Diff1, Stage::Diff7]);
        assert_eq!(config.order, ArmaOrder::new(2, 1));
        assert!(config.plot);
        assert_eq!(config.html_folder.as_deref(), Some(std::path::Path::new("html")));
    }

    #[test]
    fn auto_and_flags_are_applied() {
        let config = run_config_from_args(&forecast_args(&["--auto", "--no-stages", "--no-report", "--no-plot"]));
        assert!(matches!(config.window, WindowSpec::Automatic));
        assert!(config.switches.enabled().is_empty());
        assert!(config.html_folder.is_none());
        assert!(!config.plot);
    }

    #[test]
    fn predict_start_is_carried_into_the_window() {
        let config = run_config_from_args(&forecast_args(&["--sample-end", "2018-03-31", "--predict-start", "2018-04-03"]));
        let WindowSpec::Manual {
            sample_end,
            predict_start,
            ..
        } = config.window
        else {
            panic!("expected a manual window");
        };
        assert_eq!(sample_end, chrono::NaiveDate::from_ymd_opt(2018, 3, 31));
        assert_eq!(predict_start, chrono::NaiveDate::from_ymd_opt(2018, 4, 3));
    }
}
