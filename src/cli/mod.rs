//! Command-line parsing for the repayment forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{ModelChoice, SmoothingKind, Stage};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "repay", version, about = "Daily repayment forecaster (calendar-corrected ARMA)")]
pub struct Cli {
    /// Log level when `RUST_LOG` is not set.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Preprocess, fit, forecast and recover; print, plot and write reports.
    Forecast(ForecastArgs),
    /// Summary statistics, ACF/PACF and rolling trend of the raw and
    /// preprocessed sample.
    Analyze(AnalyzeArgs),
    /// Rolling-origin evaluation: forecast from several cutoffs and score
    /// each against the actuals.
    Backtest(BacktestArgs),
    /// Write a seeded synthetic repayment CSV.
    Demo(DemoArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Input data options.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// CSV with one header row and one daily value per row.
    #[arg(short = 'd', long = "data", env = "REPAY_DATA", value_name = "CSV")]
    pub data: PathBuf,

    /// Column to read (defaults to the first column).
    #[arg(long)]
    pub column: Option<String>,

    /// Date of the first data row.
    #[arg(long, default_value = "2017-11-30")]
    pub data_start: NaiveDate,
}

/// Sample window and preprocessing options.
#[derive(Debug, Args, Clone)]
pub struct PipelineArgs {
    /// First sample date (defaults to the first observation).
    #[arg(long)]
    pub sample_start: Option<NaiveDate>,

    /// Last sample date (defaults to the last observation).
    #[arg(long)]
    pub sample_end: Option<NaiveDate>,

    /// Preprocessing stages; order is always drop, calendar, smooth, log, diff1, diff7.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [Stage::CalendarWeight, Stage::Log, Stage::Diff1, Stage::Diff7]
    )]
    pub stages: Vec<Stage>,

    /// Disable all preprocessing stages.
    #[arg(long, conflicts_with = "stages")]
    pub no_stages: bool,

    /// First day removed by the `drop` stage.
    #[arg(long, default_value = "2018-02-14")]
    pub drop_start: NaiveDate,

    /// Last day removed by the `drop` stage.
    #[arg(long, default_value = "2018-02-22")]
    pub drop_end: NaiveDate,

    /// Smoothing window (days).
    #[arg(long, default_value_t = 7)]
    pub smooth_window: usize,

    /// Smoothing filter.
    #[arg(long, value_enum, default_value_t = SmoothingKind::Rolling)]
    pub smoothing: SmoothingKind,

    /// Holiday calendar JSON (built-in 2018 calendar when absent).
    #[arg(long, value_name = "JSON")]
    pub calendar: Option<PathBuf>,

    /// Forecaster behind the pipeline.
    #[arg(long, value_enum, default_value_t = ModelChoice::Arma)]
    pub model: ModelChoice,

    /// AR order.
    #[arg(short = 'p', long, default_value_t = 2)]
    pub p: usize,

    /// MA order.
    #[arg(short = 'q', long, default_value_t = 1)]
    pub q: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Days to forecast.
    #[arg(short = 'n', long, default_value_t = 7, allow_negative_numbers = true)]
    pub predict_days: i64,

    /// First forecast date (defaults to the day after the sample).
    #[arg(long)]
    pub predict_start: Option<NaiveDate>,

    /// Use all data as the sample and forecast the following days.
    #[arg(long, conflicts_with_all = ["sample_start", "sample_end", "predict_start"])]
    pub auto: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Report folder; the chart goes to `<html-folder>/<fig-folder>`.
    #[arg(long, default_value = "html")]
    pub html_folder: PathBuf,

    #[arg(long, default_value = "fig")]
    pub fig_folder: PathBuf,

    /// Skip the HTML report and SVG chart.
    #[arg(long)]
    pub no_report: bool,

    /// Export the forecast table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export a JSON run summary.
    #[arg(long = "export-summary")]
    pub export_summary: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Largest ACF/PACF lag.
    #[arg(long, default_value_t = 21)]
    pub max_lag: usize,

    /// Rolling trend window (days).
    #[arg(long, default_value_t = 7)]
    pub trend_window: usize,

    /// Largest lag the Dickey-Fuller test considers (default `ceil(12 (n/100)^0.25)`).
    #[arg(long)]
    pub adf_max_lag: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Days forecast from each cutoff.
    #[arg(short = 'n', long, default_value_t = 7)]
    pub predict_days: i64,

    /// Number of cutoffs, counted back from the end of the data.
    #[arg(long, default_value_t = 4)]
    pub folds: usize,

    /// Days between consecutive cutoffs.
    #[arg(long, default_value_t = 7)]
    pub step: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Output CSV.
    #[arg(short = 'o', long, default_value = "demo.csv")]
    pub out: PathBuf,

    /// Number of days.
    #[arg(long, default_value_t = 150)]
    pub days: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Date of the first row.
    #[arg(long, default_value = "2017-11-30")]
    pub start: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_defaults() {
        let cli = Cli::parse_from(["repay", "forecast", "--data", "x.csv"]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(
            args.pipeline.stages,
            vec![Stage::CalendarWeight, Stage::Log, Stage::Diff1, Stage::Diff7]
        );
        assert_eq!((args.pipeline.p, args.pipeline.q), (2, 1));
        assert_eq!(args.predict_days, 7);
        assert_eq!(args.data.data_start, NaiveDate::from_ymd_opt(2017, 11, 30).unwrap());
        assert!(!args.auto);
    }

    #[test]
    fn stages_parse_as_a_list() {
        let cli = Cli::parse_from(["repay", "forecast", "--data", "x.csv", "--stages", "drop,smooth,diff7"]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.pipeline.stages, vec![Stage::Drop, Stage::Smooth, Stage::Diff7]);
    }
}
