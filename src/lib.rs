//! `repay-forecast` library crate.
//!
//! The binary (`repay`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - stages, models and reports are reusable on their own
//! - code stays easy to navigate as the project grows
//!
//! The core is [`pipeline::Pipeline`]: a reversible chain of preprocessing
//! stages (drop, calendar weighting, smoothing, log, diff1, diff7) in front of
//! a [`models::Forecaster`], with forecasts mapped back to the original scale.

pub mod app;
pub mod calendar;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod report;
pub mod transform;
