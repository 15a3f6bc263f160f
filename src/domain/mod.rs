//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the daily series container (`DatedSeries`)
//! - stage switches and parameters (`Stage`, `StageSwitches`, `StageParams`)
//! - run configuration (`ForecastRequest`, `ArmaOrder`, `RunConfig`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
