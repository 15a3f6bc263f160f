//! Holiday calendar and calendar-effect weighting.
//!
//! - declarative, serializable configuration (`config`)
//! - expansion into tagged date sets plus `weighting` / `recover` (`effect`)

pub mod config;
pub mod effect;

pub use config::*;
pub use effect::*;
