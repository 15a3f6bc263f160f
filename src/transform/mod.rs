//! Invertible series transforms.
//!
//! Each forward transform works on a [`DatedSeries`](crate::domain::DatedSeries);
//! each inverse works on a plain slice of predicted values plus the minimal
//! context captured before the forward step ran.
//!
//! - window drop (not invertible) (`window`)
//! - natural log / exp (`log`)
//! - lag-1 and lag-7 differencing (`diff`)
//! - rolling and exponential smoothing (`smooth`)

pub mod diff;
pub mod log;
pub mod smooth;
pub mod window;

pub use diff::*;
pub use log::*;
pub use smooth::*;
pub use window::*;
