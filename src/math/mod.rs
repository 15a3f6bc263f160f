//! Numerical utilities: least squares, descriptive statistics and the ADF
//! unit-root test.

pub mod adf;
pub mod ols;
pub mod stats;

pub use adf::*;
pub use ols::*;
pub use stats::*;
