//! ARMA estimation.
//!
//! Responsibilities:
//!
//! - build starting points (Hannan–Rissanen regressions, a flat start)
//! - refine each start by Gauss–Newton on the conditional sum of squares (parallel)
//! - select the best candidate deterministically and report diagnostics

pub mod css;
pub mod start;

pub use css::*;
pub use start::*;
