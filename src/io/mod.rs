//! Input/output helpers.
//!
//! - CSV ingest of the daily series (`ingest`)
//! - holiday calendar JSON (`calendar`)
//! - forecast CSV export (`export`)
//! - run summary JSON (`summary`)
//! - timestamped report artifacts (`artifacts`)

pub mod artifacts;
pub mod calendar;
pub mod export;
pub mod ingest;
pub mod summary;

pub use artifacts::*;
pub use calendar::*;
pub use export::*;
pub use ingest::*;
pub use summary::*;
