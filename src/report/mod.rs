//! Reporting: error metrics, terminal summaries, the HTML report and its chart.

pub mod analysis;
pub mod chart;
pub mod format;
pub mod html;
pub mod metrics;

pub use analysis::*;
pub use chart::*;
pub use format::*;
pub use html::*;
pub use metrics::*;
