//! Run summary JSON export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::RunSummaryFile;
use crate::error::AppError;

pub fn write_summary_json(path: &Path, summary: &RunSummaryFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;
    tracing::info!(path = %path.display(), "wrote run summary");
    Ok(())
}

pub fn read_summary_json(path: &Path) -> Result<RunSummaryFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid summary JSON: {e}")))
}
