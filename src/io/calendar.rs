//! Holiday calendar JSON.

use std::fs;
use std::path::Path;

use crate::calendar::{CalendarConfig, HolidayCalendar};
use crate::error::AppError;

/// Read a calendar config; the built-in 2018 calendar when `path` is `None`.
pub fn load_calendar(path: Option<&Path>) -> Result<HolidayCalendar, AppError> {
    let config = match path {
        Some(path) => read_calendar_config(path)?,
        None => CalendarConfig::default(),
    };
    Ok(HolidayCalendar::new(&config)?)
}

pub fn read_calendar_config(path: &Path) -> Result<CalendarConfig, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read calendar '{}': {e}", path.display())))?;
    let config: CalendarConfig = serde_json::from_str(&text)
        .map_err(|e| AppError::new(2, format!("Invalid calendar JSON '{}': {e}", path.display())))?;
    tracing::debug!(
        path = %path.display(),
        spring_festival = config.spring_festival.len(),
        holidays = config.holidays.len(),
        "loaded calendar"
    );
    Ok(config)
}
