//! Error types.
//!
//! Library code returns [`ForecastError`]; the binary converts it into an
//! [`AppError`] carrying a process exit code.

use thiserror::Error;

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors raised by the forecasting pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Invalid run configuration (windows, predict days, stage parameters).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed or overlapping holiday calendar.
    #[error("calendar configuration error: {0}")]
    CalendarConfig(String),

    /// The forecasting model rejected its input or did not converge.
    #[error("fit error: {0}")]
    Fit(String),

    /// Stage contexts do not match the stages being inverted.
    #[error("recovery error: {0}")]
    Recovery(String),
}

impl ForecastError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn calendar(message: impl Into<String>) -> Self {
        Self::CalendarConfig(message.into())
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::Fit(message.into())
    }

    pub fn recovery(message: impl Into<String>) -> Self {
        Self::Recovery(message.into())
    }

    /// Exit code used by the `repay` binary for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) | Self::CalendarConfig(_) => 2,
            Self::Fit(_) => 4,
            Self::Recovery(_) => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_kind() {
        let err = ForecastError::config("predict days must be positive");
        assert_eq!(err.to_string(), "configuration error: predict days must be positive");

        let err = ForecastError::recovery("missing context for diff7");
        assert_eq!(err.to_string(), "recovery error: missing context for diff7");
    }

    #[test]
    fn app_error_keeps_exit_code() {
        let app: AppError = ForecastError::fit("constant series").into();
        assert_eq!(app.exit_code(), 4);
        assert_eq!(app.to_string(), "fit error: constant series");

        let app: AppError = ForecastError::recovery("x").into();
        assert_eq!(app.exit_code(), 5);
    }
}
