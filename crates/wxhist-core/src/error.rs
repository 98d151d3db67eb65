//! Application error hierarchy.
//!
//! Input errors are the user's to fix; everything else is a failure of the
//! lookup itself. `user_message()` gives text suitable for display.

use thiserror::Error;
use wxhist_form::FieldErrors;
use wxhist_weather::QueryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(#[from] FieldErrors),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// True when the user can fix the problem by editing the form.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }

    /// Per-field errors, for input errors only.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::InvalidInput(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "Some fields are invalid. Please correct them and try again.",
            AppError::Query(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}
