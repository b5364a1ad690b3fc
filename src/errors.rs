use thiserror::Error;

use crate::services::{completion_provider::CompletionError, response_parser::ParseError};

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("No content: {0}")]
    NoContent(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Completion error: {0}")]
    CompletionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NoContent(_) => "NO_CONTENT",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::CompletionError(_) => "COMPLETION_ERROR",
            AppError::ParseError(_) => "PARSE_ERROR",
            AppError::ConfigError(_) => "CONFIG_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("I/O error: {}", err))
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<CompletionError> for AppError {
    fn from(err: CompletionError) -> Self {
        AppError::CompletionError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
