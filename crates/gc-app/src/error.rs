//! Error types for the gc-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the engine crates and
/// provides one error interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read curve file {path}: {message}")]
    CurveRead { path: PathBuf, message: String },

    #[error("Malformed curve data at line {line}: {message}")]
    CurveFormat { line: usize, message: String },

    #[error("Failed to read metadata file {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    #[error("Conditioning failed: {0}")]
    Conditioning(String),

    #[error("Window computation failed: {0}")]
    Windows(String),

    #[error("Compliance evaluation failed: {0}")]
    Compliance(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Batch error: {0}")]
    Batch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gc-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from engine error types
impl From<gc_config::ConfigError> for AppError {
    fn from(err: gc_config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<gc_signal::SignalError> for AppError {
    fn from(err: gc_signal::SignalError) -> Self {
        AppError::Conditioning(err.to_string())
    }
}

impl From<gc_windows::WindowError> for AppError {
    fn from(err: gc_windows::WindowError) -> Self {
        AppError::Windows(err.to_string())
    }
}

impl From<gc_compliance::ComplianceError> for AppError {
    fn from(err: gc_compliance::ComplianceError) -> Self {
        AppError::Compliance(err.to_string())
    }
}

impl From<gc_results::ResultsError> for AppError {
    fn from(err: gc_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<gc_core::CoreError> for AppError {
    fn from(err: gc_core::CoreError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
