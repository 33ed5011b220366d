//! Error handling module for the kc-drv CLI.
//!
//! This module provides custom error types using `thiserror` for structured
//! error handling throughout the application.

use kc_sem::SemaError;
use thiserror::Error;

/// Main error type for the kc-drv CLI application.
#[derive(Error, Debug)]
pub enum DrvError {
    /// Error when a required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error when the fixture notation can't be parsed or references an
    /// unknown operator/shape.
    #[error("fixture error: {0}")]
    Fixture(String),

    /// Error when a command's own validation fails (bad paths, bad flags).
    #[error("validation error: {0}")]
    Validation(String),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when JSON (fixture) deserialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The analyser rejected the fixture expression.
    #[error("analysis failed: {0}")]
    Analysis(#[from] SemaError),
}

/// Result type alias using DrvError.
pub type Result<T> = std::result::Result<T, DrvError>;
