//! Common types and utilities for kc-drv commands.
//!
//! This module provides shared types, constants, and utility functions
//! used across all command implementations to ensure consistency.

use std::path::{Path, PathBuf};

use crate::error::{DrvError, Result};

// ============================================================================
// Path Utilities
// ============================================================================

/// Sanitize a user-provided path to prevent path traversal attacks.
///
/// Ensures the resolved path is within the current working directory
/// or an allowed base directory.
///
/// # Security
/// This function protects against:
/// - Directory traversal using `..` components
/// - Symbolic link attacks
/// - Absolute path injection
#[allow(dead_code)]
pub fn sanitize_path(path: &Path, base_dir: Option<&Path>) -> Result<PathBuf> {
    let base = base_dir.unwrap_or_else(|| Path::new("."));
    let base_canonical = base
        .canonicalize()
        .map_err(|e| DrvError::Validation(format!("invalid base directory: {}", e)))?;

    let path_canonical = path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, resolve relative to base
        base.join(path).to_path_buf()
    });

    if !path_canonical.starts_with(&base_canonical) {
        return Err(DrvError::Validation(
            "path traversal detected: path must be within current directory".to_string(),
        ));
    }

    Ok(path_canonical)
}

// ============================================================================
// Error Messages
// ============================================================================

/// Standard error message templates.
pub mod error_messages {
    /// Error when target path is not a directory.
    pub const TARGET_NOT_DIR: &str = "Target path is not a directory:";

    /// Error when directory is not empty.
    pub const DIR_NOT_EMPTY: &str = "Directory is not empty:";

    /// Error when a fixture path does not exist.
    pub const FIXTURE_NOT_FOUND: &str = "Fixture file not found:";
}

// ============================================================================
// Output Messages
// ============================================================================

/// Standard output message templates.
pub mod output_messages {
    /// Message when a directory is created.
    pub const CREATED_DIR: &str = "✅ Created directory:";

    /// Message when a file is created.
    pub const CREATED_FILE: &str = "✅ Created file:";

    /// Message when analysis of a fixture begins.
    pub const ANALYZING: &str = "🔎 Analysing:";
}
