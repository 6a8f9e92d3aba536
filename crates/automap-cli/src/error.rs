//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from automap-core library
    #[error("Mapping error: {0}")]
    Core(#[from] automap_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} ({})", path.display(), expected, message)]
    InvalidFormat {
        path: PathBuf,
        expected: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use automap_core::ShapeId;

    #[test]
    fn test_exit_codes() {
        let core = Error::from(automap_core::Error::UnknownShape {
            name: "Ghost".to_string(),
        });
        assert_eq!(core.exit_code(), 2);
        assert_eq!(Error::config("bad").exit_code(), 5);
        assert_eq!(
            Error::FileNotFound {
                path: PathBuf::from("missing.json")
            }
            .exit_code(),
            3
        );
        assert!(Error::invalid_args("--target").should_show_help());
        assert!(!Error::other("boom").should_show_help());
    }

    #[test]
    fn test_format_error_without_color() {
        let error = Error::from(automap_core::Error::NoMappingFound {
            source_shape: ShapeId::Map,
            target_shape: ShapeId::Dynamic,
            reason: "both shapes are generic".to_string(),
        });
        let formatted = format_error(&error, false);
        assert!(formatted.starts_with("Error: Mapping error: No mapping found from map to dynamic"));
    }
}
