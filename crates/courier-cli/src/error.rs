//! Error types and handling for the CLI
//!
//! Classified request failures are not errors here: they are printed as
//! envelopes. These errors cover everything before or around a request.

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

    /// Error from courier-core library
    #[error("Core error: {0}")]
    Core(#[from] courier_core::Error),

    /// Operations file problem
    #[error("Configuration error: {0}")]
    Config(#[from] courier_core::ConfigError),

    /// No operations file was given and none exists in the default locations
    #[error("No operations file found (searched: {})", join_paths(.searched))]
    ConfigNotFound { searched: Vec<PathBuf> },

    /// Invalid argument value
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
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
    ///
    /// 1 is reserved for a request that ran but did not succeed.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 2,
            Self::Core(_) => 3,
            Self::Config(_) | Self::ConfigNotFound { .. } => 5,
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

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::other(format!("{:#}", err))
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

    #[test]
    fn test_exit_codes_never_collide_with_request_failure() {
        let errors = [
            Error::invalid_args("bad"),
            Error::other("boom"),
            Error::ConfigNotFound { searched: vec![PathBuf::from("a.toml")] },
        ];
        for error in errors {
            assert_ne!(error.exit_code(), 0);
            assert_ne!(error.exit_code(), 1);
        }
    }

    #[test]
    fn test_format_error_without_color() {
        let formatted = format_error(&Error::invalid_args("--body is not JSON"), false);
        assert_eq!(formatted, "Error: Invalid arguments: --body is not JSON");
        assert!(Error::invalid_args("x").should_show_help());
    }
}
