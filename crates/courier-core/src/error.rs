//! Error types for the Courier core library
//!
//! Errors in this crate never reach the caller of
//! [`Orchestrator::execute`](crate::Orchestrator::execute); they are raised by
//! collaborators (stores, artifact loading, configuration) and converted into
//! classified response envelopes at the orchestrator boundary.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Main error type for Courier operations
#[derive(Error, Debug)]
pub enum Error {
    /// Operation configuration could not be resolved
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The operations file is unreadable or does not describe the operation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A rule-set or mock artifact could not be loaded
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// A shared store failed to read or write
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error without a source
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error stems from local configuration (artifacts, options)
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. } | Error::Config(_) | Error::Artifact(_))
    }
}

/// Errors raised while loading an operations file or resolving options from it
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown provider '{provider}'")]
    UnknownProvider { provider: String },

    #[error("Unknown service '{service}' for provider '{provider}'")]
    UnknownService { provider: String, service: String },

    #[error("Unknown endpoint '{endpoint}' in {provider}.{service}")]
    UnknownEndpoint {
        provider: String,
        service: String,
        endpoint: String,
    },

    #[error("Operation '{operation}' has no base-url")]
    MissingBaseUrl { operation: String },

    #[error("Operation '{operation}' has an empty cache-scope")]
    InvalidScope { operation: String },

    #[error("Unknown HTTP method '{method}'")]
    InvalidMethod { method: String },

    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Unsupported config file format: '{}'", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Errors raised while locating or parsing named artifacts
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// No file with the artifact name exists in any search location
    #[error("Artifact '{name}' not found (searched: {searched})")]
    NotFound { name: String, searched: String },

    /// More than one file answers to the artifact name
    #[error("Artifact '{name}' is ambiguous: {}", join_paths(.paths))]
    Duplicate { name: String, paths: Vec<PathBuf> },

    /// The artifact file could not be read
    #[error("Failed to read artifact '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact file is not valid JSON/YAML or has the wrong shape
    #[error("Failed to parse artifact '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by a [`Store`](crate::store::Store) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store lock was poisoned by a panicking writer
    #[error("Store '{store}' is unavailable: lock poisoned")]
    Poisoned { store: String },

    /// Backend-specific failure
    #[error("Store '{store}' failed: {reason}")]
    Backend { store: String, reason: String },
}

/// Severity levels for log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail
    Debug,
    /// Informational, no action required
    Info,
    /// Degraded but expected, should be reviewed
    Warning,
    /// Request failed
    Error,
    /// Request failed because the engine itself is broken
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Debug => write!(f, "debug"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
