//! Server error types.

use std::io;
use std::path::PathBuf;

use calcast_core::CoreError;
use calcast_providers::ProviderError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that end a run or prevent startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The configuration file could not be read or parsed.
    #[error("Failed to load config from {}: {message}", path.display())]
    ConfigFile { path: PathBuf, message: String },

    /// Fetching the calendar failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[source] ProviderError),

    /// The calendar could not be resolved into occurrences.
    #[error("Resolve failed: {0}")]
    Resolve(#[from] CoreError),

    /// Publishing the digest failed.
    #[error("Publish failed: {0}")]
    Publish(#[source] ProviderError),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a config file error.
    pub fn config_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error means the process cannot start.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::ConfigFile { .. })
    }
}
