//! Error types for configuration operations.
//!
//! This module defines the error types that can occur during configuration
//! loading, parsing, and validation.

use std::path::PathBuf;

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a configuration file.
    #[error("failed to write config file at {path}: {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON5 configuration.
    #[error("failed to parse config: {0}")]
    ParseJson5(#[from] serde_json5::Error),

    /// Failed to parse or serialize strict JSON configuration.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The raw value found.
        value: String,
    },

    /// A setting is outside its accepted range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// The offending setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_env() {
        let err = ConfigError::InvalidEnv {
            var: "GITHUB_PAGE_SIZE",
            value: "lots".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for GITHUB_PAGE_SIZE: \"lots\"");
    }

    #[test]
    fn display_invalid_setting() {
        let err = ConfigError::Invalid {
            field: "github.page_size",
            reason: "must be between 1 and 100".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid github.page_size: must be between 1 and 100"
        );
    }
}
