//! Core configuration struct and loading logic.
//!
//! This module provides the main [`Config`] struct which aggregates all
//! configuration options for the starchart application.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheConfig;
use crate::env::apply_env;
use crate::error::Result;
use crate::github::GitHubConfig;
use crate::persistence::{find_config_file, read_config_file, write_config_file};

/// The main configuration struct for the starchart application.
///
/// # Examples
///
/// ```
/// use starchart_config::{CacheConfig, Config, GitHubConfig};
///
/// // Create a default config
/// let config = Config::default();
/// assert!(config.github.tokens.is_empty());
///
/// // Create a custom config
/// let config = Config {
///     github: GitHubConfig::with_tokens(["ghp_xxx"]),
///     cache: CacheConfig::redis("redis://localhost:6379"),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Cache backing store settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new default configuration.
    ///
    /// This is equivalent to `Config::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the default file locations and environment.
    ///
    /// Searches for configuration files in the following order:
    ///
    /// 1. Local: `./starchart.json5` or `./starchart.json`
    /// 2. User: `~/.config/starchart/config.json5` or `~/.config/starchart/config.json`
    ///
    /// If no configuration file is found, defaults are used. Environment
    /// variables are applied on top, then the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is found but cannot be
    /// read or parsed, if an environment variable is malformed, or if the
    /// final configuration is invalid.
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                read_config_file(&path)?
            }
            None => Self::default(),
        };
        apply_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific file, then applies the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config: Config = read_config_file(path)?;
        apply_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a specific file, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use starchart_config::Config;
    ///
    /// # fn example() -> starchart_config::Result<()> {
    /// let config = Config::load_from("custom-config.json5")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Config = read_config_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        write_config_file(path, self)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<()> {
        self.github.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.github.tokens.is_empty());
        assert!(config.cache.redis_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn new_config() {
        assert_eq!(Config::new(), Config::default());
    }

    #[test]
    fn validate_invalid_page_size() {
        let config = Config {
            github: GitHubConfig {
                page_size: 500,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn deserialize_partial() {
        let json = r#"{"github": {"tokens": ["a", "b"]}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.github.tokens, vec!["a", "b"]);
        assert_eq!(config.github.page_size, 100);
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("starchart.json5");
        std::fs::write(
            &path,
            r#"
            {
                github: {
                    tokens: ["ghp_one", "ghp_two"],
                    page_size: 50,
                    max_rate_usage_pct: 70,
                },
                cache: { redis_url: "redis://localhost:6379" },
            }
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.github.tokens, vec!["ghp_one", "ghp_two"]);
        assert_eq!(config.github.page_size, 50);
        assert_eq!(config.github.max_rate_usage_pct, 70);
        assert_eq!(config.github.max_pages, 400);
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://localhost:6379")
        );
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("starchart.json");
        std::fs::write(&path, r#"{"github": {"max_rate_usage_pct": 0}}"#).unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let original = Config {
            github: GitHubConfig::with_tokens(["ghp_xxx"]),
            cache: CacheConfig::redis("redis://cache:6379"),
        };

        original.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn redis_url_not_serialized_when_none() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(!json.contains("redis_url"));
    }
}
