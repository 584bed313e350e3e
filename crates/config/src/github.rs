//! GitHub API settings.
//!
//! This module provides the [`GitHubConfig`] type which controls how the
//! fetching core talks to the GitHub REST API: which tokens it rotates
//! through, how large each stargazer page is, and how much of a token's
//! quota may be used before the token is skipped.
//!
//! # Rate Limits
//!
//! Each authenticated token allows 5,000 requests per hour. Rotating through
//! several tokens multiplies that budget; `max_rate_usage_pct` keeps a
//! reserve on every token so that no single one is drained.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default base URL of the GitHub REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default number of stargazers requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page size GitHub accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default share of a token's quota that may be consumed before it is skipped.
pub const DEFAULT_MAX_RATE_USAGE_PCT: u8 = 80;

/// GitHub refuses to list stargazers beyond this many pages.
pub const DEFAULT_MAX_PAGES: u32 = 400;

/// Default timeout for a single outbound request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the GitHub API client.
///
/// # Examples
///
/// ```
/// use starchart_config::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.page_size, 100);
/// assert_eq!(config.max_rate_usage_pct, 80);
/// assert!(config.tokens.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access tokens rotated round-robin.
    ///
    /// When empty, all requests are sent unauthenticated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,

    /// Stargazers requested per page (1..=100).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum share of a token's quota, in percent, that may be used.
    ///
    /// A token whose usage is at or above this value is skipped until its
    /// quota resets.
    #[serde(default = "default_max_rate_usage_pct")]
    pub max_rate_usage_pct: u8,

    /// Repositories needing more pages than this are refused up front.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Base URL of the REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout for a single outbound request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_rate_usage_pct() -> u8 {
    DEFAULT_MAX_RATE_USAGE_PCT
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            max_rate_usage_pct: DEFAULT_MAX_RATE_USAGE_PCT,
            max_pages: DEFAULT_MAX_PAGES,
            api_base_url: default_api_base_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GitHubConfig {
    /// Creates a configuration with the given tokens and default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use starchart_config::GitHubConfig;
    ///
    /// let config = GitHubConfig::with_tokens(["ghp_a", "ghp_b"]);
    /// assert_eq!(config.tokens.len(), 2);
    /// ```
    #[must_use]
    pub fn with_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns whether any token is configured.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Validates that all settings are within their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending setting.
    ///
    /// # Examples
    ///
    /// ```
    /// use starchart_config::GitHubConfig;
    ///
    /// let mut config = GitHubConfig::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.page_size = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::Invalid {
                field: "github.page_size",
                reason: format!("{} is not between 1 and {MAX_PAGE_SIZE}", self.page_size),
            });
        }
        if !(1..=100).contains(&self.max_rate_usage_pct) {
            return Err(ConfigError::Invalid {
                field: "github.max_rate_usage_pct",
                reason: format!("{} is not between 1 and 100", self.max_rate_usage_pct),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid {
                field: "github.max_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "github.api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "github.request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
