//! Environment variable overrides.
//!
//! Deployments typically provision tokens through the environment rather
//! than through a config file. The following variables are recognized:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `GITHUB_TOKENS` | `github.tokens` (comma separated) |
//! | `GITHUB_PAGE_SIZE` | `github.page_size` |
//! | `GITHUB_MAX_RATE_LIMIT_USAGE` | `github.max_rate_usage_pct` |
//! | `GITHUB_MAX_PAGES` | `github.max_pages` |
//! | `GITHUB_API_URL` | `github.api_base_url` |
//! | `REDIS_URL` | `cache.redis_url` |

use std::str::FromStr;

use tracing::debug;

use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Comma separated list of GitHub tokens.
pub const GITHUB_TOKENS: &str = "GITHUB_TOKENS";
/// Stargazers per page.
pub const GITHUB_PAGE_SIZE: &str = "GITHUB_PAGE_SIZE";
/// Maximum token quota usage, in percent.
pub const GITHUB_MAX_RATE_LIMIT_USAGE: &str = "GITHUB_MAX_RATE_LIMIT_USAGE";
/// Maximum number of stargazer pages.
pub const GITHUB_MAX_PAGES: &str = "GITHUB_MAX_PAGES";
/// Base URL of the REST API.
pub const GITHUB_API_URL: &str = "GITHUB_API_URL";
/// Redis connection URL.
pub const REDIS_URL: &str = "REDIS_URL";

/// Applies overrides from the process environment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] if a numeric variable cannot be parsed.
pub fn apply_env(config: &mut Config) -> Result<()> {
    apply_env_from(config, |name| std::env::var(name).ok())
}

/// Applies overrides using `lookup` to resolve variable names.
///
/// Unset and blank variables leave the corresponding setting untouched.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] if a numeric variable cannot be parsed.
///
/// # Examples
///
/// ```
/// use starchart_config::{Config, env::apply_env_from};
///
/// let mut config = Config::default();
/// apply_env_from(&mut config, |name| match name {
///     "GITHUB_TOKENS" => Some("ghp_a, ghp_b".to_string()),
///     "GITHUB_PAGE_SIZE" => Some("50".to_string()),
///     _ => None,
/// })
/// .unwrap();
///
/// assert_eq!(config.github.tokens, vec!["ghp_a", "ghp_b"]);
/// assert_eq!(config.github.page_size, 50);
/// ```
pub fn apply_env_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(raw) = lookup(GITHUB_TOKENS) {
        config.github.tokens = parse_tokens(&raw);
        debug!(count = config.github.tokens.len(), "tokens loaded from environment");
    }
    if let Some(raw) = lookup(GITHUB_PAGE_SIZE) {
        config.github.page_size = parse_number(GITHUB_PAGE_SIZE, &raw)?;
    }
    if let Some(raw) = lookup(GITHUB_MAX_RATE_LIMIT_USAGE) {
        config.github.max_rate_usage_pct = parse_number(GITHUB_MAX_RATE_LIMIT_USAGE, &raw)?;
    }
    if let Some(raw) = lookup(GITHUB_MAX_PAGES) {
        config.github.max_pages = parse_number(GITHUB_MAX_PAGES, &raw)?;
    }
    if let Some(raw) = lookup(GITHUB_API_URL) {
        config.github.api_base_url = raw.trim().trim_end_matches('/').to_string();
    }
    if let Some(raw) = lookup(REDIS_URL) {
        config.cache.redis_url = Some(raw.trim().to_string());
    }

    Ok(())
}

/// Splits a comma separated token list, dropping blank entries.
fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_number<T: FromStr>(var: &'static str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: raw.to_string(),
    })
}
