//! Cache backing store settings.

use serde::{Deserialize, Serialize};

/// Configuration for the cache-aside store.
///
/// When no Redis URL is configured, an in-process memory cache is used.
///
/// # Examples
///
/// ```
/// use starchart_config::CacheConfig;
///
/// let config = CacheConfig::default();
/// assert!(config.redis_url.is_none());
///
/// let config = CacheConfig::redis("redis://localhost:6379");
/// assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Connection URL of a Redis server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
}

impl CacheConfig {
    /// Creates a configuration backed by the Redis server at `url`.
    #[must_use]
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            redis_url: Some(url.into()),
        }
    }
}
