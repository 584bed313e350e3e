//! Cache-aside store for upstream payloads.
//!
//! Values are serialized as JSON and kept in a pluggable [`CacheBackend`]
//! under a string key. Every value fetched with a conditional request has a
//! parallel ETag entry stored under `<key>_etag` (see [`etag_key`]).
//!
//! The cache is best-effort: [`CacheError`] never reaches the callers of
//! [`GitHubClient`](crate::GitHubClient). Fetchers log it and carry on as if
//! the entry were absent.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use starchart_github::{Cache, MemoryBackend, NoopMetrics};
//!
//! # async fn example() -> Result<(), starchart_github::CacheError> {
//! let cache = Cache::new(Arc::new(MemoryBackend::new()), Arc::new(NoopMetrics));
//!
//! cache.put("octocat/hello", &42_u64).await?;
//! let value: Option<u64> = cache.get("octocat/hello").await?;
//! assert_eq!(value, Some(42));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use starchart_config::CacheConfig;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::metrics::{MetricEvent, MetricsSink};

/// Suffix of the key holding the ETag of a cached value.
const ETAG_SUFFIX: &str = "_etag";

/// Errors raised by the cache layer.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backing store failed.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A value could not be encoded.
    #[error("failed to serialize cached value for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored payload could not be decoded.
    #[error("failed to deserialize cached value for {key}: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key of the ETag entry paired with `key`.
#[must_use]
pub fn etag_key(key: &str) -> String {
    format!("{key}{ETAG_SUFFIX}")
}

/// A key-value store holding opaque byte payloads.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the payload under `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Process-local backend.
///
/// Counts successful writes so that callers can observe whether a code path
/// touched the store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    writes: AtomicU64,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls served so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.write().await.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(feature = "redis")]
pub use self::redis_backend::RedisBackend;

#[cfg(feature = "redis")]
mod redis_backend {
    use async_trait::async_trait;
    use redis::AsyncCommands;
    use redis::aio::MultiplexedConnection;
    use tracing::info;

    use super::{CacheBackend, CacheError};

    /// Backend storing payloads in a Redis server.
    ///
    /// A single multiplexed connection is shared by all callers.
    #[derive(Clone)]
    pub struct RedisBackend {
        connection: MultiplexedConnection,
    }

    impl RedisBackend {
        /// Connects to the server at `url`.
        ///
        /// # Errors
        ///
        /// Returns [`CacheError::Backend`] if the URL is malformed or the
        /// server cannot be reached.
        pub async fn connect(url: &str) -> Result<Self, CacheError> {
            let client = redis::Client::open(url).map_err(backend_error)?;
            let connection = client
                .get_multiplexed_async_connection()
                .await
                .map_err(backend_error)?;
            info!("connected to redis cache");
            Ok(Self { connection })
        }
    }

    fn backend_error(err: redis::RedisError) -> CacheError {
        CacheError::Backend(err.to_string())
    }

    #[async_trait]
    impl CacheBackend for RedisBackend {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            let mut connection = self.connection.clone();
            connection.get(key).await.map_err(backend_error)
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
            let mut connection = self.connection.clone();
            connection
                .set::<_, _, ()>(key, value)
                .await
                .map_err(backend_error)
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            let mut connection = self.connection.clone();
            connection.del::<_, ()>(key).await.map_err(backend_error)
        }
    }
}

/// Typed cache over a [`CacheBackend`].
///
/// Cheap to clone; clones share the backend and the metrics sink.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    metrics: Arc<dyn MetricsSink>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { backend, metrics }
    }

    /// A cache over a fresh [`MemoryBackend`].
    pub fn in_memory(metrics: Arc<dyn MetricsSink>) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), metrics)
    }

    /// Reads and decodes the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the payload does not decode
    /// into `T`.
    #[instrument(level = "trace", skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(bytes) = self.backend.get(key).await? else {
            debug!(key, "cache miss");
            return Ok(None);
        };

        let value = serde_json::from_slice(&bytes).map_err(|source| CacheError::Deserialize {
            key: key.to_string(),
            source,
        })?;
        self.metrics.record(MetricEvent::CacheGet);
        debug!(key, "cache hit");
        Ok(Some(value))
    }

    /// Encodes `value` and stores it under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend fails.
    #[instrument(level = "trace", skip(self, value))]
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|source| CacheError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.put(key, bytes).await?;
        self.metrics.record(MetricEvent::CachePut);
        Ok(())
    }

    /// Removes the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    #[instrument(level = "trace", skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.backend.delete(key).await?;
        self.metrics.record(MetricEvent::CacheDelete);
        Ok(())
    }

    /// Reads `key`, logging and discarding any failure.
    pub(crate) async fn get_or_miss<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Writes `key`, logging and discarding any failure.
    pub(crate) async fn put_or_warn<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(err) = self.put(key, value).await {
            warn!(key, error = %err, "cache write failed");
        }
    }

    /// Deletes `key`, logging and discarding any failure.
    pub(crate) async fn delete_or_warn(&self, key: &str) {
        if let Err(err) = self.delete(key).await {
            warn!(key, error = %err, "cache delete failed");
        }
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

/// Builds the cache described by `config`.
///
/// A configured Redis URL is used when the `redis` feature is enabled and
/// the server is reachable; otherwise the cache falls back to memory.
pub async fn connect_cache(config: &CacheConfig, metrics: Arc<dyn MetricsSink>) -> Cache {
    let Some(url) = config.redis_url.as_deref() else {
        debug!("no redis url configured, using in-memory cache");
        return Cache::in_memory(metrics);
    };

    #[cfg(feature = "redis")]
    {
        match RedisBackend::connect(url).await {
            Ok(backend) => return Cache::new(Arc::new(backend), metrics),
            Err(err) => warn!(error = %err, "redis unavailable, using in-memory cache"),
        }
    }

    #[cfg(not(feature = "redis"))]
    warn!(url, "built without redis support, using in-memory cache");

    Cache::in_memory(metrics)
}
