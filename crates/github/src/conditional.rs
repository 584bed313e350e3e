//! ETag-conditional cache-aside fetch.
//!
//! Both the repository and the stargazer page fetches run the same state
//! machine, keyed by a cache key:
//!
//! - the cached ETag, if any, is sent as `If-None-Match`;
//! - `304` serves the cached payload; if that payload is gone, the stale
//!   ETag is deleted and the request is sent once more without it;
//! - `403` means the quota is exhausted and nothing is cached;
//! - `200` is decoded and cached together with its new ETag;
//! - anything else is an upstream failure carrying the raw body.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use starchart_protocol::{Repository, StarEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::cache::{Cache, etag_key};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::http::HttpRequest;
use crate::metrics::{MetricEvent, MetricsSink};

/// Requests sent per conditional fetch: the first try plus one after a
/// stale ETag was dropped.
pub const MAX_CONDITIONAL_ATTEMPTS: usize = 2;

/// A payload that can be fetched conditionally and cached.
pub trait Cacheable: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Whether this payload marks the end of the data.
    ///
    /// Terminal payloads are neither cached nor returned.
    fn is_terminal(&self) -> bool {
        false
    }
}

impl Cacheable for Repository {}

impl Cacheable for Vec<StarEvent> {
    fn is_terminal(&self) -> bool {
        self.is_empty()
    }
}

/// Runs conditional requests through a [`Dispatcher`] and a [`Cache`].
pub struct ConditionalFetcher {
    dispatcher: Dispatcher,
    cache: Cache,
    metrics: Arc<dyn MetricsSink>,
}

impl ConditionalFetcher {
    pub fn new(dispatcher: Dispatcher, cache: Cache, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            dispatcher,
            cache,
            metrics,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Fetches `request`, serving and refreshing the entry under `key`.
    ///
    /// Returns `Ok(None)` when the upstream answers with a terminal payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimited`] on `403`, [`Error::UpstreamApi`] on any
    /// other unexpected status, and any error raised by the dispatcher.
    #[instrument(skip(self, request, cancel), fields(url = %request.url))]
    pub async fn fetch<T: Cacheable>(
        &self,
        key: &str,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<T>> {
        let etag_key = etag_key(key);

        for attempt in 0..MAX_CONDITIONAL_ATTEMPTS {
            let etag: Option<String> = self.cache.get_or_miss(&etag_key).await;
            let mut conditional = request.clone();
            if let Some(etag) = etag.filter(|etag| !etag.is_empty()) {
                conditional = conditional.with_header("If-None-Match", etag);
            }

            let response = self.dispatcher.send(conditional, cancel).await?;
            match response.status {
                304 => {
                    self.metrics.record(MetricEvent::EffectiveEtag);
                    if let Some(value) = self.cache.get_or_miss::<T>(key).await {
                        debug!(key, "not modified, serving cached payload");
                        return Ok(Some(value));
                    }
                    warn!(key, attempt, "not modified but cached payload is missing, dropping etag");
                    self.cache.delete_or_warn(&etag_key).await;
                }
                403 => {
                    self.metrics.record(MetricEvent::RateLimitHit);
                    warn!(key, "rate limited by upstream");
                    return Err(Error::RateLimited);
                }
                200 => {
                    let value: T = serde_json::from_slice(&response.body)?;
                    if value.is_terminal() {
                        debug!(key, "terminal payload, nothing to cache");
                        return Ok(None);
                    }

                    self.cache.put_or_warn(key, &value).await;
                    if let Some(etag) = response.header("etag").filter(|etag| !etag.is_empty()) {
                        self.cache.put_or_warn(&etag_key, etag).await;
                    }
                    debug!(key, "fetched fresh payload");
                    return Ok(Some(value));
                }
                status => {
                    return Err(Error::UpstreamApi {
                        status,
                        body: response.body_text(),
                    });
                }
            }
        }

        Err(Error::UpstreamApi {
            status: 304,
            body: "not modified but no cached payload".to_string(),
        })
    }
}
