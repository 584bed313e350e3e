//! Injected observability sink.
//!
//! Components never touch process-wide counters. Each one holds an
//! `Arc<dyn MetricsSink>` and reports a [`MetricEvent`] whenever something
//! worth counting happens; the application decides where events go.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::trace;

/// Something a component wants counted or gauged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricEvent<'a> {
    /// A cache read returned a value.
    CacheGet,
    /// A cache write succeeded.
    CachePut,
    /// A cache delete succeeded.
    CacheDelete,
    /// GitHub answered 403 to a data request.
    RateLimitHit,
    /// A conditional request was answered 304.
    EffectiveEtag,
    /// A token was permanently invalidated.
    TokenInvalidated,
    /// Number of tokens still usable.
    AvailableTokens(usize),
    /// Quota left on a token, labelled by its redacted form.
    RateRemaining { token: &'a str, remaining: u64 },
}

/// Receives metric events from the fetching core.
pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _event: MetricEvent<'_>) {}
}

/// Emits every event as a `tracing` event on the `starchart::metrics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record(&self, event: MetricEvent<'_>) {
        match event {
            MetricEvent::AvailableTokens(count) => {
                trace!(target: "starchart::metrics", gauge = "available_tokens", value = count);
            }
            MetricEvent::RateRemaining { token, remaining } => {
                trace!(target: "starchart::metrics", gauge = "rate_limit_remaining", token, value = remaining);
            }
            counter => {
                trace!(target: "starchart::metrics", counter = ?counter, "increment");
            }
        }
    }
}

/// Counter values captured by [`RecordingMetrics::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricCounts {
    pub cache_gets: u64,
    pub cache_puts: u64,
    pub cache_deletes: u64,
    pub rate_limit_hits: u64,
    pub effective_etags: u64,
    pub tokens_invalidated: u64,
    pub available_tokens: Option<usize>,
}

/// Keeps every event in memory so that it can be inspected.
#[derive(Default)]
pub struct RecordingMetrics {
    cache_gets: AtomicU64,
    cache_puts: AtomicU64,
    cache_deletes: AtomicU64,
    rate_limit_hits: AtomicU64,
    effective_etags: AtomicU64,
    tokens_invalidated: AtomicU64,
    available_tokens: AtomicUsize,
    available_reported: AtomicU64,
    rate_remaining: Mutex<HashMap<String, u64>>,
}

impl RecordingMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricCounts {
        MetricCounts {
            cache_gets: self.cache_gets.load(Ordering::Relaxed),
            cache_puts: self.cache_puts.load(Ordering::Relaxed),
            cache_deletes: self.cache_deletes.load(Ordering::Relaxed),
            rate_limit_hits: self.rate_limit_hits.load(Ordering::Relaxed),
            effective_etags: self.effective_etags.load(Ordering::Relaxed),
            tokens_invalidated: self.tokens_invalidated.load(Ordering::Relaxed),
            available_tokens: (self.available_reported.load(Ordering::Relaxed) > 0)
                .then(|| self.available_tokens.load(Ordering::Relaxed)),
        }
    }

    /// Last remaining quota reported for a redacted token.
    #[must_use]
    pub fn rate_remaining(&self, token: &str) -> Option<u64> {
        self.rate_remaining
            .lock()
            .ok()
            .and_then(|gauges| gauges.get(token).copied())
    }
}

impl fmt::Debug for RecordingMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingMetrics")
            .field("counts", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, event: MetricEvent<'_>) {
        let counter = match event {
            MetricEvent::CacheGet => &self.cache_gets,
            MetricEvent::CachePut => &self.cache_puts,
            MetricEvent::CacheDelete => &self.cache_deletes,
            MetricEvent::RateLimitHit => &self.rate_limit_hits,
            MetricEvent::EffectiveEtag => &self.effective_etags,
            MetricEvent::TokenInvalidated => &self.tokens_invalidated,
            MetricEvent::AvailableTokens(count) => {
                self.available_tokens.store(count, Ordering::Relaxed);
                &self.available_reported
            }
            MetricEvent::RateRemaining { token, remaining } => {
                if let Ok(mut gauges) = self.rate_remaining.lock() {
                    gauges.insert(token.to_string(), remaining);
                }
                return;
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_counts_each_event() {
        let metrics = RecordingMetrics::new();
        metrics.record(MetricEvent::CacheGet);
        metrics.record(MetricEvent::CacheGet);
        metrics.record(MetricEvent::CachePut);
        metrics.record(MetricEvent::RateLimitHit);
        metrics.record(MetricEvent::TokenInvalidated);

        let counts = metrics.snapshot();
        assert_eq!(counts.cache_gets, 2);
        assert_eq!(counts.cache_puts, 1);
        assert_eq!(counts.cache_deletes, 0);
        assert_eq!(counts.rate_limit_hits, 1);
        assert_eq!(counts.tokens_invalidated, 1);
        assert_eq!(counts.available_tokens, None);
    }

    #[test]
    fn recording_keeps_latest_gauges() {
        let metrics = RecordingMetrics::new();
        metrics.record(MetricEvent::AvailableTokens(3));
        metrics.record(MetricEvent::AvailableTokens(2));
        metrics.record(MetricEvent::RateRemaining {
            token: "...abc",
            remaining: 4000,
        });
        metrics.record(MetricEvent::RateRemaining {
            token: "...abc",
            remaining: 3999,
        });

        assert_eq!(metrics.snapshot().available_tokens, Some(2));
        assert_eq!(metrics.rate_remaining("...abc"), Some(3999));
        assert_eq!(metrics.rate_remaining("...xyz"), None);
    }

    #[test]
    fn noop_and_tracing_accept_everything() {
        for sink in [&NoopMetrics as &dyn MetricsSink, &TracingMetrics] {
            sink.record(MetricEvent::EffectiveEtag);
            sink.record(MetricEvent::AvailableTokens(1));
            sink.record(MetricEvent::RateRemaining {
                token: "...zzz",
                remaining: 1,
            });
        }
    }
}
