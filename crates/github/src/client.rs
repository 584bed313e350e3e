//! GitHub API client implementation.
//!
//! This module provides the [`GitHubClient`] struct, the entry point of the
//! crate. It wires the token pool, the rate-limit guard, the dispatcher and
//! the cache together; the fetch operations themselves live in
//! [`repository`](crate::repository) and [`stargazers`](crate::stargazers).

use std::sync::Arc;
use std::time::Duration;

use starchart_config::{GitHubConfig, MAX_PAGE_SIZE};
use tracing::{debug, instrument};

use crate::cache::Cache;
use crate::conditional::ConditionalFetcher;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::metrics::MetricsSink;
use crate::rate_limit::RateLimitGuard;
use crate::tokens::TokenPool;

/// GitHub API client rotating through a pool of tokens.
///
/// Without tokens every request is sent unauthenticated, which GitHub limits
/// to 60 requests per hour. Each token raises that budget by 5,000.
///
/// The client is cheap to clone; clones share the token pool, the cache and
/// the metrics sink.
///
/// # Security
///
/// Tokens are stored using [`secrecy::SecretString`] and only their last
/// three characters ever appear in logs.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use starchart_config::GitHubConfig;
/// use starchart_github::{Cache, GitHubClient, NoopMetrics};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> starchart_github::Result<()> {
/// let metrics = Arc::new(NoopMetrics);
/// let config = GitHubConfig::with_tokens(["ghp_your_token"]);
/// let client = GitHubClient::from_config(&config, Cache::in_memory(metrics.clone()), metrics)?;
///
/// let cancel = CancellationToken::new();
/// let repo = client.fetch_repository(&cancel, "rust-lang/rust").await?;
/// let stars = client.fetch_stargazers(&cancel, &repo).await?;
/// println!("{} has {} stars", repo.full_name, stars.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) fetcher: ConditionalFetcher,
    pub(crate) page_size: u32,
    pub(crate) max_pages: u32,
    pub(crate) api_base_url: String,
}

impl GitHubClient {
    /// Creates a client sending requests through `transport`.
    ///
    /// The page size is clamped to `1..=MAX_PAGE_SIZE`, so an unvalidated
    /// config still plans and requests pages of the same size.
    #[instrument(skip_all, fields(tokens = config.tokens.len(), base = %config.api_base_url))]
    pub fn new(
        config: &GitHubConfig,
        transport: Arc<dyn HttpTransport>,
        cache: Cache,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        let pool = TokenPool::new(config.tokens.iter().cloned(), metrics.clone());
        let guard = RateLimitGuard::new(
            transport.clone(),
            &api_base_url,
            config.max_rate_usage_pct,
            metrics.clone(),
        );
        let dispatcher = Dispatcher::new(transport, pool, guard);
        debug!("github client created");

        Self {
            inner: Arc::new(ClientInner {
                fetcher: ConditionalFetcher::new(dispatcher, cache, metrics),
                page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
                max_pages: config.max_pages,
                api_base_url,
            }),
        }
    }

    /// Creates a client backed by a [`ReqwestTransport`] using the
    /// configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn from_config(
        config: &GitHubConfig,
        cache: Cache,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        let transport =
            ReqwestTransport::with_timeout(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(config, Arc::new(transport), cache, metrics))
    }

    /// Returns whether any token is configured.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.pool().is_empty()
    }

    /// Number of configured tokens, valid or not.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.pool().len()
    }

    /// Number of tokens that have not been invalidated.
    #[must_use]
    pub fn valid_token_count(&self) -> usize {
        self.pool().valid_count()
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    fn pool(&self) -> &TokenPool {
        self.inner.fetcher.dispatcher().pool()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base_url)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("tokens", &self.token_count())
            .field("valid_tokens", &self.valid_token_count())
            .field("page_size", &self.inner.page_size)
            .field("api_base_url", &self.inner.api_base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTransport;
    use crate::metrics::{NoopMetrics, RecordingMetrics};

    fn client(config: &GitHubConfig) -> GitHubClient {
        let metrics = Arc::new(NoopMetrics);
        GitHubClient::new(
            config,
            Arc::new(MockTransport::new()),
            Cache::in_memory(metrics.clone()),
            metrics,
        )
    }

    #[test]
    fn unauthenticated_without_tokens() {
        let client = client(&GitHubConfig::default());
        assert!(!client.is_authenticated());
        assert_eq!(client.token_count(), 0);
    }

    #[test]
    fn counts_configured_tokens() {
        let client = client(&GitHubConfig::with_tokens(["a", "b", "c"]));
        assert!(client.is_authenticated());
        assert_eq!(client.token_count(), 3);
        assert_eq!(client.valid_token_count(), 3);
    }

    #[test]
    fn reports_available_tokens_on_creation() {
        let metrics = Arc::new(RecordingMetrics::new());
        let _client = GitHubClient::new(
            &GitHubConfig::with_tokens(["a", "b"]),
            Arc::new(MockTransport::new()),
            Cache::in_memory(metrics.clone()),
            metrics.clone(),
        );
        assert_eq!(metrics.snapshot().available_tokens, Some(2));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let config = GitHubConfig {
            api_base_url: "https://ghe.example.com/api/v3/".to_string(),
            ..GitHubConfig::default()
        };
        let client = client(&config);
        assert_eq!(
            client.url("/repos/o/r"),
            "https://ghe.example.com/api/v3/repos/o/r"
        );
    }

    #[test]
    fn debug_hides_tokens() {
        let client = client(&GitHubConfig::with_tokens(["ghp_topsecret"]));
        let debug = format!("{client:?}");
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("tokens: 1"));
    }

    #[test]
    fn from_config_builds_reqwest_client() {
        let metrics = Arc::new(NoopMetrics);
        let client = GitHubClient::from_config(
            &GitHubConfig::default(),
            Cache::in_memory(metrics.clone()),
            metrics,
        )
        .expect("client should build");
        assert_eq!(client.page_size(), 100);
    }

    #[test]
    fn out_of_range_page_size_is_clamped() {
        let zero = GitHubConfig {
            page_size: 0,
            ..GitHubConfig::default()
        };
        assert_eq!(client(&zero).page_size(), 1);

        let huge = GitHubConfig {
            page_size: 1_000,
            ..GitHubConfig::default()
        };
        assert_eq!(client(&huge).page_size(), MAX_PAGE_SIZE);
    }
}
