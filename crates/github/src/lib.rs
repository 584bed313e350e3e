//! GitHub API core for starchart.
//!
//! This crate fetches repository details and complete stargazer timelines
//! from the GitHub REST API while spreading the load over a pool of tokens
//! and avoiding redundant transfers with ETag-conditional requests.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - [`GitHubClient`]: The entry point, exposing
//!   [`fetch_repository`](GitHubClient::fetch_repository) and
//!   [`fetch_stargazers`](GitHubClient::fetch_stargazers)
//! - [`TokenPool`]: Round-robin token rotation with permanent invalidation
//! - [`RateLimitGuard`]: Per-request quota check on the picked token
//! - [`Dispatcher`]: Token selection, guard checks and bounded retry
//! - [`Cache`] and [`CacheBackend`]: Best-effort cache-aside storage
//! - [`HttpTransport`]: The HTTP boundary, implemented by [`ReqwestTransport`]
//! - [`MetricsSink`]: Injected counters and gauges
//! - [`Error`]: Error types for GitHub API operations
//!
//! # Authentication
//!
//! Each token allows 5,000 requests per hour; unauthenticated access is
//! limited to 60. Before a token is used, its remaining quota is checked and
//! the token is skipped when more than the configured share is already
//! consumed. Tokens rejected by GitHub are invalidated for the lifetime of
//! the process.
//!
//! Tokens are handled using [`secrecy::SecretString`] to prevent accidental
//! logging of credentials.
//!
//! # Caching
//!
//! Every response body is cached under a key derived from the request
//! (`owner/name` for repositories, `owner/name_<page>` for stargazer pages)
//! along with its ETag. Cache failures are logged and otherwise ignored.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use starchart_config::Config;
//! use starchart_github::{GitHubClient, TracingMetrics, connect_cache};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let metrics = Arc::new(TracingMetrics);
//! let cache = connect_cache(&config.cache, metrics.clone()).await;
//! let client = GitHubClient::from_config(&config.github, cache, metrics)?;
//!
//! let cancel = CancellationToken::new();
//! let repo = client.fetch_repository(&cancel, "caarlos0/starcharts").await?;
//! match client.fetch_stargazers(&cancel, &repo).await {
//!     Ok(events) => println!("{} stars", events.len()),
//!     Err(err) if err.is_rate_limited() => println!("try again later"),
//!     Err(err) => return Err(err.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod conditional;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod repository;
pub mod stargazers;
pub mod tokens;

pub use cache::{Cache, CacheBackend, CacheError, MemoryBackend, connect_cache, etag_key};
#[cfg(feature = "redis")]
pub use cache::RedisBackend;
pub use client::GitHubClient;
pub use conditional::{Cacheable, ConditionalFetcher};
pub use dispatch::{Dispatcher, MAX_DISPATCH_ATTEMPTS};
pub use error::{Error, Result};
pub use http::{HttpError, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
#[cfg(any(test, feature = "test-util"))]
pub use http::{MockTransport, json_response, status_response};
pub use metrics::{MetricCounts, MetricEvent, MetricsSink, NoopMetrics, RecordingMetrics, TracingMetrics};
pub use rate_limit::{GuardError, RateLimitGuard};
pub use stargazers::{PAGE_CONCURRENCY, PagePlan, STAR_MEDIA_TYPE};
pub use tokens::{Token, TokenPool};
