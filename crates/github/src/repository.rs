//! Repository fetching.

use starchart_protocol::Repository;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::client::GitHubClient;
use crate::error::{Error, Result};
use crate::http::HttpRequest;

impl GitHubClient {
    /// Fetches repository details, conditionally on the cached ETag.
    ///
    /// The snapshot is cached under the repository's full name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimited`] when GitHub answers 403,
    /// [`Error::UpstreamApi`] for any other unexpected status, and
    /// [`Error::Cancelled`] if `cancel` fires before the fetch completes.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use starchart_github::GitHubClient;
    /// # use tokio_util::sync::CancellationToken;
    /// # async fn example(client: GitHubClient) -> starchart_github::Result<()> {
    /// let repo = client
    ///     .fetch_repository(&CancellationToken::new(), "tokio-rs/tokio")
    ///     .await?;
    /// println!("{} stars", repo.stargazers_count);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self, cancel))]
    pub async fn fetch_repository(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<Repository> {
        let request = HttpRequest::get(self.url(&format!("/repos/{name}")));
        let repo = self
            .inner
            .fetcher
            .fetch::<Repository>(name, request, cancel)
            .await?
            .ok_or_else(|| Error::UpstreamApi {
                status: 200,
                body: format!("empty repository payload for {name}"),
            })?;

        info!(stars = repo.stargazers_count, "fetched repository");
        Ok(repo)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use starchart_config::GitHubConfig;

    use super::*;
    use crate::cache::{Cache, MemoryBackend};
    use crate::http::{MockTransport, json_response, status_response};
    use crate::metrics::RecordingMetrics;

    const REPO_URL: &str = "https://api.test/repos/caarlos0/starcharts";
    const RATE_URL: &str = "https://api.test/rate_limit";

    fn client(tokens: &[&str]) -> (GitHubClient, MockTransport, Arc<MemoryBackend>) {
        let transport = MockTransport::new();
        let backend = Arc::new(MemoryBackend::new());
        let metrics = Arc::new(RecordingMetrics::new());
        let config = GitHubConfig {
            api_base_url: "https://api.test".to_string(),
            ..GitHubConfig::with_tokens(tokens.iter().copied())
        };
        let client = GitHubClient::new(
            &config,
            Arc::new(transport.clone()),
            Cache::new(backend.clone(), metrics.clone()),
            metrics,
        );
        (client, transport, backend)
    }

    fn body() -> serde_json::Value {
        json!({
            "full_name": "caarlos0/starcharts",
            "stargazers_count": 1024,
            "created_at": "2017-06-04T20:13:25Z",
            "description": "Plot your repository stars over time."
        })
    }

    #[tokio::test]
    async fn fetches_and_caches_repository() {
        let (client, transport, backend) = client(&[]);
        transport.push_response(REPO_URL, json_response(200, &body(), Some("W/\"abc\"")));

        let repo = client
            .fetch_repository(&CancellationToken::new(), "caarlos0/starcharts")
            .await
            .unwrap();

        assert_eq!(repo.full_name, "caarlos0/starcharts");
        assert_eq!(repo.stargazers_count, 1024);
        assert_eq!(
            repo.created_at,
            Utc.with_ymd_and_hms(2017, 6, 4, 20, 13, 25).unwrap()
        );
        assert!(backend.contains("caarlos0/starcharts").await);
        assert!(backend.contains("caarlos0/starcharts_etag").await);
    }

    #[tokio::test]
    async fn second_fetch_is_conditional() {
        let (client, transport, backend) = client(&[]);
        transport.push_response(REPO_URL, json_response(200, &body(), Some("W/\"abc\"")));
        transport.push_response(REPO_URL, status_response(304, ""));
        let cancel = CancellationToken::new();

        let first = client.fetch_repository(&cancel, "caarlos0/starcharts").await.unwrap();
        let writes = backend.write_count();
        let second = client.fetch_repository(&cancel, "caarlos0/starcharts").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.write_count(), writes);
        let sent = transport.requests_to(REPO_URL);
        assert_eq!(sent[1].header("If-None-Match"), Some("W/\"abc\""));
    }

    #[tokio::test]
    async fn authorized_fetch_checks_rate_limit_first() {
        let (client, transport, _) = client(&["ghp_tok"]);
        transport.push_response(
            RATE_URL,
            json_response(200, &json!({ "rate": { "remaining": 4900, "limit": 5000 } }), None),
        );
        transport.push_response(REPO_URL, json_response(200, &body(), None));

        client
            .fetch_repository(&CancellationToken::new(), "caarlos0/starcharts")
            .await
            .unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].url, RATE_URL);
        assert_eq!(sent[1].url, REPO_URL);
        assert_eq!(sent[1].header("authorization"), Some("token ghp_tok"));
    }

    #[tokio::test]
    async fn rate_limited_repository_fetch() {
        let (client, transport, backend) = client(&[]);
        transport.push_response(REPO_URL, status_response(403, "API rate limit exceeded"));

        let err = client
            .fetch_repository(&CancellationToken::new(), "caarlos0/starcharts")
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn cancelled_fetch() {
        let (client, transport, _) = client(&[]);
        transport.push_response(REPO_URL, json_response(200, &body(), None));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .fetch_repository(&cancel, "caarlos0/starcharts")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
