//! Rate-limit guard.
//!
//! Before a token authorizes a data request, the guard asks `GET /rate_limit`
//! how much of its quota is left. A rejected credential is invalidated for
//! good; a token that is merely busy is skipped for this request only.

use std::sync::Arc;

use starchart_protocol::{RateLimitResponse, RateSnapshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::http::{HttpError, HttpRequest, HttpTransport, send_or_cancel};
use crate::metrics::{MetricEvent, MetricsSink};
use crate::tokens::{Token, TokenPool};

/// Reasons a token was refused by the guard.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The quota endpoint rejected the credential (401 or 403); the token
    /// has been invalidated.
    #[error("token {token} was rejected with status {status}")]
    Rejected { token: String, status: u16 },

    /// The quota endpoint answered with an unexpected status.
    #[error("rate limit check failed with status {status}")]
    Status { status: u16 },

    /// The token has consumed at least the allowed share of its quota.
    #[error("token {token} has used {used_pct}% of its quota (max {max_pct}%)")]
    OverUsage {
        token: String,
        used_pct: u64,
        max_pct: u8,
    },

    #[error(transparent)]
    Transport(#[from] HttpError),

    #[error("failed to decode rate limit response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("rate limit check cancelled")]
    Cancelled,
}

impl GuardError {
    /// Returns `true` if the token was rejected and permanently invalidated.
    #[must_use]
    pub fn is_invalidation(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Checks token quotas against a usage ceiling.
pub struct RateLimitGuard {
    transport: Arc<dyn HttpTransport>,
    url: String,
    max_usage_pct: u8,
    metrics: Arc<dyn MetricsSink>,
}

impl RateLimitGuard {
    /// Creates a guard querying `<api_base_url>/rate_limit`.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api_base_url: &str,
        max_usage_pct: u8,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            transport,
            url: format!("{}/rate_limit", api_base_url.trim_end_matches('/')),
            max_usage_pct,
            metrics,
        }
    }

    /// Verifies that `token` may be used now.
    ///
    /// 401 and 403 answers invalidate the token through `pool`. Any other
    /// non-2xx status, and a usage at or above the ceiling, are reported
    /// without touching the token.
    ///
    /// # Errors
    ///
    /// Returns a [`GuardError`] describing why the token cannot be used.
    #[instrument(skip_all, fields(token = %token))]
    pub async fn check(
        &self,
        pool: &TokenPool,
        token: &Token,
        cancel: &CancellationToken,
    ) -> Result<RateSnapshot, GuardError> {
        let request = HttpRequest::get(&self.url)
            .with_header("Authorization", format!("token {}", token.expose()));

        let response = send_or_cancel(self.transport.as_ref(), cancel, request)
            .await
            .ok_or(GuardError::Cancelled)??;

        match response.status {
            401 | 403 => {
                warn!(status = response.status, "token rejected by rate limit endpoint");
                pool.invalidate(token);
                return Err(GuardError::Rejected {
                    token: token.redacted(),
                    status: response.status,
                });
            }
            status if !(200..300).contains(&status) => {
                debug!(status, "rate limit check returned unexpected status");
                return Err(GuardError::Status { status });
            }
            _ => {}
        }

        let RateLimitResponse { rate } = serde_json::from_slice(&response.body)?;
        let redacted = token.redacted();
        self.metrics.record(MetricEvent::RateRemaining {
            token: &redacted,
            remaining: rate.remaining,
        });

        let used_pct = rate.used_pct();
        debug!(
            remaining = rate.remaining,
            limit = rate.limit,
            used_pct,
            "rate limit checked"
        );
        if used_pct >= u64::from(self.max_usage_pct) {
            return Err(GuardError::OverUsage {
                token: redacted,
                used_pct,
                max_pct: self.max_usage_pct,
            });
        }

        Ok(rate)
    }
}
