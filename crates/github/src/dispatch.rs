//! Authorized request dispatch.
//!
//! The [`Dispatcher`] turns a bare request into an authorized one: it picks
//! a token from the pool, runs the rate-limit guard on it, and retries with
//! the next token when the guard refuses. When the pool has nothing to
//! offer, the request goes out unauthenticated.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse, HttpTransport, send_or_cancel};
use crate::rate_limit::{GuardError, RateLimitGuard};
use crate::tokens::TokenPool;

/// Guard checks allowed per request before giving up.
pub const MAX_DISPATCH_ATTEMPTS: usize = 4;

/// Sends requests on behalf of the token pool.
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    pool: TokenPool,
    guard: RateLimitGuard,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, pool: TokenPool, guard: RateLimitGuard) -> Self {
        Self {
            transport,
            pool,
            guard,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &TokenPool {
        &self.pool
    }

    /// Sends `request` with the first token that passes the guard.
    ///
    /// Network failures of the request itself are returned as-is; only guard
    /// refusals move on to another token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoValidToken`] after [`MAX_DISPATCH_ATTEMPTS`] guard
    /// refusals, [`Error::Cancelled`] if `cancel` fires, and
    /// [`Error::Transport`] if the request cannot be delivered.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn send(&self, request: HttpRequest, cancel: &CancellationToken) -> Result<HttpResponse> {
        for attempt in 0..MAX_DISPATCH_ATTEMPTS {
            let token = match self.pool.pick() {
                Ok(Some(token)) => token,
                Ok(None) => {
                    debug!("no tokens configured, sending unauthenticated request");
                    return self.send_raw(request, cancel).await;
                }
                Err(err) => {
                    warn!(error = %err, "token pool exhausted, sending unauthenticated request");
                    return self.send_raw(request, cancel).await;
                }
            };

            match self.guard.check(&self.pool, &token, cancel).await {
                Ok(_) => {
                    debug!(attempt, token = %token, "sending authorized request");
                    let request =
                        request.with_header("Authorization", format!("token {}", token.expose()));
                    return self.send_raw(request, cancel).await;
                }
                Err(GuardError::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    warn!(attempt, token = %token, error = %err, "token refused, trying next one");
                }
            }
        }

        Err(Error::NoValidToken {
            attempts: MAX_DISPATCH_ATTEMPTS,
        })
    }

    async fn send_raw(&self, request: HttpRequest, cancel: &CancellationToken) -> Result<HttpResponse> {
        let response = send_or_cancel(self.transport.as_ref(), cancel, request)
            .await
            .ok_or(Error::Cancelled)??;
        Ok(response)
    }
}
