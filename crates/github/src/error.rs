//! Error types for GitHub API operations.
//!
//! This module defines the errors surfaced by [`GitHubClient`](crate::GitHubClient)
//! to the surrounding application. Cache failures never appear here: the
//! cache is best-effort and its errors ([`CacheError`](crate::cache::CacheError))
//! are logged and swallowed at every call site.

use crate::http::HttpError;

/// Errors that can occur during GitHub API operations.
///
/// Callers usually only need to distinguish four categories, for which
/// predicates are provided: rate limiting ([`is_rate_limited`](Self::is_rate_limited)),
/// oversized repositories ([`is_too_many_stargazers`](Self::is_too_many_stargazers)),
/// unexpected upstream answers ([`is_upstream_api_failure`](Self::is_upstream_api_failure)),
/// and everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// GitHub answered 403; the caller should back off and retry later.
    #[error("rate limited, please try again later")]
    RateLimited,

    /// The repository has more stargazers than GitHub allows listing.
    #[error(
        "repository has too many stargazers ({stargazers}): {pages} pages exceed the limit of {max_pages}"
    )]
    TooManyStargazers {
        /// Stargazer count reported by the repository.
        stargazers: u64,
        /// Full pages implied by that count.
        pages: u64,
        /// Configured page ceiling.
        max_pages: u32,
    },

    /// GitHub answered with an unexpected status.
    #[error("failed to talk with github api (status {status}): {body}")]
    UpstreamApi {
        /// HTTP status code of the response.
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// Every token attempt failed its rate-limit check.
    #[error("no valid token found after {attempts} attempts")]
    NoValidToken {
        /// Number of tokens tried.
        attempts: usize,
    },

    /// The request could not be delivered.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// A response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A page task panicked or was aborted.
    #[error("page task failed: {0}")]
    Task(String),
}

impl Error {
    /// Returns `true` for [`Error::RateLimited`].
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Returns `true` for [`Error::TooManyStargazers`].
    #[must_use]
    pub fn is_too_many_stargazers(&self) -> bool {
        matches!(self, Self::TooManyStargazers { .. })
    }

    /// Returns `true` for [`Error::UpstreamApi`].
    #[must_use]
    pub fn is_upstream_api_failure(&self) -> bool {
        matches!(self, Self::UpstreamApi { .. })
    }
}

/// A specialized Result type for GitHub API operations.
pub type Result<T> = std::result::Result<T, Error>;
