//! Token pool with round-robin selection.
//!
//! The pool owns every configured credential for the lifetime of the
//! process. Selection walks the tokens in order, one slot per pick; a slot
//! whose token has been invalidated is skipped by moving on to the next slot.
//! Invalidated tokens stay in the pool, so its size never changes, only its
//! valid count shrinks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::metrics::{MetricEvent, MetricsSink};

/// A credential and its validity flag.
///
/// The secret is never printed; [`Display`](fmt::Display) and
/// [`Debug`](fmt::Debug) show only its last three characters.
pub struct Token {
    secret: SecretString,
    valid: AtomicBool,
}

impl Token {
    /// Creates a valid token.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            valid: AtomicBool::new(true),
        }
    }

    /// The raw credential, for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Marks the token unusable for the rest of the process lifetime.
    ///
    /// Returns `true` if this call changed the token from valid to invalid.
    pub fn invalidate(&self) -> bool {
        let was_valid = self.valid.swap(false, Ordering::AcqRel);
        if was_valid {
            warn!(token = %self, "invalidating token");
        }
        was_valid
    }

    /// `...` followed by the last three characters of the secret.
    #[must_use]
    pub fn redacted(&self) -> String {
        let secret = self.secret.expose_secret();
        let tail: String = secret
            .chars()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{tail}")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("secret", &self.redacted())
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Round-robin pool of tokens.
///
/// The cursor is a single atomic counter, so concurrent pickers never wait
/// on each other.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use starchart_github::{NoopMetrics, TokenPool};
///
/// let pool = TokenPool::new(["ghp_aaa", "ghp_bbb"], Arc::new(NoopMetrics));
/// let first = pool.pick().unwrap().unwrap();
/// let second = pool.pick().unwrap().unwrap();
/// assert_eq!(first.expose(), "ghp_aaa");
/// assert_eq!(second.expose(), "ghp_bbb");
/// ```
pub struct TokenPool {
    tokens: Vec<Arc<Token>>,
    next: AtomicUsize,
    metrics: Arc<dyn MetricsSink>,
}

impl TokenPool {
    /// Creates a pool from raw credentials, all initially valid.
    pub fn new<I, S>(tokens: I, metrics: Arc<dyn MetricsSink>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<Arc<Token>> = tokens
            .into_iter()
            .map(|secret| Arc::new(Token::new(secret)))
            .collect();
        debug!(count = tokens.len(), "creating token pool");
        metrics.record(MetricEvent::AvailableTokens(tokens.len()));
        Self {
            tokens,
            next: AtomicUsize::new(0),
            metrics,
        }
    }

    /// Picks the next valid token.
    ///
    /// Returns `Ok(None)` for an empty pool, meaning requests should go out
    /// unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoValidToken`] once as many slots as the pool holds
    /// have been tried without finding a valid token.
    pub fn pick(&self) -> Result<Option<Arc<Token>>> {
        let len = self.tokens.len();
        if len == 0 {
            return Ok(None);
        }

        for _ in 0..len {
            let slot = self.next.fetch_add(1, Ordering::Relaxed) % len;
            let token = &self.tokens[slot];
            if token.is_valid() {
                debug!(token = %token, slot, "picked token");
                return Ok(Some(Arc::clone(token)));
            }
        }

        Err(Error::NoValidToken { attempts: len })
    }

    /// Invalidates `token` and reports the shrunken pool.
    pub fn invalidate(&self, token: &Token) {
        if token.invalidate() {
            self.metrics.record(MetricEvent::TokenInvalidated);
            self.metrics
                .record(MetricEvent::AvailableTokens(self.valid_count()));
        }
    }

    /// Number of tokens in the pool, valid or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens that can still be picked.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_valid()).count()
    }
}

impl fmt::Debug for TokenPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPool")
            .field("tokens", &self.tokens)
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{NoopMetrics, RecordingMetrics};

    fn pool(secrets: &[&str]) -> TokenPool {
        TokenPool::new(secrets.iter().copied(), Arc::new(NoopMetrics))
    }

    fn pick_secret(pool: &TokenPool) -> String {
        pool.pick()
            .expect("pool should have a valid token")
            .expect("pool should not be empty")
            .expose()
            .to_string()
    }

    #[test]
    fn empty_pool_picks_nothing() {
        let pool = pool(&[]);
        assert!(pool.is_empty());
        assert!(pool.pick().unwrap().is_none());
        assert!(pool.pick().unwrap().is_none());
    }

    #[test]
    fn picks_in_round_robin_order() {
        let pool = pool(&["a", "b", "c"]);
        let picked: Vec<_> = (0..7).map(|_| pick_secret(&pool)).collect();
        assert_eq!(picked, vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn invalid_tokens_are_skipped() {
        let pool = pool(&["a", "b", "c"]);
        pool.tokens[1].invalidate();

        let picked: Vec<_> = (0..4).map(|_| pick_secret(&pool)).collect();
        assert_eq!(picked, vec!["a", "c", "a", "c"]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.valid_count(), 2);
    }

    #[test]
    fn all_invalid_reports_no_valid_token() {
        let pool = pool(&["a", "b"]);
        for token in &pool.tokens {
            token.invalidate();
        }
        let err = pool.pick().unwrap_err();
        assert!(matches!(err, Error::NoValidToken { attempts: 2 }));
    }

    #[test]
    fn invalidation_is_permanent() {
        let token = Token::new("secret");
        assert!(token.invalidate());
        assert!(!token.invalidate());
        assert!(!token.is_valid());
    }

    #[test]
    fn pool_invalidate_reports_metrics_once() {
        let metrics = Arc::new(RecordingMetrics::new());
        let pool = TokenPool::new(["a", "b"], metrics.clone());
        assert_eq!(metrics.snapshot().available_tokens, Some(2));

        let token = pool.pick().unwrap().unwrap();
        pool.invalidate(&token);
        pool.invalidate(&token);

        let counts = metrics.snapshot();
        assert_eq!(counts.tokens_invalidated, 1);
        assert_eq!(counts.available_tokens, Some(1));
    }

    #[test]
    fn redacted_shows_only_suffix() {
        let token = Token::new("ghp_supersecret123");
        assert_eq!(token.redacted(), "...123");
        assert_eq!(token.to_string(), "...123");
        assert!(!format!("{token:?}").contains("supersecret"));

        assert_eq!(Token::new("ab").redacted(), "...ab");
    }

    #[tokio::test]
    async fn concurrent_picks_spread_evenly() {
        let pool = Arc::new(pool(&["a", "b", "c", "d"]));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move {
                (0..100).map(|_| pick_secret(&pool)).collect::<Vec<_>>()
            }));
        }

        let mut counts = std::collections::HashMap::new();
        for handle in handles {
            for secret in handle.await.unwrap() {
                *counts.entry(secret).or_insert(0) += 1;
            }
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&n| n == 200));
    }
}
