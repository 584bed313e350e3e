//! Rate limit snapshots returned by `GET /rate_limit`.

use serde::{Deserialize, Serialize};

/// The remaining and total request quota of a credential at one point in time.
///
/// Snapshots are transient and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Requests left in the current window.
    pub remaining: u64,
    /// Total requests allowed per window.
    pub limit: u64,
}

impl RateSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub const fn new(remaining: u64, limit: u64) -> Self {
        Self { remaining, limit }
    }

    /// Percentage of the quota still available, rounded down.
    ///
    /// A zero limit is reported as nothing remaining.
    ///
    /// # Examples
    ///
    /// ```
    /// use starchart_protocol::RateSnapshot;
    ///
    /// assert_eq!(RateSnapshot::new(4999, 5000).remaining_pct(), 99);
    /// assert_eq!(RateSnapshot::new(10, 0).remaining_pct(), 0);
    /// ```
    #[must_use]
    pub const fn remaining_pct(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.remaining.saturating_mul(100) / self.limit
    }

    /// Percentage of the quota already consumed.
    ///
    /// # Examples
    ///
    /// ```
    /// use starchart_protocol::RateSnapshot;
    ///
    /// assert_eq!(RateSnapshot::new(1000, 5000).used_pct(), 80);
    /// ```
    #[must_use]
    pub const fn used_pct(&self) -> u64 {
        100u64.saturating_sub(self.remaining_pct())
    }
}

/// Envelope of the `/rate_limit` response body.
///
/// Only the core `rate` object is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResponse {
    /// The core API quota.
    pub rate: RateSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rate_limit_body() {
        let json = r#"{
            "resources": { "core": { "limit": 5000, "remaining": 4000 } },
            "rate": { "limit": 5000, "remaining": 4000, "reset": 1372700873, "used": 1000 }
        }"#;
        let parsed: RateLimitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.rate, RateSnapshot::new(4000, 5000));
    }

    #[test]
    fn used_pct_rounds_towards_more_usage() {
        // 4999/5000 remaining is 99% remaining, so 1% used.
        assert_eq!(RateSnapshot::new(4999, 5000).used_pct(), 1);
        assert_eq!(RateSnapshot::new(0, 5000).used_pct(), 100);
        assert_eq!(RateSnapshot::new(5000, 5000).used_pct(), 0);
    }

    #[test]
    fn zero_limit_is_fully_used() {
        let snapshot = RateSnapshot::new(0, 0);
        assert_eq!(snapshot.remaining_pct(), 0);
        assert_eq!(snapshot.used_pct(), 100);
    }
}
