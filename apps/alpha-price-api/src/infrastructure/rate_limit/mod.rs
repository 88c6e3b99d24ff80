//! Sliding Window Rate Limiter
//!
//! Counts requests per (client, path) key inside a trailing window. A key
//! moves from accepting to throttled when it holds `limit` timestamps, and
//! back to accepting as soon as its oldest timestamp leaves the window.
//!
//! State is in-memory and per process. Expired timestamps are evicted on
//! access; [`RateLimitSweeper`] drops keys that have gone idle.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::RateLimitSettings;

/// Bucket key: client identifier and request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    /// Client identifier, usually an IP address.
    pub client: String,
    /// Request path.
    pub path: String,
}

impl RateKey {
    /// Create a bucket key.
    #[must_use]
    pub fn new(client: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            path: path.into(),
        }
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request recorded and allowed.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// Request rejected.
    Throttled {
        /// Suggested wait before retrying.
        retry_after: Duration,
    },
}

impl RateDecision {
    /// Whether the request may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Per-key sliding window limiter.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    window: Duration,
    limit: u32,
    buckets: Mutex<HashMap<RateKey, VecDeque<Instant>>>,
}

impl SlidingWindowRateLimiter {
    /// Create a limiter allowing `limit` requests per `window`.
    #[must_use]
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            window,
            limit,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Create a limiter from settings.
    #[must_use]
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.window, settings.max_requests)
    }

    /// Requests allowed per window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Check and record a request now.
    pub fn check(&self, key: &RateKey) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Check and record a request at `now`.
    ///
    /// Eviction, the limit test and the append run under one lock.
    pub fn check_at(&self, key: &RateKey, now: Instant) -> RateDecision {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key.clone()).or_default();

        while bucket
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) > self.window)
        {
            bucket.pop_front();
        }

        let count = u32::try_from(bucket.len()).unwrap_or(u32::MAX);
        if count >= self.limit {
            return RateDecision::Throttled {
                retry_after: self.window,
            };
        }

        bucket.push_back(now);
        RateDecision::Allowed {
            remaining: self.limit.saturating_sub(count + 1),
        }
    }

    /// Drop keys whose newest request left the window. Returns how many.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock();
        let before = buckets.len();
        buckets.retain(|_, bucket| {
            bucket
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) <= self.window)
        });
        before - buckets.len()
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Periodically sweeps idle keys until cancelled.
pub struct RateLimitSweeper {
    limiter: Arc<SlidingWindowRateLimiter>,
    interval: Duration,
    cancel: CancellationToken,
}

impl RateLimitSweeper {
    /// Create a sweeper.
    #[must_use]
    pub const fn new(
        limiter: Arc<SlidingWindowRateLimiter>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            limiter,
            interval,
            cancel,
        }
    }

    /// Run the sweep loop until cancelled.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("Rate limit sweeper cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let removed = self.limiter.sweep_at(Instant::now());
                    if removed > 0 {
                        tracing::debug!(
                            removed,
                            remaining = self.limiter.tracked_keys(),
                            "Swept idle rate limit keys"
                        );
                    }
                }
            }
        }
    }
}
