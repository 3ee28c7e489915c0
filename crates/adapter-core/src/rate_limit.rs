//! Token-bucket rate limiting, keyed per client

use crate::error::AdapterError;
use dashmap::DashMap;
use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Rate limiter holding one token bucket per client
#[derive(Clone, Default)]
pub struct RateLimiter {
    limiters: Arc<DashMap<String, Arc<DefaultDirectRateLimiter>>>,
}

impl RateLimiter {
    /// Create an empty rate limiter
    pub fn new() -> Self {
        Self {
            limiters: Arc::new(DashMap::new()),
        }
    }

    /// Configure (or replace) the bucket for a client. `burst` sets the
    /// number of tokens available immediately on a cold bucket.
    pub fn configure(&self, key: impl Into<String>, per_second: u32, burst: u32) {
        let key = key.into();
        let Ok(rate) = NonZeroU32::try_from(per_second.max(1)) else {
            tracing::warn!(client = %key, "invalid rate limit, leaving unconfigured");
            return;
        };
        let burst = NonZeroU32::try_from(burst.max(1)).unwrap_or(rate);
        let quota = Quota::per_second(rate).allow_burst(burst);
        self.limiters
            .insert(key, Arc::new(DefaultDirectRateLimiter::direct(quota)));
    }

    /// Non-blocking check: true if a request is allowed right now. Clients
    /// with no configured bucket are always allowed.
    pub fn check(&self, key: &str) -> bool {
        self.limiters
            .get(key)
            .map(|limiter| limiter.check().is_ok())
            .unwrap_or(true)
    }

    /// Wait until a token is available, or until `cancel` fires. Every
    /// caller into [`crate::http_executor::HttpExecutor`] routes through
    /// this so a single slow venue can never starve the others' buckets.
    pub async fn wait(&self, key: &str, cancel: &CancellationToken) -> Result<(), AdapterError> {
        let Some(limiter) = self.limiters.get(key).map(|l| l.clone()) else {
            return Ok(());
        };

        tokio::select! {
            _ = limiter.until_ready() => Ok(()),
            _ = cancel.cancelled() => Err(AdapterError::RateLimitCancelled {
                key: key.to_string(),
                reason: "wait cancelled by caller".to_string(),
            }),
        }
    }
}

/// Per-client request counters, used for health reporting and for
/// detecting a client that is being hammered with 429s.
pub struct RateLimitTracker {
    requests: Arc<DashMap<String, RequestStats>>,
}

impl RateLimitTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
        }
    }

    /// Record the outcome of a request against a client's bucket
    pub fn record_request(&self, key: &str, rate_limited: bool) {
        self.requests
            .entry(key.to_string())
            .and_modify(|stats| {
                stats.total += 1;
                if rate_limited {
                    stats.rate_limited += 1;
                } else {
                    stats.successful += 1;
                }
            })
            .or_insert_with(|| RequestStats {
                total: 1,
                successful: if rate_limited { 0 } else { 1 },
                rate_limited: if rate_limited { 1 } else { 0 },
            });
    }

    /// Snapshot of all tracked clients' stats
    pub fn snapshot(&self) -> Vec<(String, RequestStats)> {
        self.requests
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Clear all recorded stats
    pub fn reset(&self) {
        self.requests.clear();
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Request counters for a single client's bucket
#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    /// Total requests attempted
    pub total: u64,
    /// Requests that were not rate limited
    pub successful: u64,
    /// Requests that hit the bucket empty
    pub rate_limited: u64,
}

impl RequestStats {
    /// Fraction of requests that were not rate limited
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }

    /// True once rate-limited requests outnumber successful ones
    pub fn is_heavily_limited(&self) -> bool {
        self.rate_limited > self.successful
    }
}
