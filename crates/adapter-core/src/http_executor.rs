//! Rate-limited HTTP execution with retry and backoff
//!
//! Every outbound venue call goes through [`HttpExecutor::execute`], which
//! waits on the per-client rate bucket, sends the request, and retries
//! transport-level failures with exponential backoff up to the configured
//! limit. Non-transport errors (bad credentials, a rejected order) are
//! never retried: retrying them cannot change the outcome.

use crate::error::{AdapterError, Result};
use crate::rate_limit::RateLimiter;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for the retry/backoff policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Initial backoff delay
    pub initial_backoff: Duration,
    /// Maximum backoff delay
    pub max_backoff: Duration,
}

impl RetryPolicy {
    fn backoff_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt));
        scaled.min(self.max_backoff)
    }
}

/// Wraps a [`reqwest::Client`] with per-client rate limiting and retry
pub struct HttpExecutor {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl HttpExecutor {
    /// Build an executor over a shared reqwest client and rate limiter
    pub fn new(client: reqwest::Client, rate_limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self {
            client,
            rate_limiter,
            retry,
        }
    }

    /// Issue a request, waiting on `rate_key`'s bucket first and retrying
    /// transport failures per the configured policy. `build` constructs the
    /// request fresh on every attempt since a [`RequestBuilder`] cannot be
    /// cloned once it carries a body.
    pub async fn execute<T, F>(
        &self,
        rate_key: &str,
        cancel: &CancellationToken,
        mut build: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut(&reqwest::Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            self.rate_limiter.wait(rate_key, cancel).await?;

            let request = build(&self.client);
            let outcome = request.send().await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response
                            .json::<T>()
                            .await
                            .map_err(|e| AdapterError::DecodeFailed(e.to_string()))?;
                        return Ok(body);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<unreadable body>".to_string());

                    // 5xx is the venue's own transient failure, retried the same
                    // way as a transport error. 4xx is a property of the request
                    // itself; retrying it would never change the outcome.
                    if !status.is_server_error() {
                        return Err(AdapterError::VenueRejected {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(AdapterError::VenueRejected {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    let delay = self.retry.backoff_for(attempt - 1);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {},
                        _ = cancel.cancelled() => {
                            return Err(AdapterError::VenueRejected { status: status.as_u16(), message });
                        }
                    }
                }
                Err(source) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(AdapterError::Transport {
                            attempts: attempt,
                            source: source.to_string(),
                        });
                    }

                    let delay = self.retry.backoff_for(attempt - 1);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {},
                        _ = cancel.cancelled() => {
                            return Err(AdapterError::Transport {
                                attempts: attempt,
                                source: "cancelled during backoff".to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Convenience wrapper for a simple GET against a fixed URL
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        rate_key: &str,
        cancel: &CancellationToken,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<T> {
        self.execute(rate_key, cancel, |client| {
            let mut req = client.request(Method::GET, url);
            for (name, value) in headers {
                req = req.header(name, value);
            }
            req
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1000),
        };

        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(10), Duration::from_millis(1000));
    }
}
