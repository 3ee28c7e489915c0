//! Configuration module for the venue adapter runtime
//!
//! Provides environment-based configuration shared by every venue binary.
//! Each venue crate extends [`BaseAdapterConfig`] with its own fields the
//! same way it extends [`crate::model`] types with venue-specific DTOs.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Base configuration shared by all venue adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAdapterConfig {
    /// Adapter/client identifier, used as the secret store lookup key and
    /// the rate limiter bucket key
    pub client_id: String,

    /// Whether this adapter is enabled
    pub enabled: bool,

    /// Maximum number of retry attempts for a single HTTP request
    pub max_retries: u32,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Initial backoff delay in milliseconds between retries
    pub retry_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds between retries
    pub max_retry_backoff_ms: u64,

    /// Terminal sync poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Cache configuration for resolved credentials
    pub cache: CacheConfig,

    /// Rate limit configuration
    pub rate_limit: RateLimitConfig,

    /// Webhook intake configuration
    pub webhook: WebhookConfig,
}

impl Default for BaseAdapterConfig {
    fn default() -> Self {
        Self {
            client_id: "adapter".to_string(),
            enabled: true,
            max_retries: 5,
            request_timeout_ms: 10_000,
            retry_backoff_ms: 250,
            max_retry_backoff_ms: 8_000,
            poll_interval_ms: 5_000,
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::from_env("ADAPTER"),
            webhook: WebhookConfig::default(),
        }
    }
}

impl BaseAdapterConfig {
    /// Load base configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env(prefix: &str) -> Self {
        Self {
            client_id: env::var(format!("{prefix}_CLIENT_ID"))
                .unwrap_or_else(|_| "adapter".to_string()),

            enabled: env::var(format!("{prefix}_ENABLED"))
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(true),

            max_retries: env::var(format!("{prefix}_MAX_RETRIES"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),

            request_timeout_ms: env::var(format!("{prefix}_REQUEST_TIMEOUT_MS"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),

            retry_backoff_ms: env::var(format!("{prefix}_RETRY_BACKOFF_MS"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(250),

            max_retry_backoff_ms: env::var(format!("{prefix}_MAX_RETRY_BACKOFF_MS"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8_000),

            poll_interval_ms: env::var(format!("{prefix}_POLL_INTERVAL_MS"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5_000),

            cache: CacheConfig::from_env(prefix),
            rate_limit: RateLimitConfig::from_env(prefix),
            webhook: WebhookConfig::from_env(prefix),
        }
    }

    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.client_id.is_empty() {
            return Err("client_id cannot be empty".to_string());
        }

        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than 0".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }

        self.cache.validate()?;
        self.webhook.validate()?;

        Ok(())
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Resolved-credential cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for a cached, resolved config in milliseconds
    pub ttl_ms: u64,

    /// Maximum number of distinct client configs to hold at once
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            max_entries: 1_000,
        }
    }
}

impl CacheConfig {
    /// Load from environment
    pub fn from_env(prefix: &str) -> Self {
        Self {
            ttl_ms: env::var(format!("{prefix}_CACHE_TTL_MS"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300_000),

            max_entries: env::var(format!("{prefix}_CACHE_MAX_ENTRIES"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000),
        }
    }

    /// Validate
    pub fn validate(&self) -> Result<(), String> {
        if self.ttl_ms == 0 {
            return Err("cache ttl_ms must be greater than 0".to_string());
        }
        if self.max_entries == 0 {
            return Err("cache max_entries must be greater than 0".to_string());
        }
        Ok(())
    }

    /// TTL as a [`Duration`]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum sustained requests per second
    pub max_per_second: u32,

    /// Burst size (tokens available immediately on a cold bucket)
    pub burst_size: u32,
}

impl RateLimitConfig {
    /// Create from environment or defaults
    pub fn from_env(prefix: &str) -> Self {
        let max_per_second_key = format!("{prefix}_RATE_LIMIT_PER_SECOND");
        let burst_size_key = format!("{prefix}_RATE_LIMIT_BURST");

        Self {
            max_per_second: env::var(&max_per_second_key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            burst_size: env::var(&burst_size_key)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// Webhook intake configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Publicly reachable URL the venue should call back on events, if the
    /// venue supports webhooks at all
    pub callback_url: Option<String>,

    /// Shared secret used to verify the HMAC-SHA256 signature of inbound
    /// webhook bodies
    pub signing_secret: Option<String>,

    /// HTTP header the venue places its signature in
    pub signature_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            callback_url: None,
            signing_secret: None,
            signature_header: "X-Rio-Signature".to_string(),
        }
    }
}

impl WebhookConfig {
    /// Load from environment
    pub fn from_env(prefix: &str) -> Self {
        Self {
            callback_url: env::var(format!("{prefix}_WEBHOOK_URL")).ok(),
            signing_secret: env::var(format!("{prefix}_WEBHOOK_SECRET")).ok(),
            signature_header: env::var(format!("{prefix}_WEBHOOK_SIGNATURE_HEADER"))
                .unwrap_or_else(|_| "X-Rio-Signature".to_string()),
        }
    }

    /// Validate
    pub fn validate(&self) -> Result<(), String> {
        if self.callback_url.is_some() && self.signing_secret.is_none() {
            return Err("webhook signing_secret is required when callback_url is set".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_config_from_env() {
        env::set_var("TEST_CLIENT_ID", "acme-corp");
        env::set_var("TEST_MAX_RETRIES", "3");

        let config = BaseAdapterConfig::from_env("TEST");
        assert_eq!(config.client_id, "acme-corp");
        assert_eq!(config.max_retries, 3);

        env::remove_var("TEST_CLIENT_ID");
        env::remove_var("TEST_MAX_RETRIES");
    }

    #[test]
    fn test_config_validation() {
        let mut config = BaseAdapterConfig::default();
        assert!(config.validate().is_ok());

        config.client_id = "".to_string();
        assert!(config.validate().is_err());

        config.client_id = "ok".to_string();
        config.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_webhook_requires_secret_with_url() {
        let mut webhook = WebhookConfig::default();
        webhook.callback_url = Some("https://example.com/hooks".to_string());
        assert!(webhook.validate().is_err());

        webhook.signing_secret = Some("shh".to_string());
        assert!(webhook.validate().is_ok());
    }
}
