//! Bearer token acquisition and refresh for OAuth2-style venues
//!
//! Used by `venue-oauthfx` only; venues authenticating with a static API
//! key never construct a [`TokenManager`].

use crate::error::{AdapterError, Result};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// A cached bearer token and its expiry
#[derive(Debug, Clone)]
pub struct Token {
    /// The bearer token value
    pub access_token: String,
    /// When the token stops being valid
    pub expires_at: DateTime<Utc>,
}

impl Token {
    fn is_fresh(&self) -> bool {
        // Refresh a little early so a request never races an expiry.
        Utc::now() + Duration::minutes(5) < self.expires_at
    }
}

/// Exchanges client credentials for a bearer token and caches it until it
/// is close to expiry. One `TokenManager` per client; venue-oauthfx keys
/// its instances off `client_id` the same way [`crate::config_resolver::ConfigResolver`] does.
#[async_trait::async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange client_id/client_secret for a fresh bearer token
    async fn exchange(&self, client_id: &str, client_secret: &str) -> Result<Token>;
}

/// Caches tokens per client, refreshing through a [`TokenExchange`]
/// implementation when the cached token is stale or absent. Each client
/// gets its own `tokio::sync::Mutex`, held across the whole
/// check-then-refresh sequence in [`Self::get_token`], so concurrent
/// callers for the same client coalesce onto a single exchange call
/// rather than all missing the cache together.
pub struct TokenManager {
    exchange: Arc<dyn TokenExchange>,
    cache: DashMap<String, Arc<tokio::sync::Mutex<Option<Token>>>>,
}

impl TokenManager {
    /// Build a manager over the given exchange implementation
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            cache: DashMap::new(),
        }
    }

    fn slot_for(&self, client_id: &str) -> Arc<tokio::sync::Mutex<Option<Token>>> {
        self.cache
            .entry(client_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }

    /// Get a valid bearer token for a client, refreshing if necessary. The
    /// per-client lock is held for the duration of the call, so a burst of
    /// concurrent callers for the same client results in exactly one
    /// exchange call rather than one per caller.
    pub async fn get_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String> {
        let slot = self.slot_for(client_id);
        let mut guard = slot.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.exchange.exchange(client_id, client_secret).await?;
        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    /// Drop a client's cached token, forcing the next call to re-exchange.
    /// Called when a request comes back 401 against a token we believed
    /// was still fresh.
    pub async fn invalidate(&self, client_id: &str) {
        let slot = self.slot_for(client_id);
        let mut guard = slot.lock().await;
        *guard = None;
    }
}

/// JWT-based client-credentials exchange, the concrete [`TokenExchange`] a
/// production `venue-oauthfx` binary wires in. Signs a short-lived JWT
/// assertion with the client secret and decodes the venue's bearer token
/// response.
pub struct JwtClientCredentials {
    base_url: String,
    http: reqwest::Client,
}

impl JwtClientCredentials {
    /// Build an exchange against the venue's token endpoint
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }
}

#[async_trait::async_trait]
impl TokenExchange for JwtClientCredentials {
    async fn exchange(&self, client_id: &str, client_secret: &str) -> Result<Token> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::{Deserialize, Serialize};

        #[derive(Serialize)]
        struct Claims<'a> {
            sub: &'a str,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now();
        let claims = Claims {
            sub: client_id,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(5)).timestamp(),
        };

        let assertion = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(client_secret.as_bytes()),
        )
        .map_err(|e| AdapterError::AuthenticationFailed {
            client_id: client_id.to_string(),
            reason: format!("failed to sign JWT assertion: {e}"),
        })?;

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let url = format!("{}/oauth/token", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "grant_type": "client_credentials",
                "assertion": assertion,
            }))
            .send()
            .await
            .map_err(|e| AdapterError::AuthenticationFailed {
                client_id: client_id.to_string(),
                reason: format!("token endpoint request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(AdapterError::AuthenticationFailed {
                client_id: client_id.to_string(),
                reason: format!("token endpoint returned {}", response.status()),
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| AdapterError::DecodeFailed(e.to_string()))?;

        Ok(Token {
            access_token: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingExchange {
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl TokenExchange for CountingExchange {
        async fn exchange(&self, _client_id: &str, _client_secret: &str) -> Result<Token> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Token {
                access_token: "tok".to_string(),
                expires_at: Utc::now() + Duration::minutes(10),
            })
        }
    }

    #[tokio::test]
    async fn caches_token_across_calls() {
        let exchange = Arc::new(CountingExchange {
            calls: AtomicU32::new(0),
        });
        let manager = TokenManager::new(exchange.clone());

        manager.get_token("acme", "secret").await.unwrap();
        manager.get_token("acme", "secret").await.unwrap();

        assert_eq!(exchange.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let exchange = Arc::new(CountingExchange {
            calls: AtomicU32::new(0),
        });
        let manager = TokenManager::new(exchange.clone());

        manager.get_token("acme", "secret").await.unwrap();
        manager.invalidate("acme").await;
        manager.get_token("acme", "secret").await.unwrap();

        assert_eq!(exchange.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_for_the_same_client_coalesce_onto_one_exchange() {
        let exchange = Arc::new(CountingExchange {
            calls: AtomicU32::new(0),
        });
        let manager = Arc::new(TokenManager::new(exchange.clone()));

        let mut handles = Vec::new();
        for _ in 0..100 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.get_token("acme", "secret").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(exchange.calls.load(Ordering::SeqCst), 1);
    }
}
