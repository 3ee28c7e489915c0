//! HTTP client for the OAuth2 FX venue

use adapter_core::config_resolver::ConfigResolver;
use adapter_core::error::Result;
use adapter_core::http_executor::HttpExecutor;
use adapter_core::model::{ExecutionResult, Instrument, Quote};
use adapter_core::token_manager::TokenManager;
use adapter_core::venue_client::VenueClient;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Deserialize)]
struct RfqResponse {
    quote_id: String,
    base_amount: Decimal,
    quote_amount: Decimal,
    ttl_secs: i64,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    order_id: String,
    status: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
}

/// [`VenueClient`] implementation for the OAuth2 FX venue. Every request
/// carries a bearer token obtained through [`TokenManager`]. Status
/// normalization is not this client's job — `fetch_status` and
/// `execute_rfq` both hand back the venue's raw status string unmapped.
pub struct OauthFxVenueClient {
    executor: Arc<HttpExecutor>,
    resolver: Arc<ConfigResolver>,
    tokens: Arc<TokenManager>,
}

impl OauthFxVenueClient {
    /// Build a client over a shared HTTP executor, config resolver and token manager
    pub fn new(executor: Arc<HttpExecutor>, resolver: Arc<ConfigResolver>, tokens: Arc<TokenManager>) -> Self {
        Self {
            executor,
            resolver,
            tokens,
        }
    }

    async fn bearer_header(&self, client_id: &str) -> Result<(String, String)> {
        let secret = self.resolver.resolve(client_id).await?;
        let oauth_client_id = secret.require("client_id")?.to_string();
        let client_secret = secret.require("client_secret")?.to_string();
        let base_url = secret.require("base_url")?.to_string();
        let token = self.tokens.get_token(&oauth_client_id, &client_secret).await?;
        Ok((base_url, format!("Bearer {token}")))
    }
}

#[async_trait]
impl VenueClient for OauthFxVenueClient {
    async fn create_rfq(
        &self,
        client_id: &str,
        instrument: &Instrument,
        base_amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Quote> {
        let (base_url, auth_header) = self.bearer_header(client_id).await?;
        let url = format!("{base_url}/v1/rfq");
        let instrument_str = instrument.to_string();

        let response: RfqResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client
                    .post(&url)
                    .header("Authorization", &auth_header)
                    .json(&serde_json::json!({
                        "instrument": instrument_str,
                        "base_amount": base_amount,
                    }))
            })
            .await?;

        Ok(Quote {
            quote_id: response.quote_id,
            instrument: instrument.clone(),
            base_amount: response.base_amount,
            quote_amount: response.quote_amount,
            expires_at: Utc::now() + chrono::Duration::seconds(response.ttl_secs),
        })
    }

    async fn execute_rfq(&self, client_id: &str, quote_id: &str, cancel: &CancellationToken) -> Result<ExecutionResult> {
        let (base_url, auth_header) = self.bearer_header(client_id).await?;
        let url = format!("{base_url}/v1/rfq/{quote_id}/execute");

        let response: ExecuteResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client.post(&url).header("Authorization", &auth_header)
            })
            .await?;

        Ok(ExecutionResult {
            venue_order_id: response.order_id,
            raw_status: response.status,
        })
    }

    async fn fetch_status(
        &self,
        client_id: &str,
        venue_order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let (base_url, auth_header) = self.bearer_header(client_id).await?;
        let url = format!("{base_url}/v1/orders/{venue_order_id}");

        let response: StatusResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client.get(&url).header("Authorization", &auth_header)
            })
            .await?;

        Ok(response.status)
    }
}
