//! HTTP client for the LATAM onramp/offramp venue

use adapter_core::config_resolver::ConfigResolver;
use adapter_core::error::Result;
use adapter_core::http_executor::HttpExecutor;
use adapter_core::model::{ExecutionResult, Instrument, Quote};
use adapter_core::venue_client::VenueClient;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Deserialize)]
struct RfqResponse {
    rfq_id: String,
    base_amount: Decimal,
    quote_amount: Decimal,
    expires_in_secs: i64,
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

#[derive(Deserialize)]
struct WebhookRegistrationResponse {
    #[allow(dead_code)]
    registered: bool,
}

/// [`VenueClient`] implementation for the LATAM venue. Credentials
/// (`api_key`, `base_url`, `country`) are resolved per client from the
/// secret store rather than read from process environment, since each
/// client has its own account with the venue.
pub struct LatamVenueClient {
    executor: Arc<HttpExecutor>,
    resolver: Arc<ConfigResolver>,
}

impl LatamVenueClient {
    /// Build a client over a shared HTTP executor and config resolver
    pub fn new(executor: Arc<HttpExecutor>, resolver: Arc<ConfigResolver>) -> Self {
        Self { executor, resolver }
    }
}

#[async_trait]
impl VenueClient for LatamVenueClient {
    async fn create_rfq(
        &self,
        client_id: &str,
        instrument: &Instrument,
        base_amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Quote> {
        let secret = self.resolver.resolve(client_id).await?;
        let api_key = secret.require("api_key")?.to_string();
        let base_url = secret.require("base_url")?.to_string();
        let country = secret.require("country")?.to_string();

        let url = format!("{base_url}/rfq");
        let instrument_str = instrument.to_string();
        let response: RfqResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client
                    .post(&url)
                    .header("API-KEY", &api_key)
                    .header("X-Country", &country)
                    .json(&serde_json::json!({
                        "instrument": instrument_str,
                        "base_amount": base_amount,
                    }))
            })
            .await?;

        Ok(Quote {
            quote_id: response.rfq_id,
            instrument: instrument.clone(),
            base_amount: response.base_amount,
            quote_amount: response.quote_amount,
            expires_at: Utc::now() + chrono::Duration::seconds(response.expires_in_secs),
        })
    }

    async fn execute_rfq(&self, client_id: &str, quote_id: &str, cancel: &CancellationToken) -> Result<ExecutionResult> {
        let secret = self.resolver.resolve(client_id).await?;
        let api_key = secret.require("api_key")?.to_string();
        let base_url = secret.require("base_url")?.to_string();

        let url = format!("{base_url}/rfq/{quote_id}/execute");
        let response: ExecuteResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client.post(&url).header("API-KEY", &api_key)
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
        let secret = self.resolver.resolve(client_id).await?;
        let api_key = secret.require("api_key")?.to_string();
        let base_url = secret.require("base_url")?.to_string();

        let url = format!("{base_url}/orders/{venue_order_id}");
        let response: StatusResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client.get(&url).header("API-KEY", &api_key)
            })
            .await?;

        Ok(response.status)
    }

    async fn register_webhook(&self, client_id: &str, callback_url: &str, cancel: &CancellationToken) -> Result<()> {
        let secret = self.resolver.resolve(client_id).await?;
        let api_key = secret.require("api_key")?.to_string();
        let base_url = secret.require("base_url")?.to_string();

        let url = format!("{base_url}/webhooks");
        let callback_url = callback_url.to_string();
        let _response: WebhookRegistrationResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client
                    .post(&url)
                    .header("API-KEY", &api_key)
                    .json(&serde_json::json!({ "callback_url": callback_url }))
            })
            .await?;

        Ok(())
    }
}
