//! HTTP client for the BRL FX venue

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
    id_cotacao: String,
    base_amount: Decimal,
    quote_amount: Decimal,
    validade_segundos: i64,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    id_pedido: String,
    situacao: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    situacao: String,
}

/// [`VenueClient`] implementation for the BRL FX venue. Authenticates
/// with HTTP Basic auth over a per-client username/password pair; this
/// venue has no token refresh cycle to manage.
pub struct FxBrlVenueClient {
    executor: Arc<HttpExecutor>,
    resolver: Arc<ConfigResolver>,
}

impl FxBrlVenueClient {
    /// Build a client over a shared HTTP executor and config resolver
    pub fn new(executor: Arc<HttpExecutor>, resolver: Arc<ConfigResolver>) -> Self {
        Self { executor, resolver }
    }
}

#[async_trait]
impl VenueClient for FxBrlVenueClient {
    async fn create_rfq(
        &self,
        client_id: &str,
        instrument: &Instrument,
        base_amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Quote> {
        let secret = self.resolver.resolve(client_id).await?;
        let username = secret.require("username")?.to_string();
        let password = secret.require("password")?.to_string();
        let base_url = secret.require("base_url")?.to_string();

        let url = format!("{base_url}/cotacoes");
        let instrument_str = instrument.to_string();

        let response: RfqResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client
                    .post(&url)
                    .basic_auth(&username, Some(&password))
                    .json(&serde_json::json!({
                        "instrumento": instrument_str,
                        "quantidade_base": base_amount,
                    }))
            })
            .await?;

        Ok(Quote {
            quote_id: response.id_cotacao,
            instrument: instrument.clone(),
            base_amount: response.base_amount,
            quote_amount: response.quote_amount,
            expires_at: Utc::now() + chrono::Duration::seconds(response.validade_segundos),
        })
    }

    async fn execute_rfq(&self, client_id: &str, quote_id: &str, cancel: &CancellationToken) -> Result<ExecutionResult> {
        let secret = self.resolver.resolve(client_id).await?;
        let username = secret.require("username")?.to_string();
        let password = secret.require("password")?.to_string();
        let base_url = secret.require("base_url")?.to_string();

        let url = format!("{base_url}/cotacoes/{quote_id}/executar");

        let response: ExecuteResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client.post(&url).basic_auth(&username, Some(&password))
            })
            .await?;

        Ok(ExecutionResult {
            venue_order_id: response.id_pedido,
            raw_status: response.situacao,
        })
    }

    async fn fetch_status(
        &self,
        client_id: &str,
        venue_order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let secret = self.resolver.resolve(client_id).await?;
        let username = secret.require("username")?.to_string();
        let password = secret.require("password")?.to_string();
        let base_url = secret.require("base_url")?.to_string();

        let url = format!("{base_url}/pedidos/{venue_order_id}");

        let response: StatusResponse = self
            .executor
            .execute(client_id, cancel, move |client| {
                client.get(&url).basic_auth(&username, Some(&password))
            })
            .await?;

        Ok(response.situacao)
    }
}
