//! OAuth2 FX venue adapter service binary

use adapter_core::bus::RecordingEventBus;
use adapter_core::config_resolver::ConfigResolver;
use adapter_core::http_executor::{HttpExecutor, RetryPolicy};
use adapter_core::legacy::RecordingLegacySink;
use adapter_core::mapper::Mapper;
use adapter_core::metrics::AdapterMetrics;
use adapter_core::model::{Instrument, Order, Quote, ResolveOrderResult};
use adapter_core::order_service::OrderService;
use adapter_core::rate_limit::RateLimiter;
use adapter_core::secrets::InMemorySecretStore;
use adapter_core::store::InMemorySnapshotStore;
use adapter_core::terminal_sync::TerminalSync;
use adapter_core::token_manager::{JwtClientCredentials, TokenManager};
use adapter_core::tracker::ActiveTrackers;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;
use venue_oauthfx::{OauthFxMapper, OauthFxVenueClient, VenueOauthFxConfig};

struct AppState {
    service: Arc<OrderService>,
}

#[derive(Deserialize)]
struct CreateRfqRequest {
    client_id: String,
    instrument: String,
    base_amount: Decimal,
}

#[derive(Serialize)]
struct QuoteResponse {
    quote_id: String,
    instrument: String,
    base_amount: Decimal,
    quote_amount: Decimal,
}

#[derive(Deserialize)]
struct ExecuteRfqRequest {
    client_id: String,
    quote: QuoteWire,
}

#[derive(Deserialize)]
struct QuoteWire {
    quote_id: String,
    instrument: String,
    base_amount: Decimal,
    quote_amount: Decimal,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct OrderResponse {
    order_id: Uuid,
    status: String,
}

#[derive(Deserialize)]
struct ResolveOrderRequest {
    quote_id: String,
}

#[derive(Serialize)]
struct ResolveOrderResponse {
    quote_id: String,
    rfq_id: String,
    order_id: Uuid,
    status: String,
    synced: bool,
}

impl From<ResolveOrderResult> for ResolveOrderResponse {
    fn from(r: ResolveOrderResult) -> Self {
        Self {
            quote_id: r.quote_id,
            rfq_id: r.rfq_id,
            order_id: r.order_id,
            status: r.status.to_string(),
            synced: r.synced,
        }
    }
}

async fn create_rfq(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRfqRequest>,
) -> Result<Json<QuoteResponse>, String> {
    let cancel = CancellationToken::new();
    let quote = state
        .service
        .create_rfq(&req.client_id, &req.instrument, req.base_amount, &cancel)
        .await
        .map_err(|e| e.to_string())?;

    Ok(Json(QuoteResponse {
        quote_id: quote.quote_id,
        instrument: quote.instrument.to_string(),
        base_amount: quote.base_amount,
        quote_amount: quote.quote_amount,
    }))
}

async fn execute_rfq(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRfqRequest>,
) -> Result<Json<OrderResponse>, String> {
    let cancel = CancellationToken::new();
    let quote = Quote {
        quote_id: req.quote.quote_id,
        instrument: Instrument::canonicalize(&req.quote.instrument),
        base_amount: req.quote.base_amount,
        quote_amount: req.quote.quote_amount,
        expires_at: req.quote.expires_at,
    };

    let order: Order = state
        .service
        .execute_rfq(&req.client_id, quote, &cancel)
        .await
        .map_err(|e| e.to_string())?;

    Ok(Json(OrderResponse {
        order_id: order.order_id,
        status: order.status.to_string(),
    }))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, String> {
    let order = state
        .service
        .get_order(order_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "order not found".to_string())?;

    Ok(Json(OrderResponse {
        order_id: order.order_id,
        status: order.status.to_string(),
    }))
}

async fn resolve_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveOrderRequest>,
) -> Result<Json<ResolveOrderResponse>, String> {
    let cancel = CancellationToken::new();
    let result = state
        .service
        .resolve_order(&req.quote_id, &cancel)
        .await
        .map_err(|e| e.to_string())?;

    Ok(Json(result.into()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("venue_oauthfx_adapter=debug".parse()?)
                .add_directive("adapter_core=debug".parse()?),
        )
        .init();

    info!("Starting OAuth2 FX venue adapter service");

    let config = VenueOauthFxConfig::from_env();
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let http_client = reqwest::Client::builder()
        .timeout(config.base.request_timeout())
        .build()?;

    let rate_limiter = RateLimiter::new();
    rate_limiter.configure(
        &config.base.client_id,
        config.base.rate_limit.max_per_second,
        config.base.rate_limit.burst_size,
    );

    let executor = Arc::new(HttpExecutor::new(
        http_client.clone(),
        rate_limiter,
        RetryPolicy {
            max_attempts: config.base.max_retries,
            initial_backoff: std::time::Duration::from_millis(config.base.retry_backoff_ms),
            max_backoff: std::time::Duration::from_millis(config.base.max_retry_backoff_ms),
        },
    ));

    let resolver = Arc::new(ConfigResolver::new(
        Arc::new(InMemorySecretStore::new()),
        config.base.cache.clone(),
    ));

    let token_exchange = Arc::new(JwtClientCredentials::new(config.token_base_url.clone(), http_client));
    let tokens = Arc::new(TokenManager::new(token_exchange));

    let venue_client = Arc::new(OauthFxVenueClient::new(executor, resolver, tokens));
    let mapper: Arc<dyn Mapper> = Arc::new(OauthFxMapper::new());
    let trackers = ActiveTrackers::new();
    let store = Arc::new(InMemorySnapshotStore::new());
    let bus = Arc::new(RecordingEventBus::default());
    let legacy = Arc::new(RecordingLegacySink::new());
    let metrics = Arc::new(AdapterMetrics::new());

    let sync = Arc::new(TerminalSync::new(
        "venue-oauthfx",
        venue_client.clone(),
        mapper.clone(),
        trackers.clone(),
        store.clone(),
        bus,
        legacy,
        config.base.poll_interval(),
    ));

    let service = Arc::new(OrderService::new(
        venue_client,
        mapper,
        trackers,
        store,
        sync,
        metrics,
    ));

    let state = Arc::new(AppState { service });
    let app = Router::new()
        .route("/rfq", post(create_rfq))
        .route("/rfq/execute", post(execute_rfq))
        .route("/orders/:order_id", get(get_order))
        .route("/orders/resolve", post(resolve_order))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8082").await?;
    info!("OAuth2 FX venue adapter listening on 0.0.0.0:8082");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("OAuth2 FX venue adapter stopped");
    Ok(())
}
