//! LATAM venue adapter service binary

use adapter_core::bus::RecordingEventBus;
use adapter_core::config_resolver::ConfigResolver;
use adapter_core::http_executor::{HttpExecutor, RetryPolicy};
use adapter_core::legacy::RecordingLegacySink;
use adapter_core::mapper::Mapper;
use adapter_core::metrics::AdapterMetrics;
use adapter_core::model::{Order, Quote, ResolveOrderResult, WebhookEnvelope};
use adapter_core::order_service::OrderService;
use adapter_core::rate_limit::RateLimiter;
use adapter_core::secrets::InMemorySecretStore;
use adapter_core::store::InMemorySnapshotStore;
use adapter_core::terminal_sync::TerminalSync;
use adapter_core::tracker::ActiveTrackers;
use adapter_core::venue_client::VenueClient;
use adapter_core::webhook::WebhookIntake;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use venue_latam::{LatamMapper, LatamVenueClient, VenueLatamConfig};

struct AppState {
    service: Arc<OrderService>,
    webhook: WebhookIntake,
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
        instrument: adapter_core::model::Instrument::canonicalize(&req.quote.instrument),
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

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(state.webhook.signature_header())
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let envelope = WebhookEnvelope {
        body: body.to_vec(),
        signature,
    };

    match state.webhook.process(&state.service, &envelope).await {
        Ok(()) => StatusCode::OK,
        Err(e) if matches!(e, adapter_core::error::AdapterError::SignatureInvalid) => StatusCode::UNAUTHORIZED,
        Err(e) => {
            warn!(error = %e, "webhook request rejected");
            StatusCode::BAD_REQUEST
        }
    }
}

/// Registers `callback_url` as the webhook endpoint for every client the
/// secret store currently knows about. Best-effort: a client whose
/// registration call fails is logged and skipped rather than aborting
/// startup, since that client simply falls back to polling alone.
async fn register_webhooks(resolver: &ConfigResolver, venue_client: &dyn VenueClient, callback_url: &str) {
    let clients = match resolver.discover_clients().await {
        Ok(clients) => clients,
        Err(e) => {
            warn!(error = %e, "failed to discover clients for webhook registration");
            return;
        }
    };

    let cancel = CancellationToken::new();
    for client_id in clients {
        if let Err(e) = venue_client.register_webhook(&client_id, callback_url, &cancel).await {
            warn!(client_id = %client_id, error = %e, "webhook registration failed");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("venue_latam_adapter=debug".parse()?)
                .add_directive("adapter_core=debug".parse()?),
        )
        .init();

    info!("Starting LATAM venue adapter service");

    let config = VenueLatamConfig::from_env();
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
        http_client,
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

    let venue_client = Arc::new(LatamVenueClient::new(executor, resolver.clone()));

    if let Some(callback_url) = config.base.webhook.callback_url.clone() {
        register_webhooks(&resolver, venue_client.as_ref(), &callback_url).await;
    }

    let mapper: Arc<dyn Mapper> = Arc::new(LatamMapper::new());
    let trackers = ActiveTrackers::new();
    let store = Arc::new(InMemorySnapshotStore::new());
    let bus = Arc::new(RecordingEventBus::default());
    let legacy = Arc::new(RecordingLegacySink::new());
    let metrics = Arc::new(AdapterMetrics::new());

    let sync = Arc::new(TerminalSync::new(
        "venue-latam",
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

    let webhook = WebhookIntake::new(config.base.webhook.clone());
    let state = Arc::new(AppState { service, webhook });
    let app = Router::new()
        .route("/rfq", post(create_rfq))
        .route("/rfq/execute", post(execute_rfq))
        .route("/orders/:order_id", get(get_order))
        .route("/orders/resolve", post(resolve_order))
        .route("/webhooks/status", post(handle_webhook))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8081").await?;
    info!("LATAM venue adapter listening on 0.0.0.0:8081");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("LATAM venue adapter stopped");
    Ok(())
}
