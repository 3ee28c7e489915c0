//! Top-level order lifecycle orchestration
//!
//! Wires a venue's [`VenueClient`] and [`Mapper`] together with the shared
//! tracker table, snapshot store, bus and legacy sink into the three
//! operations a venue binary's HTTP surface exposes: request a quote,
//! execute it into an order, and accept a pushed status update.

use crate::error::{AdapterError, Result};
use crate::mapper::Mapper;
use crate::metrics::AdapterMetrics;
use crate::model::{CanonicalStatus, Instrument, Order, Quote};
use crate::store::SnapshotStore;
use crate::terminal_sync::TerminalSync;
use crate::tracker::ActiveTrackers;
use crate::venue_client::VenueClient;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Orchestrates RFQ creation, execution, and status handling for one venue
pub struct OrderService {
    venue_client: Arc<dyn VenueClient>,
    mapper: Arc<dyn Mapper>,
    trackers: ActiveTrackers,
    store: Arc<dyn SnapshotStore>,
    sync: Arc<TerminalSync>,
    metrics: Arc<AdapterMetrics>,
}

impl OrderService {
    /// Build an order service for one venue
    pub fn new(
        venue_client: Arc<dyn VenueClient>,
        mapper: Arc<dyn Mapper>,
        trackers: ActiveTrackers,
        store: Arc<dyn SnapshotStore>,
        sync: Arc<TerminalSync>,
        metrics: Arc<AdapterMetrics>,
    ) -> Self {
        Self {
            venue_client,
            mapper,
            trackers,
            store,
            sync,
            metrics,
        }
    }

    /// Request a quote for trading `base_amount` of a raw venue symbol
    pub async fn create_rfq(
        &self,
        client_id: &str,
        raw_instrument: &str,
        base_amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Quote> {
        let instrument = self.mapper.normalize_instrument(raw_instrument);
        let result = self
            .venue_client
            .create_rfq(client_id, &instrument, base_amount, cancel)
            .await;

        match &result {
            Ok(_) => self.metrics.record_rfq_created(),
            Err(e) => self.metrics.record_failure(e.to_string()),
        }

        result
    }

    /// Accept a quote, execute it against the venue, and start tracking
    /// the resulting order until it reaches a terminal status. If the
    /// venue's execute response is already terminal (e.g. a synchronous
    /// fill), the order is finalized inline and no tracker is ever started.
    pub async fn execute_rfq(
        &self,
        client_id: &str,
        quote: Quote,
        cancel: &CancellationToken,
    ) -> Result<Order> {
        let exec = self
            .venue_client
            .execute_rfq(client_id, &quote.quote_id, cancel)
            .await
            .inspect_err(|e| self.metrics.record_failure(e.to_string()))?;

        self.metrics.record_rfq_executed();

        let now = Utc::now();
        let status = self.mapper.normalize_status(&exec.raw_status).unwrap_or(CanonicalStatus::Submitted);
        let order = Order {
            order_id: Uuid::new_v4(),
            client_id: client_id.to_string(),
            quote_id: quote.quote_id.clone(),
            venue_order_id: Some(exec.venue_order_id),
            instrument: quote.instrument.clone(),
            base_amount: quote.base_amount,
            quote_amount: quote.quote_amount,
            status,
            created_at: now,
            updated_at: now,
        };

        self.store.put(&order).await?;

        if self.mapper.is_terminal(&exec.raw_status) {
            self.sync.finalize_inline(&order).await;
            return Ok(order);
        }

        let Some(tracker) = self.trackers.start(order.order_id) else {
            return Err(AdapterError::Internal(format!(
                "tracker already active for order {}",
                order.order_id
            )));
        };

        let sync = self.sync.clone();
        let spawned_order = order.clone();
        let initial_raw = exec.raw_status.clone();
        tokio::spawn(async move {
            sync.run_poll_loop(spawned_order, initial_raw, tracker.cancel).await;
        });

        Ok(order)
    }

    /// Handle a pushed status update, resolving the venue's order id back
    /// to the tracked order and preempting any in-flight poller for it.
    pub async fn handle_status_push(&self, venue_order_id: &str, raw_status: &str) -> Result<CanonicalStatus> {
        self.metrics.record_webhook_received();

        let result = async {
            let order = self
                .store
                .get_by_venue_order_id(venue_order_id)
                .await?
                .ok_or_else(|| AdapterError::NotFound(format!("no order for venue order id {venue_order_id}")))?;
            self.sync.handle_webhook_status(order, raw_status).await
        }
        .await;

        if let Err(e) = &result {
            self.metrics.record_failure(e.to_string());
        }
        result
    }

    /// Fetch an order's last known snapshot
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
        self.store.get(order_id).await
    }

    /// Reconciliation call for a caller that has lost track of an order:
    /// look the order up by the quote it was executed against, fetch its
    /// live status from the venue, and run terminal sync if that status
    /// is terminal. Safe to call repeatedly — it goes through the same
    /// idempotent finalize path a webhook or poller tick would.
    pub async fn resolve_order(&self, quote_id: &str, cancel: &CancellationToken) -> Result<crate::model::ResolveOrderResult> {
        let order = self
            .store
            .get_by_quote_id(quote_id)
            .await?
            .ok_or_else(|| AdapterError::NotFound(format!("no order for quote id {quote_id}")))?;

        let venue_order_id = order.venue_order_id.clone().ok_or_else(|| {
            AdapterError::NotFound(format!("order for quote id {quote_id} has no provider order id yet"))
        })?;

        let raw_status = self
            .venue_client
            .fetch_status(&order.client_id, &venue_order_id, cancel)
            .await
            .inspect_err(|e| self.metrics.record_failure(e.to_string()))?;

        let synced = self.mapper.is_terminal(&raw_status);
        let status = self.sync.sync_if_terminal(order.clone(), &raw_status).await?;

        Ok(crate::model::ResolveOrderResult {
            quote_id: quote_id.to_string(),
            rfq_id: quote_id.to_string(),
            order_id: order.order_id,
            status,
            synced,
        })
    }

    /// True if the instrument is syntactically well-formed after
    /// normalization (has a base and a quote side)
    pub fn validate_instrument(&self, raw: &str) -> Result<Instrument> {
        let instrument = self.mapper.normalize_instrument(raw);
        if instrument.parts().is_none() {
            return Err(AdapterError::InvalidRequest(format!(
                "instrument `{raw}` does not normalize to BASE/QUOTE"
            )));
        }
        Ok(instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RecordingEventBus;
    use crate::legacy::RecordingLegacySink;
    use crate::mapper::TableMapper;
    use crate::model::ExecutionResult;
    use crate::store::InMemorySnapshotStore;
    use async_trait::async_trait;

    struct StubVenueClient {
        raw_status: &'static str,
    }

    #[async_trait]
    impl VenueClient for StubVenueClient {
        async fn create_rfq(
            &self,
            _client_id: &str,
            instrument: &Instrument,
            base_amount: Decimal,
            _cancel: &CancellationToken,
        ) -> Result<Quote> {
            Ok(Quote {
                quote_id: "q-1".to_string(),
                instrument: instrument.clone(),
                base_amount,
                quote_amount: base_amount * Decimal::new(50_000, 0),
                expires_at: Utc::now(),
            })
        }

        async fn execute_rfq(&self, _client_id: &str, _quote_id: &str, _cancel: &CancellationToken) -> Result<ExecutionResult> {
            Ok(ExecutionResult {
                venue_order_id: "v-1".to_string(),
                raw_status: self.raw_status.to_string(),
            })
        }

        async fn fetch_status(&self, _client_id: &str, _venue_order_id: &str, _cancel: &CancellationToken) -> Result<String> {
            Ok(self.raw_status.to_string())
        }
    }

    fn make_service(raw_status: &'static str) -> (Arc<OrderService>, Arc<RecordingLegacySink>, ActiveTrackers) {
        let mapper: Arc<dyn Mapper> = Arc::new(TableMapper::new(vec![
            ("SUBMITTED", CanonicalStatus::Submitted),
            ("FILLED", CanonicalStatus::Filled),
        ]));
        let store: Arc<dyn SnapshotStore> = Arc::new(InMemorySnapshotStore::new());
        let trackers = ActiveTrackers::new();
        let legacy = Arc::new(RecordingLegacySink::new());
        let bus = Arc::new(RecordingEventBus::default());
        let venue_client: Arc<dyn VenueClient> = Arc::new(StubVenueClient { raw_status });

        let sync = Arc::new(TerminalSync::new(
            "venue-latam",
            venue_client.clone(),
            mapper.clone(),
            trackers.clone(),
            store.clone(),
            bus.clone(),
            legacy.clone(),
            std::time::Duration::from_millis(1),
        ));

        let metrics = Arc::new(AdapterMetrics::new());
        let service = Arc::new(OrderService::new(venue_client, mapper, trackers.clone(), store, sync, metrics));
        (service, legacy, trackers)
    }

    #[tokio::test]
    async fn execute_rfq_starts_a_tracker_for_non_terminal_status() {
        let (service, legacy, trackers) = make_service("SUBMITTED");
        let cancel = CancellationToken::new();
        let quote = Quote {
            quote_id: "q-1".to_string(),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: Decimal::ONE,
            quote_amount: Decimal::new(50_000, 0),
            expires_at: Utc::now(),
        };

        let order = service.execute_rfq("acme", quote, &cancel).await.unwrap();

        assert_eq!(order.status, CanonicalStatus::Submitted);
        assert!(trackers.is_active(order.order_id));
        assert_eq!(legacy.distinct_orders(), 0);
    }

    #[tokio::test]
    async fn execute_rfq_finalizes_inline_when_already_terminal() {
        let (service, legacy, trackers) = make_service("FILLED");
        let cancel = CancellationToken::new();
        let quote = Quote {
            quote_id: "q-1".to_string(),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: Decimal::ONE,
            quote_amount: Decimal::new(50_000, 0),
            expires_at: Utc::now(),
        };

        let order = service.execute_rfq("acme", quote, &cancel).await.unwrap();

        assert_eq!(order.status, CanonicalStatus::Filled);
        assert!(!trackers.is_active(order.order_id));
        assert_eq!(legacy.distinct_orders(), 1);
    }

    #[tokio::test]
    async fn handle_status_push_resolves_by_venue_order_id() {
        let (service, legacy, _trackers) = make_service("SUBMITTED");
        let cancel = CancellationToken::new();
        let quote = Quote {
            quote_id: "q-1".to_string(),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: Decimal::ONE,
            quote_amount: Decimal::new(50_000, 0),
            expires_at: Utc::now(),
        };
        let order = service.execute_rfq("acme", quote, &cancel).await.unwrap();

        let status = service
            .handle_status_push(order.venue_order_id.as_deref().unwrap(), "FILLED")
            .await
            .unwrap();

        assert_eq!(status, CanonicalStatus::Filled);
        assert_eq!(legacy.distinct_orders(), 1);
    }

    #[tokio::test]
    async fn handle_status_push_for_unknown_venue_order_id_returns_not_found() {
        let (service, _legacy, _trackers) = make_service("SUBMITTED");
        let result = service.handle_status_push("does-not-exist", "FILLED").await;
        assert!(matches!(result, Err(AdapterError::NotFound(_))));
    }

    #[tokio::test]
    async fn resolve_order_reports_unsynced_while_still_in_flight() {
        let (service, legacy, trackers) = make_service("SUBMITTED");
        let cancel = CancellationToken::new();
        let quote = Quote {
            quote_id: "q-1".to_string(),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: Decimal::ONE,
            quote_amount: Decimal::new(50_000, 0),
            expires_at: Utc::now(),
        };
        let order = service.execute_rfq("acme", quote, &cancel).await.unwrap();

        let result = service.resolve_order("q-1", &cancel).await.unwrap();

        assert_eq!(result.order_id, order.order_id);
        assert_eq!(result.quote_id, "q-1");
        assert_eq!(result.status, CanonicalStatus::Submitted);
        assert!(!result.synced);
        assert!(trackers.is_active(order.order_id));
        assert_eq!(legacy.distinct_orders(), 0);
    }

    #[tokio::test]
    async fn resolve_order_syncs_and_stops_the_tracker_once_terminal() {
        let (service, legacy, trackers) = make_service("FILLED");
        let cancel = CancellationToken::new();
        let quote = Quote {
            quote_id: "q-1".to_string(),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: Decimal::ONE,
            quote_amount: Decimal::new(50_000, 0),
            expires_at: Utc::now(),
        };
        let order = service.execute_rfq("acme", quote, &cancel).await.unwrap();

        let result = service.resolve_order("q-1", &cancel).await.unwrap();

        assert_eq!(result.status, CanonicalStatus::Filled);
        assert!(result.synced);
        assert!(!trackers.is_active(order.order_id));
        assert_eq!(legacy.distinct_orders(), 1);
    }

    #[tokio::test]
    async fn resolve_order_for_unknown_quote_id_returns_not_found() {
        let (service, _legacy, _trackers) = make_service("SUBMITTED");
        let cancel = CancellationToken::new();
        let result = service.resolve_order("does-not-exist", &cancel).await;
        assert!(matches!(result, Err(AdapterError::NotFound(_))));
    }
}
