//! Terminal status synchronization
//!
//! Whether a terminal status is observed via polling or via a pushed
//! webhook, it goes through the same [`TerminalSync::finalize`] path:
//! build a [`TradeConfirmation`], persist it, publish it, upsert it into
//! the legacy ledger, and stop the order's tracker. Each of those four
//! effects happens at most once per order per terminal transition.

use crate::bus::{status_changed_subject, trade_confirmed_subject, EventBus};
use crate::error::Result;
use crate::legacy::LegacyTradeSink;
use crate::mapper::Mapper;
use crate::model::{CanonicalStatus, Order, StatusChangedEvent, TradeConfirmation};
use crate::store::SnapshotStore;
use crate::tracker::ActiveTrackers;
use crate::venue_client::VenueClient;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Coordinates a single venue's terminal-status handling: the poll loop,
/// the webhook fast path, and the shared finalize step both funnel through
/// here.
pub struct TerminalSync {
    venue_name: String,
    venue_client: Arc<dyn VenueClient>,
    mapper: Arc<dyn Mapper>,
    trackers: ActiveTrackers,
    store: Arc<dyn SnapshotStore>,
    bus: Arc<dyn EventBus>,
    legacy: Arc<dyn LegacyTradeSink>,
    poll_interval: std::time::Duration,
}

impl TerminalSync {
    /// Build a terminal sync coordinator for one venue
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        venue_name: impl Into<String>,
        venue_client: Arc<dyn VenueClient>,
        mapper: Arc<dyn Mapper>,
        trackers: ActiveTrackers,
        store: Arc<dyn SnapshotStore>,
        bus: Arc<dyn EventBus>,
        legacy: Arc<dyn LegacyTradeSink>,
        poll_interval: std::time::Duration,
    ) -> Self {
        Self {
            venue_name: venue_name.into(),
            venue_client,
            mapper,
            trackers,
            store,
            bus,
            legacy,
            poll_interval,
        }
    }

    /// Finalize an order whose execute response was already terminal.
    /// Called inline by [`crate::order_service::OrderService`] — no
    /// tracker is ever started for this order.
    pub async fn finalize_inline(&self, order: &Order) {
        self.finalize(order).await;
    }

    /// Poll the venue on an interval until the order reaches a terminal
    /// status or the tracker is cancelled out from under it (a webhook won
    /// the race). Intended to be spawned as its own task per order.
    ///
    /// `initial_raw` is the raw status observed when the order was
    /// executed; it is published as the first `status_changed` event
    /// before the first tick, so a caller sees the order's submitted
    /// status even if the venue takes a full poll interval to move it.
    pub async fn run_poll_loop(self: Arc<Self>, mut order: Order, initial_raw: String, cancel: CancellationToken) {
        let mut last_status: Option<CanonicalStatus> = None;
        self.observe(&mut order, &initial_raw, &mut last_status).await;

        if self.mapper.is_terminal(&initial_raw) {
            self.finalize(&order).await;
            return;
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(order_id = %order.order_id, "poll loop cancelled, webhook or shutdown won the race");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let venue_order_id = match &order.venue_order_id {
                Some(id) => id.clone(),
                None => {
                    warn!(order_id = %order.order_id, "poll loop running without a venue order id");
                    continue;
                }
            };

            let raw_status = match self
                .venue_client
                .fetch_status(&order.client_id, &venue_order_id, &cancel)
                .await
            {
                Ok(status) => status,
                Err(e) if e.is_permanent() => {
                    warn!(order_id = %order.order_id, error = %e, "permanent error polling status, stopping tracker");
                    self.trackers.stop(order.order_id);
                    return;
                }
                Err(e) => {
                    debug!(order_id = %order.order_id, error = %e, "transient error polling status, will retry");
                    continue;
                }
            };

            self.observe(&mut order, &raw_status, &mut last_status).await;

            if self.mapper.is_terminal(&raw_status) {
                self.finalize(&order).await;
                return;
            }
        }
    }

    /// Normalize `raw`, persist the snapshot, and — if the normalized
    /// status differs from `last_status` — publish a `status_changed`
    /// event and advance `last_status`. Shared by the initial observation
    /// and every subsequent tick of [`Self::run_poll_loop`].
    async fn observe(&self, order: &mut Order, raw: &str, last_status: &mut Option<CanonicalStatus>) {
        let status = self.mapper.normalize_status(raw).unwrap_or(order.status);
        order.status = status;
        order.updated_at = Utc::now();
        let _ = self.store.put(order).await;

        if Some(status) != *last_status {
            self.publish_status_changed(order, status, raw).await;
            *last_status = Some(status);
        }
    }

    async fn publish_status_changed(&self, order: &Order, status: CanonicalStatus, raw: &str) {
        let event = StatusChangedEvent {
            client_id: order.client_id.clone(),
            order_id: order.order_id,
            quote_id: order.quote_id.clone(),
            status,
            raw: raw.to_string(),
            updated_at: order.updated_at,
        };
        let subject = status_changed_subject(&self.venue_name);
        if let Err(e) = self.bus.publish_status_changed(&subject, &event).await {
            warn!(order_id = %order.order_id, error = %e, "status_changed publish failed");
        }
    }

    /// Apply a webhook-pushed status directly, preempting any in-flight
    /// poller for the same order. Returns the order's new status.
    pub async fn handle_webhook_status(&self, mut order: Order, raw_status: &str) -> Result<CanonicalStatus> {
        self.trackers.stop(order.order_id);

        let status = self.mapper.normalize_status(raw_status).unwrap_or(order.status);
        order.status = status;
        order.updated_at = Utc::now();
        self.store.put(&order).await?;

        self.publish_status_changed(&order, status, raw_status).await;

        if self.mapper.is_terminal(raw_status) {
            self.finalize(&order).await;
        }

        Ok(status)
    }

    /// Apply a freshly fetched status without preempting any in-flight
    /// poller — used by the reconciliation ("resolve order") path, which
    /// only needs to sync a terminal status if one is observed, not to
    /// race a still-running tracker for the same order.
    pub async fn sync_if_terminal(&self, mut order: Order, raw_status: &str) -> Result<CanonicalStatus> {
        let status = self.mapper.normalize_status(raw_status).unwrap_or(order.status);
        order.status = status;
        order.updated_at = Utc::now();
        self.store.put(&order).await?;

        if self.mapper.is_terminal(raw_status) {
            self.finalize(&order).await;
        }

        Ok(status)
    }

    async fn finalize(&self, order: &Order) {
        let Some(venue_order_id) = order.venue_order_id.clone() else {
            warn!(order_id = %order.order_id, "cannot finalize order with no venue order id");
            return;
        };

        let confirmation = TradeConfirmation {
            order_id: order.order_id,
            client_id: order.client_id.clone(),
            venue_order_id,
            instrument: order.instrument.clone(),
            status: order.status,
            base_amount: order.base_amount,
            quote_amount: order.quote_amount,
            price: order.price(),
            settled_at: Utc::now(),
        };

        if let Err(e) = self.legacy.upsert(&confirmation).await {
            warn!(order_id = %order.order_id, error = %e, "legacy ledger upsert failed");
        }

        let subject = trade_confirmed_subject(&self.venue_name, order.status);
        if let Err(e) = self.bus.publish_trade_confirmed(&subject, &confirmation).await {
            warn!(order_id = %order.order_id, error = %e, "event bus publish failed");
        }

        self.trackers.stop(order.order_id);
        info!(order_id = %order.order_id, status = %order.status, "order settled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RecordingEventBus;
    use crate::legacy::RecordingLegacySink;
    use crate::mapper::TableMapper;
    use crate::model::{Instrument, Quote};
    use crate::store::InMemorySnapshotStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    struct StubVenueClient;

    #[async_trait]
    impl VenueClient for StubVenueClient {
        async fn create_rfq(
            &self,
            _client_id: &str,
            _instrument: &Instrument,
            _base_amount: Decimal,
            _cancel: &CancellationToken,
        ) -> Result<Quote> {
            unimplemented!("not exercised by these tests")
        }

        async fn execute_rfq(
            &self,
            _client_id: &str,
            _quote_id: &str,
            _cancel: &CancellationToken,
        ) -> Result<crate::model::ExecutionResult> {
            unimplemented!("not exercised by these tests")
        }

        async fn fetch_status(
            &self,
            _client_id: &str,
            _venue_order_id: &str,
            _cancel: &CancellationToken,
        ) -> Result<String> {
            Ok("FILLED".to_string())
        }
    }

    fn make_sync() -> (Arc<TerminalSync>, Arc<RecordingLegacySink>, Arc<RecordingEventBus>) {
        let legacy = Arc::new(RecordingLegacySink::new());
        let bus = Arc::new(RecordingEventBus::default());
        let mapper = Arc::new(TableMapper::new(vec![("FILLED", CanonicalStatus::Filled)]));
        let sync = Arc::new(TerminalSync::new(
            "venue-latam",
            Arc::new(StubVenueClient),
            mapper,
            ActiveTrackers::new(),
            Arc::new(InMemorySnapshotStore::new()),
            bus.clone(),
            legacy.clone(),
            std::time::Duration::from_millis(1),
        ));
        (sync, legacy, bus)
    }

    fn make_order() -> Order {
        Order {
            order_id: Uuid::new_v4(),
            client_id: "acme".to_string(),
            quote_id: "q-1".to_string(),
            venue_order_id: Some("v-1".to_string()),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: Decimal::ONE,
            quote_amount: Decimal::new(50_000, 0),
            status: CanonicalStatus::Submitted,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn webhook_status_finalizes_terminal_orders_exactly_once() {
        let (sync, legacy, bus) = make_sync();
        let order = make_order();

        let status = sync.handle_webhook_status(order, "FILLED").await.unwrap();

        assert_eq!(status, CanonicalStatus::Filled);
        assert_eq!(legacy.distinct_orders(), 1);
        assert_eq!(bus.published.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn poll_loop_stops_after_terminal_status() {
        let (sync, legacy, _bus) = make_sync();
        let order = make_order();
        let cancel = CancellationToken::new();

        sync.run_poll_loop(order, "FILLED".to_string(), cancel).await;

        assert_eq!(legacy.distinct_orders(), 1);
    }

    #[tokio::test]
    async fn sync_if_terminal_does_not_finalize_a_non_terminal_status() {
        let (sync, legacy, bus) = make_sync();
        let order = make_order();
        let tracker = sync.trackers.start(order.order_id).unwrap();

        let status = sync.sync_if_terminal(order.clone(), "SUBMITTED").await.unwrap();

        assert_eq!(status, CanonicalStatus::Submitted);
        assert_eq!(legacy.distinct_orders(), 0);
        assert!(bus.published.lock().unwrap().is_empty());
        assert!(sync.trackers.is_active(order.order_id));
        tracker.cancel.cancel();
    }

    #[tokio::test]
    async fn sync_if_terminal_finalizes_and_stops_the_tracker_on_a_terminal_status() {
        let (sync, legacy, _bus) = make_sync();
        let order = make_order();
        sync.trackers.start(order.order_id).unwrap();

        let status = sync.sync_if_terminal(order.clone(), "FILLED").await.unwrap();

        assert_eq!(status, CanonicalStatus::Filled);
        assert_eq!(legacy.distinct_orders(), 1);
        assert!(!sync.trackers.is_active(order.order_id));
    }
}
