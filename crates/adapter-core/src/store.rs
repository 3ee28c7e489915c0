//! Order snapshot storage contract
//!
//! A production `main()` wires a Redis/SQL hybrid store behind this trait:
//! Redis for hot active-order lookups, SQL for the durable record. The
//! adapter runtime only needs the two operations below.

use crate::error::Result;
use crate::model::Order;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Durable storage for order snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist the current state of an order
    async fn put(&self, order: &Order) -> Result<()>;

    /// Fetch an order's last known snapshot, if any
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>>;

    /// Fetch an order by the venue's own order id, used to resolve an
    /// inbound webhook back to the internal order it belongs to.
    async fn get_by_venue_order_id(&self, venue_order_id: &str) -> Result<Option<Order>>;

    /// Fetch an order by the quote/RFQ id it was executed against, used by
    /// the reconciliation ("resolve order") call a caller makes when it
    /// has lost track of an order it created but never received an
    /// executed-order id for.
    async fn get_by_quote_id(&self, quote_id: &str) -> Result<Option<Order>>;
}

/// In-memory snapshot store, for tests and local development. Keeps
/// secondary indexes from venue order id and quote id to internal order
/// id so webhook and reconciliation lookups don't need a table scan.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    orders: Arc<DashMap<Uuid, Order>>,
    by_venue_order_id: Arc<DashMap<String, Uuid>>,
    by_quote_id: Arc<DashMap<String, Uuid>>,
}

impl InMemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn put(&self, order: &Order) -> Result<()> {
        if let Some(venue_order_id) = &order.venue_order_id {
            self.by_venue_order_id.insert(venue_order_id.clone(), order.order_id);
        }
        self.by_quote_id.insert(order.quote_id.clone(), order.order_id);
        self.orders.insert(order.order_id, order.clone());
        Ok(())
    }

    async fn get(&self, order_id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.get(&order_id).map(|o| o.value().clone()))
    }

    async fn get_by_venue_order_id(&self, venue_order_id: &str) -> Result<Option<Order>> {
        let Some(order_id) = self.by_venue_order_id.get(venue_order_id).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.orders.get(&order_id).map(|o| o.value().clone()))
    }

    async fn get_by_quote_id(&self, quote_id: &str) -> Result<Option<Order>> {
        let Some(order_id) = self.by_quote_id.get(quote_id).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.orders.get(&order_id).map(|o| o.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalStatus, Instrument};
    use chrono::Utc;

    #[tokio::test]
    async fn roundtrips_an_order() {
        let store = InMemorySnapshotStore::new();
        let order = Order {
            order_id: Uuid::new_v4(),
            client_id: "acme".to_string(),
            quote_id: "q-1".to_string(),
            venue_order_id: Some("v-1".to_string()),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: rust_decimal::Decimal::ONE,
            quote_amount: rust_decimal::Decimal::new(50_000, 0),
            status: CanonicalStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        store.put(&order).await.unwrap();
        let fetched = store.get(order.order_id).await.unwrap().unwrap();
        assert_eq!(fetched.client_id, "acme");
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn looks_up_by_venue_order_id() {
        let store = InMemorySnapshotStore::new();
        let order = Order {
            order_id: Uuid::new_v4(),
            client_id: "acme".to_string(),
            quote_id: "q-1".to_string(),
            venue_order_id: Some("v-42".to_string()),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: rust_decimal::Decimal::ONE,
            quote_amount: rust_decimal::Decimal::new(50_000, 0),
            status: CanonicalStatus::Submitted,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        store.put(&order).await.unwrap();
        let fetched = store.get_by_venue_order_id("v-42").await.unwrap().unwrap();
        assert_eq!(fetched.order_id, order.order_id);
        assert!(store.get_by_venue_order_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn looks_up_by_quote_id() {
        let store = InMemorySnapshotStore::new();
        let order = Order {
            order_id: Uuid::new_v4(),
            client_id: "acme".to_string(),
            quote_id: "q-99".to_string(),
            venue_order_id: Some("v-99".to_string()),
            instrument: Instrument::canonicalize("btc/usd"),
            base_amount: rust_decimal::Decimal::ONE,
            quote_amount: rust_decimal::Decimal::new(50_000, 0),
            status: CanonicalStatus::Submitted,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        store.put(&order).await.unwrap();
        let fetched = store.get_by_quote_id("q-99").await.unwrap().unwrap();
        assert_eq!(fetched.order_id, order.order_id);
        assert!(store.get_by_quote_id("missing").await.unwrap().is_none());
    }
}
