//! Event bus publish contract
//!
//! The terminal sync publishes one event per settled order onto a subject
//! the rest of the trading platform subscribes to. The adapter runtime
//! never depends on a concrete bus; a production `main()` wires an
//! `async-nats`-backed publisher behind this trait, subject-keyed the same
//! way the rest of the platform's internal buses are.

use crate::error::Result;
use crate::model::{StatusChangedEvent, TradeConfirmation};
use async_trait::async_trait;

/// Shortens a crate-internal venue name (`venue-latam`) to the bare tag
/// used in bus subjects and log lines (`LATAM`).
fn venue_tag(venue: &str) -> String {
    venue.strip_prefix("venue-").unwrap_or(venue).to_uppercase()
}

/// Subject a `status_changed` transition is published to:
/// `evt.trade.status_changed.v1.<VENUE>`.
pub fn status_changed_subject(venue: &str) -> String {
    format!("evt.trade.status_changed.v1.{}", venue_tag(venue))
}

/// Subject a terminal trade confirmation is published to:
/// `evt.trade.<status>.v1.<VENUE>`, where `<status>` is one of
/// `filled`, `cancelled`, `rejected`, `refunded`.
pub fn trade_confirmed_subject(venue: &str, status: crate::model::CanonicalStatus) -> String {
    format!("evt.trade.{status}.v1.{}", venue_tag(venue))
}

/// Publishes domain events onto the platform's message bus
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a non-terminal (or first-observed) status transition
    async fn publish_status_changed(&self, subject: &str, event: &StatusChangedEvent) -> Result<()>;

    /// Publish a settled trade confirmation onto `subject`
    async fn publish_trade_confirmed(&self, subject: &str, confirmation: &TradeConfirmation) -> Result<()>;
}

/// In-memory bus that records published events, for tests
#[derive(Default)]
pub struct RecordingEventBus {
    pub status_changes: std::sync::Mutex<Vec<(String, StatusChangedEvent)>>,
    pub published: std::sync::Mutex<Vec<(String, TradeConfirmation)>>,
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish_status_changed(&self, subject: &str, event: &StatusChangedEvent) -> Result<()> {
        self.status_changes
            .lock()
            .expect("recording bus mutex poisoned")
            .push((subject.to_string(), event.clone()));
        Ok(())
    }

    async fn publish_trade_confirmed(&self, subject: &str, confirmation: &TradeConfirmation) -> Result<()> {
        self.published
            .lock()
            .expect("recording bus mutex poisoned")
            .push((subject.to_string(), confirmation.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalStatus, Instrument};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn recording_bus_records_publishes() {
        let bus = RecordingEventBus::default();
        let confirmation = TradeConfirmation {
            order_id: Uuid::new_v4(),
            client_id: "acme".to_string(),
            venue_order_id: "v-1".to_string(),
            instrument: Instrument::canonicalize("btc/usd"),
            status: CanonicalStatus::Filled,
            base_amount: Decimal::ONE,
            quote_amount: Decimal::new(50000, 0),
            price: Decimal::new(50000, 0),
            settled_at: Utc::now(),
        };

        bus.publish_trade_confirmed(&trade_confirmed_subject("venue-latam", CanonicalStatus::Filled), &confirmation)
            .await
            .unwrap();

        let published = bus.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "evt.trade.filled.v1.LATAM");
    }

    #[test]
    fn status_changed_subject_uses_venue_tag() {
        assert_eq!(status_changed_subject("venue-oauthfx"), "evt.trade.status_changed.v1.OAUTHFX");
    }
}
