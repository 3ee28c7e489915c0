//! Core data model shared by every venue adapter

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A base/quote instrument, always stored and compared in canonical form:
/// uppercase `BASE/QUOTE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument(String);

impl Instrument {
    /// Canonicalize a raw venue symbol into `BASE/QUOTE` uppercase.
    /// Accepts `:` or `_` as a separator in addition to `/`, and accepts
    /// any input casing.
    pub fn canonicalize(raw: &str) -> Self {
        let upper = raw.to_uppercase();
        let normalized = upper.replace([':', '_'], "/");
        Self(normalized)
    }

    /// The canonical string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into (base, quote) if the instrument is well-formed
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once('/')
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A price quote for an instrument, as returned by a venue's RFQ creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Venue-assigned quote/RFQ identifier
    pub quote_id: String,
    /// Instrument the quote is for
    pub instrument: Instrument,
    /// Amount of base currency
    pub base_amount: Decimal,
    /// Amount of quote currency the venue will deliver/accept
    pub quote_amount: Decimal,
    /// When this quote expires
    pub expires_at: DateTime<Utc>,
}

impl Quote {
    /// Price is always derived as quote_amount / base_amount, never taken
    /// from a venue-supplied "rate" field. Zero when base_amount is zero.
    pub fn price(&self) -> Decimal {
        if self.base_amount.is_zero() {
            Decimal::ZERO
        } else {
            self.quote_amount / self.base_amount
        }
    }
}

/// The canonical status vocabulary every venue's raw status string is
/// normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    /// Order accepted by the adapter but not yet submitted to the venue
    Pending,
    /// Order submitted to the venue, awaiting execution
    Submitted,
    /// Order fully executed
    Filled,
    /// Order cancelled before execution
    Cancelled,
    /// Order rejected by the venue
    Rejected,
    /// Settlement funds are being returned to the originator
    Refunding,
    /// Settlement funds have been fully returned
    Refunded,
}

impl CanonicalStatus {
    /// Terminal statuses never transition further; the tracker removes its
    /// entry and the terminal sync writes a final record when it observes one.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CanonicalStatus::Filled
                | CanonicalStatus::Cancelled
                | CanonicalStatus::Rejected
                | CanonicalStatus::Refunded
        )
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CanonicalStatus::Pending => "pending",
            CanonicalStatus::Submitted => "submitted",
            CanonicalStatus::Filled => "filled",
            CanonicalStatus::Cancelled => "cancelled",
            CanonicalStatus::Rejected => "rejected",
            CanonicalStatus::Refunding => "refunding",
            CanonicalStatus::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

/// A trade order placed against a venue, identified both by our internal
/// id and the venue's own order id once known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal order id, generated at creation time
    pub order_id: Uuid,
    /// Client on whose behalf the order was placed
    pub client_id: String,
    /// Quote this order was executed against
    pub quote_id: String,
    /// Venue-assigned order id, populated once execute_rfq succeeds
    pub venue_order_id: Option<String>,
    /// Instrument being traded
    pub instrument: Instrument,
    /// Base amount from the quote this order was executed against
    pub base_amount: Decimal,
    /// Quote amount from the quote this order was executed against
    pub quote_amount: Decimal,
    /// Current canonical status
    pub status: CanonicalStatus,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the status was last updated
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Price derived from the order's settled amounts, never from a
    /// venue-supplied rate field.
    pub fn price(&self) -> Decimal {
        if self.base_amount.is_zero() {
            Decimal::ZERO
        } else {
            self.quote_amount / self.base_amount
        }
    }
}

/// The venue's own order id plus the raw status it reported at execution
/// time, as returned by [`crate::venue_client::VenueClient::execute_rfq`].
/// Carrying the raw status lets [`crate::order_service::OrderService`]
/// decide whether the order is already terminal without a second round
/// trip to the venue.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Venue-assigned order id
    pub venue_order_id: String,
    /// Raw, venue-specific status string as returned by the execute call
    pub raw_status: String,
}

/// Emitted every time a tracked order's normalized status changes,
/// including the first observation after execution. Published on
/// `evt.trade.status_changed.v1.<VENUE>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    /// Client on whose behalf the order was placed
    pub client_id: String,
    /// Internal order id
    pub order_id: Uuid,
    /// Quote the order was executed against
    pub quote_id: String,
    /// Normalized status at the time of observation
    pub status: CanonicalStatus,
    /// Raw venue status string, preserved for debugging and audit
    pub raw: String,
    /// When this status was observed
    pub updated_at: DateTime<Utc>,
}

/// A confirmation record written once an order reaches a terminal status,
/// the unit of work the terminal sync hands to the legacy trade sink and
/// the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConfirmation {
    /// The order this confirmation is for
    pub order_id: Uuid,
    /// Client on whose behalf the order was placed
    pub client_id: String,
    /// Venue-assigned order id
    pub venue_order_id: String,
    /// Instrument traded
    pub instrument: Instrument,
    /// Final canonical status, always terminal
    pub status: CanonicalStatus,
    /// Base amount actually settled
    pub base_amount: Decimal,
    /// Quote amount actually settled
    pub quote_amount: Decimal,
    /// Price derived from base/quote amounts
    pub price: Decimal,
    /// When the terminal status was observed
    pub settled_at: DateTime<Utc>,
}

/// Resolved, per-client secret material for a venue, as returned by the
/// secret store. The shape is venue-specific; adapters decode the fields
/// they need out of `fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Client this secret belongs to
    pub client_id: String,
    /// Arbitrary venue-specific key/value fields (api_key, base_url, ...)
    pub fields: HashMap<String, String>,
}

impl SecretRecord {
    /// Fetch a required field, turning a miss into a descriptive error
    pub fn require(&self, field: &str) -> crate::error::Result<&str> {
        self.fields
            .get(field)
            .map(|s| s.as_str())
            .ok_or_else(|| crate::error::AdapterError::CredentialResolution {
                client_id: self.client_id.clone(),
                reason: format!("missing required secret field `{field}`"),
            })
    }
}

/// Inbound webhook payload after signature verification, before
/// venue-specific decoding.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    /// Raw request body, as received
    pub body: Vec<u8>,
    /// Signature header value supplied by the venue
    pub signature: Option<String>,
}

/// Result of a reconciliation ("resolve order") call: a caller that has
/// lost track of an order it created looks it up by quote id, gets its
/// live status fetched and synced if terminal, and gets this back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveOrderResult {
    /// The quote/RFQ id the caller originally asked about
    pub quote_id: String,
    /// The provider RFQ id; identical to `quote_id` since a quote id is
    /// always the venue's own RFQ identifier
    pub rfq_id: String,
    /// The internal order id the quote was executed into
    pub order_id: Uuid,
    /// Canonical status observed at resolution time
    pub status: CanonicalStatus,
    /// True if this call performed a terminal sync (the observed status
    /// was terminal); false if the order is still in flight
    pub synced: bool,
}

/// Point-in-time snapshot of an adapter's counters, exposed over the
/// health/metrics surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterMetricsSnapshot {
    /// RFQs created
    pub rfqs_created: u64,
    /// RFQs executed into orders
    pub rfqs_executed: u64,
    /// Status polls performed
    pub status_polls: u64,
    /// Webhooks received
    pub webhooks_received: u64,
    /// Webhooks rejected for bad signatures
    pub webhooks_rejected: u64,
    /// Orders reaching a terminal status
    pub orders_settled: u64,
    /// Requests that were rate limited
    pub rate_limit_hits: u64,
    /// Requests that ultimately failed after retries
    pub request_failures: u64,
    /// Most recent error message, if any
    pub last_error: Option<String>,
}
