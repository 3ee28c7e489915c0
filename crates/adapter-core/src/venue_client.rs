//! Per-venue execution contract
//!
//! Every venue crate provides exactly one [`VenueClient`] implementation.
//! [`crate::order_service::OrderService`] is generic over this trait and
//! never depends on a concrete venue; each venue binary depends on
//! `adapter_core` rather than vice versa.

use crate::error::{AdapterError, Result};
use crate::model::{ExecutionResult, Instrument, Quote};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

/// A venue's RFQ and order execution surface
#[async_trait]
pub trait VenueClient: Send + Sync {
    /// Request a quote for trading `base_amount` of `instrument`
    async fn create_rfq(
        &self,
        client_id: &str,
        instrument: &Instrument,
        base_amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Quote>;

    /// Accept a quote, turning it into a venue order. Returns the venue's
    /// own order id together with the raw status the venue reported at
    /// execution time, so the caller can decide whether the order is
    /// already terminal without a second round trip.
    async fn execute_rfq(
        &self,
        client_id: &str,
        quote_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult>;

    /// Poll the venue for an order's current status. Returns the raw,
    /// venue-specific status string unmapped; normalization is the
    /// [`crate::mapper::Mapper`]'s job, not the client's, so the raw value
    /// survives into the `status_changed` event payload.
    async fn fetch_status(
        &self,
        client_id: &str,
        venue_order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// Register `callback_url` as this client's webhook endpoint with the
    /// venue, so it pushes status updates instead of relying solely on
    /// polling. Only meaningful for push-capable venues; the default
    /// implementation reports the operation unsupported, which is what
    /// every poll-only venue client gets for free by not overriding it.
    async fn register_webhook(
        &self,
        client_id: &str,
        _callback_url: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Err(AdapterError::NotImplemented(format!(
            "venue does not support webhook registration (client {client_id})"
        )))
    }
}
