//! Inbound webhook signature verification
//!
//! Venues that support push notifications sign the request body with
//! HMAC-SHA256 over a shared secret. We verify in constant time to avoid
//! leaking timing information about how much of the signature matched.

use crate::config::WebhookConfig;
use crate::error::{AdapterError, Result};
use crate::model::WebhookEnvelope;
use crate::order_service::OrderService;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Venue push payload shape: `{"event": "...", "data": {"id": "...", "status": "..."}}`.
/// Venues vary their field names for the status string itself; the
/// concrete venue binary is responsible for mapping its own wire shape
/// onto this one before calling [`WebhookIntake::process`].
#[derive(Debug, Deserialize)]
pub struct VenuePushPayload {
    /// Venue-assigned event type, logged but not otherwise interpreted
    pub event: String,
    /// The order this push is about
    pub data: VenueOrderPush,
}

/// The order id and raw status carried by a push payload
#[derive(Debug, Deserialize)]
pub struct VenueOrderPush {
    /// Venue-assigned order id
    pub id: String,
    /// Raw, venue-specific status string
    pub status: String,
}

/// Verifies inbound webhook signatures against a configured secret and
/// drives the order service with the resulting push
pub struct WebhookIntake {
    config: WebhookConfig,
}

impl WebhookIntake {
    /// Build an intake over the given webhook configuration
    pub fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    /// Verify a webhook envelope's signature, returning the raw body on
    /// success. Errors with [`AdapterError::SignatureInvalid`] if the
    /// signature is missing, malformed hex, or does not match. Accepts an
    /// optional `sha256=` prefix on the header value, matched
    /// case-insensitively and after trimming whitespace, since some
    /// venues prefix their signature header that way.
    pub fn verify(&self, envelope: &WebhookEnvelope) -> Result<&[u8]> {
        let secret = self.config.signing_secret.as_ref().ok_or_else(|| {
            AdapterError::Configuration("webhook signing_secret not configured".to_string())
        })?;

        let signature_hex = envelope.signature.as_deref().ok_or(AdapterError::SignatureInvalid)?;
        let signature_hex = signature_hex.trim();
        let signature_hex = signature_hex
            .get(..7)
            .filter(|prefix| prefix.eq_ignore_ascii_case("sha256="))
            .map(|_| &signature_hex[7..])
            .unwrap_or(signature_hex);
        let provided = hex::decode(signature_hex).map_err(|_| AdapterError::SignatureInvalid)?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AdapterError::Configuration(format!("invalid webhook secret: {e}")))?;
        mac.update(&envelope.body);
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(&provided).into() {
            Ok(&envelope.body)
        } else {
            Err(AdapterError::SignatureInvalid)
        }
    }

    /// The header name the venue is expected to carry its signature in
    pub fn signature_header(&self) -> &str {
        &self.config.signature_header
    }

    /// Verify and process an inbound webhook end to end: check the
    /// signature, parse the body, and hand the push to `service`. A bad
    /// signature or unparseable body is returned to the caller so the
    /// HTTP handler can answer with 401/400; once those two checks pass,
    /// downstream failures (unknown order, store errors) are logged and
    /// swallowed, since the venue has no use for a 5xx on an order it
    /// already considers delivered.
    pub async fn process(&self, service: &OrderService, envelope: &WebhookEnvelope) -> Result<()> {
        let body = self.verify(envelope)?;
        let payload: VenuePushPayload =
            serde_json::from_slice(body).map_err(|e| AdapterError::InvalidRequest(format!("invalid webhook body: {e}")))?;

        if let Err(e) = service.handle_status_push(&payload.data.id, &payload.data.status).await {
            warn!(event = %payload.event, venue_order_id = %payload.data.id, error = %e, "webhook processing failed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    fn config_with_secret(secret: &str) -> WebhookConfig {
        WebhookConfig {
            callback_url: Some("https://example.com/hooks".to_string()),
            signing_secret: Some(secret.to_string()),
            signature_header: "X-Rio-Signature".to_string(),
        }
    }

    #[test]
    fn accepts_a_correctly_signed_body() {
        let body = b"{\"order_id\":\"1\"}".to_vec();
        let signature = sign("shh", &body);
        let intake = WebhookIntake::new(config_with_secret("shh"));

        let envelope = WebhookEnvelope {
            body,
            signature: Some(signature),
        };

        assert!(intake.verify(&envelope).is_ok());
    }

    #[test]
    fn rejects_a_tampered_body() {
        let body = b"{\"order_id\":\"1\"}".to_vec();
        let signature = sign("shh", &body);
        let intake = WebhookIntake::new(config_with_secret("shh"));

        let envelope = WebhookEnvelope {
            body: b"{\"order_id\":\"2\"}".to_vec(),
            signature: Some(signature),
        };

        assert!(matches!(intake.verify(&envelope), Err(AdapterError::SignatureInvalid)));
    }

    #[test]
    fn rejects_a_missing_signature() {
        let intake = WebhookIntake::new(config_with_secret("shh"));
        let envelope = WebhookEnvelope {
            body: b"body".to_vec(),
            signature: None,
        };
        assert!(matches!(intake.verify(&envelope), Err(AdapterError::SignatureInvalid)));
    }

    #[test]
    fn accepts_an_optional_sha256_prefix_case_insensitively() {
        let body = b"{\"order_id\":\"1\"}".to_vec();
        let signature = sign("shh", &body);
        let intake = WebhookIntake::new(config_with_secret("shh"));

        let envelope = WebhookEnvelope {
            body,
            signature: Some(format!("SHA256={signature}")),
        };

        assert!(intake.verify(&envelope).is_ok());
    }

    mod process {
        use super::*;
        use crate::bus::RecordingEventBus;
        use crate::legacy::RecordingLegacySink;
        use crate::mapper::{Mapper, TableMapper};
        use crate::model::{CanonicalStatus, ExecutionResult, Instrument, Quote};
        use crate::order_service::OrderService;
        use crate::store::InMemorySnapshotStore;
        use crate::terminal_sync::TerminalSync;
        use crate::tracker::ActiveTrackers;
        use crate::venue_client::VenueClient;
        use crate::metrics::AdapterMetrics;
        use async_trait::async_trait;
        use chrono::Utc;
        use rust_decimal::Decimal;
        use tokio_util::sync::CancellationToken;

        struct StubVenueClient;

        #[async_trait]
        impl VenueClient for StubVenueClient {
            async fn create_rfq(
                &self,
                _client_id: &str,
                _instrument: &Instrument,
                _base_amount: Decimal,
                _cancel: &CancellationToken,
            ) -> crate::error::Result<Quote> {
                unimplemented!("not exercised by these tests")
            }

            async fn execute_rfq(
                &self,
                _client_id: &str,
                _quote_id: &str,
                _cancel: &CancellationToken,
            ) -> crate::error::Result<ExecutionResult> {
                Ok(ExecutionResult {
                    venue_order_id: "v-1".to_string(),
                    raw_status: "SUBMITTED".to_string(),
                })
            }

            async fn fetch_status(
                &self,
                _client_id: &str,
                _venue_order_id: &str,
                _cancel: &CancellationToken,
            ) -> crate::error::Result<String> {
                Ok("SUBMITTED".to_string())
            }
        }

        async fn make_service_with_order() -> (OrderService, String) {
            let mapper: std::sync::Arc<dyn Mapper> = std::sync::Arc::new(TableMapper::new(vec![
                ("SUBMITTED", CanonicalStatus::Submitted),
                ("FILLED", CanonicalStatus::Filled),
            ]));
            let store: std::sync::Arc<dyn crate::store::SnapshotStore> = std::sync::Arc::new(InMemorySnapshotStore::new());
            let trackers = ActiveTrackers::new();
            let legacy = std::sync::Arc::new(RecordingLegacySink::new());
            let bus = std::sync::Arc::new(RecordingEventBus::default());
            let venue_client: std::sync::Arc<dyn VenueClient> = std::sync::Arc::new(StubVenueClient);

            let sync = std::sync::Arc::new(TerminalSync::new(
                "venue-latam",
                venue_client.clone(),
                mapper.clone(),
                trackers.clone(),
                store.clone(),
                bus,
                legacy,
                std::time::Duration::from_millis(1),
            ));
            let metrics = std::sync::Arc::new(AdapterMetrics::new());
            let service = OrderService::new(venue_client, mapper, trackers, store, sync, metrics);

            let cancel = CancellationToken::new();
            let quote = Quote {
                quote_id: "q-1".to_string(),
                instrument: Instrument::canonicalize("btc/usd"),
                base_amount: Decimal::ONE,
                quote_amount: Decimal::new(50_000, 0),
                expires_at: Utc::now(),
            };
            let order = service.execute_rfq("acme", quote, &cancel).await.unwrap();
            (service, order.venue_order_id.unwrap())
        }

        #[tokio::test]
        async fn rejects_with_bad_signature() {
            let (service, _venue_order_id) = make_service_with_order().await;
            let intake = WebhookIntake::new(config_with_secret("shh"));
            let envelope = WebhookEnvelope {
                body: b"{}".to_vec(),
                signature: None,
            };

            let result = intake.process(&service, &envelope).await;
            assert!(matches!(result, Err(AdapterError::SignatureInvalid)));
        }

        #[tokio::test]
        async fn rejects_unparseable_body_as_invalid_request() {
            let (service, _venue_order_id) = make_service_with_order().await;
            let body = b"not json".to_vec();
            let signature = sign("shh", &body);
            let intake = WebhookIntake::new(config_with_secret("shh"));
            let envelope = WebhookEnvelope { body, signature: Some(signature) };

            let result = intake.process(&service, &envelope).await;
            assert!(matches!(result, Err(AdapterError::InvalidRequest(_))));
        }

        #[tokio::test]
        async fn applies_a_valid_push_to_the_matching_order() {
            let (service, venue_order_id) = make_service_with_order().await;
            let body = serde_json::to_vec(&serde_json::json!({
                "event": "order.updated",
                "data": {"id": venue_order_id, "status": "FILLED"},
            }))
            .unwrap();
            let signature = sign("shh", &body);
            let intake = WebhookIntake::new(config_with_secret("shh"));
            let envelope = WebhookEnvelope { body, signature: Some(signature) };

            assert!(intake.process(&service, &envelope).await.is_ok());
        }
    }
}
