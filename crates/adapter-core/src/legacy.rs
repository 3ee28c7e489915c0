//! Legacy trade ledger upsert contract
//!
//! Settled trades must also land in the pre-existing trade ledger the rest
//! of the platform already reads from. The terminal sync upserts exactly
//! once per terminal transition through this trait; a production `main()`
//! wires the real ledger (a SQL table, typically) behind it.

use crate::error::Result;
use crate::model::TradeConfirmation;
use async_trait::async_trait;
use dashmap::DashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Upserts a settled trade into the legacy ledger
#[async_trait]
pub trait LegacyTradeSink: Send + Sync {
    /// Upsert a confirmation. Implementations must be safe to call more
    /// than once for the same `order_id` (idempotent upsert, not insert).
    async fn upsert(&self, confirmation: &TradeConfirmation) -> Result<()>;
}

/// In-memory sink that records which order ids it has seen, for asserting
/// the exactly-once-per-transition invariant in tests.
#[derive(Clone, Default)]
pub struct RecordingLegacySink {
    seen: Arc<DashSet<Uuid>>,
    pub upserts: Arc<std::sync::Mutex<Vec<TradeConfirmation>>>,
}

impl RecordingLegacySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct orders upserted so far
    pub fn distinct_orders(&self) -> usize {
        self.seen.len()
    }
}

#[async_trait]
impl LegacyTradeSink for RecordingLegacySink {
    async fn upsert(&self, confirmation: &TradeConfirmation) -> Result<()> {
        self.seen.insert(confirmation.order_id);
        self.upserts
            .lock()
            .expect("recording sink mutex poisoned")
            .push(confirmation.clone());
        Ok(())
    }
}
