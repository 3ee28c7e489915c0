//! Active order tracking
//!
//! Exactly one background poller runs per in-flight order at a time. A
//! webhook arriving for an order that's currently being polled cancels the
//! poller rather than letting both race to write the same terminal status.

use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A handle to an order's in-flight poller, held in [`ActiveTrackers`]
/// for as long as the order is non-terminal.
#[derive(Clone)]
pub struct ActiveTracker {
    /// Cancels the background poll loop for this order
    pub cancel: CancellationToken,
}

/// Concurrent map of order id to its active tracker. Insertion is
/// compare-and-set: [`ActiveTrackers::start`] returns `None` if a tracker
/// already exists for that order, which is how the order service enforces
/// at most one poller per order.
#[derive(Clone, Default)]
pub struct ActiveTrackers {
    trackers: Arc<DashMap<Uuid, ActiveTracker>>,
}

impl ActiveTrackers {
    /// Create an empty tracker table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tracker for `order_id`. Returns `None` without
    /// inserting if one is already registered.
    pub fn start(&self, order_id: Uuid) -> Option<ActiveTracker> {
        use dashmap::mapref::entry::Entry;

        match self.trackers.entry(order_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let tracker = ActiveTracker {
                    cancel: CancellationToken::new(),
                };
                slot.insert(tracker.clone());
                Some(tracker)
            }
        }
    }

    /// Cancel and remove an order's tracker if one exists. Removal is
    /// idempotent: calling this twice for the same order (e.g. once from
    /// the webhook, once from the poller's own cleanup) is safe.
    pub fn stop(&self, order_id: Uuid) {
        if let Some((_, tracker)) = self.trackers.remove(&order_id) {
            tracker.cancel.cancel();
        }
    }

    /// True if a tracker is currently registered for `order_id`
    pub fn is_active(&self, order_id: Uuid) -> bool {
        self.trackers.contains_key(&order_id)
    }

    /// Number of in-flight trackers, for health reporting
    pub fn active_count(&self) -> usize {
        self.trackers.len()
    }
}
