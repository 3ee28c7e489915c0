//! Adapter performance counters and health reporting

use crate::model::AdapterMetricsSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Atomic counters backing a running adapter's metrics. Cheap to update
/// from any task without a lock; [`AdapterMetrics::snapshot`] assembles a
/// point-in-time [`AdapterMetricsSnapshot`] for the health surface.
#[derive(Default)]
pub struct AdapterMetrics {
    rfqs_created: AtomicU64,
    rfqs_executed: AtomicU64,
    status_polls: AtomicU64,
    webhooks_received: AtomicU64,
    webhooks_rejected: AtomicU64,
    orders_settled: AtomicU64,
    rate_limit_hits: AtomicU64,
    request_failures: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl AdapterMetrics {
    /// Create a zeroed counter set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rfq_created(&self) {
        self.rfqs_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rfq_executed(&self) {
        self.rfqs_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_poll(&self) {
        self.status_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_webhook_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_webhook_rejected(&self) {
        self.webhooks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_settled(&self) {
        self.orders_settled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_hit(&self) {
        self.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, message: String) {
        self.request_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock().expect("metrics mutex poisoned") = Some(message);
    }

    /// Point-in-time snapshot suitable for serialization onto a health endpoint
    pub fn snapshot(&self) -> AdapterMetricsSnapshot {
        AdapterMetricsSnapshot {
            rfqs_created: self.rfqs_created.load(Ordering::Relaxed),
            rfqs_executed: self.rfqs_executed.load(Ordering::Relaxed),
            status_polls: self.status_polls.load(Ordering::Relaxed),
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            webhooks_rejected: self.webhooks_rejected.load(Ordering::Relaxed),
            orders_settled: self.orders_settled.load(Ordering::Relaxed),
            rate_limit_hits: self.rate_limit_hits.load(Ordering::Relaxed),
            request_failures: self.request_failures.load(Ordering::Relaxed),
            last_error: self.last_error.lock().expect("metrics mutex poisoned").clone(),
        }
    }
}

/// Coarse health classification derived from recent metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// No recent failures
    Healthy,
    /// Some failures, but still making progress
    Degraded,
    /// Failing consistently
    Unhealthy,
}

/// Adapter health, assembled from the metrics snapshot and tracker count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterHealth {
    /// Overall status
    pub status: HealthStatus,
    /// Metrics snapshot backing the status
    pub metrics: AdapterMetricsSnapshot,
    /// Number of orders currently being tracked
    pub active_orders: usize,
}

impl AdapterHealth {
    /// Derive health from a metrics snapshot and the active tracker count
    pub fn from_snapshot(metrics: AdapterMetricsSnapshot, active_orders: usize) -> Self {
        let attempted = metrics.rfqs_created.max(1);
        let failure_ratio = metrics.request_failures as f64 / attempted as f64;

        let status = if failure_ratio == 0.0 {
            HealthStatus::Healthy
        } else if failure_ratio < 0.5 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };

        Self {
            status,
            metrics,
            active_orders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_counters() {
        let metrics = AdapterMetrics::new();
        metrics.record_rfq_created();
        metrics.record_rfq_created();
        metrics.record_failure("boom".to_string());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rfqs_created, 2);
        assert_eq!(snapshot.request_failures, 1);
        assert_eq!(snapshot.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn health_degrades_with_failures() {
        let metrics = AdapterMetrics::new();
        metrics.record_rfq_created();
        let healthy = AdapterHealth::from_snapshot(metrics.snapshot(), 0);
        assert_eq!(healthy.status, HealthStatus::Healthy);

        metrics.record_failure("boom".to_string());
        let degraded = AdapterHealth::from_snapshot(metrics.snapshot(), 0);
        assert_eq!(degraded.status, HealthStatus::Degraded);
    }
}
