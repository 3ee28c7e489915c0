//! Per-client configuration resolution and caching
//!
//! Venue clients don't hit the secret store on every request. [`ConfigResolver`]
//! resolves a client's [`SecretRecord`] once, wraps it in a venue-specific
//! config, and caches it for [`CacheConfig::ttl`]. A cache miss or an expired
//! entry re-resolves from the backing [`SecretStore`].

use crate::config::CacheConfig;
use crate::error::{AdapterError, Result};
use crate::model::SecretRecord;
use crate::secrets::SecretStore;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

struct CacheEntry {
    record: SecretRecord,
    resolved_at: Instant,
}

/// Resolves and caches per-client secret records behind a TTL
pub struct ConfigResolver {
    store: Arc<dyn SecretStore>,
    cache: DashMap<String, CacheEntry>,
    config: CacheConfig,
}

impl ConfigResolver {
    /// Build a resolver over the given secret store
    pub fn new(store: Arc<dyn SecretStore>, config: CacheConfig) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            config,
        }
    }

    /// Resolve a client's secret record, serving from cache when still
    /// fresh. Errors if the client has no provisioned record.
    pub async fn resolve(&self, client_id: &str) -> Result<SecretRecord> {
        if let Some(entry) = self.cache.get(client_id) {
            if entry.resolved_at.elapsed() < self.config.ttl() {
                return Ok(entry.record.clone());
            }
        }

        let record = self.store.get(client_id).await?.ok_or_else(|| {
            AdapterError::CredentialResolution {
                client_id: client_id.to_string(),
                reason: "no secret record provisioned for this client".to_string(),
            }
        })?;

        if self.cache.len() >= self.config.max_entries && !self.cache.contains_key(client_id) {
            self.evict_oldest();
        }

        self.cache.insert(
            client_id.to_string(),
            CacheEntry {
                record: record.clone(),
                resolved_at: Instant::now(),
            },
        );

        Ok(record)
    }

    /// Drop a client's cached entry, forcing the next resolve to hit the
    /// backing store. Used after an authentication failure in case the
    /// secret was rotated out from under us.
    pub fn invalidate(&self, client_id: &str) {
        self.cache.remove(client_id);
    }

    /// List every client id the backing store currently holds a record
    /// for. Used at startup to warm this resolver's cache and by webhook
    /// registration, which needs to know every client to register a
    /// callback on their behalf without a separate client registry.
    pub async fn discover_clients(&self) -> Result<Vec<String>> {
        self.store.discover_clients().await
    }

    fn evict_oldest(&self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|entry| entry.resolved_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.cache.remove(&key);
        }
    }
}
