//! Secret storage contract
//!
//! The adapter runtime never owns a secrets backend; it only depends on
//! this trait. A production `main()` wires a real implementation (Vault,
//! AWS Secrets Manager, a sealed local store) behind it. `InMemorySecretStore`
//! exists for tests and for local development.

use crate::error::{AdapterError, Result};
use crate::model::SecretRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Resolves per-client secret material for a venue
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the secret record for a client, or `None` if it has never
    /// been provisioned.
    async fn get(&self, client_id: &str) -> Result<Option<SecretRecord>>;

    /// List every client id this store holds a record for. Used at
    /// startup to warm the config cache and to fan out webhook
    /// registration across every provisioned client without needing a
    /// separate client registry. Default implementation reports no
    /// clients; backends that can't enumerate cheaply are free to leave
    /// it unimplemented and rely on on-demand [`Self::get`] instead.
    async fn discover_clients(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// In-memory secret store, backed by a concurrent map. Not for production
/// use: secrets placed here are held in plaintext process memory.
#[derive(Clone, Default)]
pub struct InMemorySecretStore {
    records: Arc<DashMap<String, SecretRecord>>,
}

impl InMemorySecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision (or replace) a client's secret record
    pub fn put(&self, record: SecretRecord) {
        self.records.insert(record.client_id.clone(), record);
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, client_id: &str) -> Result<Option<SecretRecord>> {
        Ok(self.records.get(client_id).map(|r| r.value().clone()))
    }

    async fn discover_clients(&self) -> Result<Vec<String>> {
        Ok(self.records.iter().map(|r| r.key().clone()).collect())
    }
}

/// Secret store that always reports a missing record; useful for exercising
/// the credential-resolution failure path in tests.
#[derive(Clone, Default)]
pub struct EmptySecretStore;

#[async_trait]
impl SecretStore for EmptySecretStore {
    async fn get(&self, _client_id: &str) -> Result<Option<SecretRecord>> {
        Ok(None)
    }
}

/// Secret store that always errors, for exercising backend-unavailable paths
#[derive(Clone, Default)]
pub struct FailingSecretStore;

#[async_trait]
impl SecretStore for FailingSecretStore {
    async fn get(&self, client_id: &str) -> Result<Option<SecretRecord>> {
        Err(AdapterError::CredentialResolution {
            client_id: client_id.to_string(),
            reason: "secret backend unavailable".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn in_memory_store_roundtrips() {
        let store = InMemorySecretStore::new();
        let mut fields = HashMap::new();
        fields.insert("api_key".to_string(), "abc123".to_string());
        store.put(SecretRecord {
            client_id: "acme".to_string(),
            fields,
        });

        let record = store.get("acme").await.unwrap().unwrap();
        assert_eq!(record.require("api_key").unwrap(), "abc123");
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_store_reports_missing() {
        let store = EmptySecretStore;
        assert!(store.get("acme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn in_memory_store_discovers_every_provisioned_client() {
        let store = InMemorySecretStore::new();
        store.put(SecretRecord {
            client_id: "acme".to_string(),
            fields: HashMap::new(),
        });
        store.put(SecretRecord {
            client_id: "globex".to_string(),
            fields: HashMap::new(),
        });

        let mut clients = store.discover_clients().await.unwrap();
        clients.sort();
        assert_eq!(clients, vec!["acme".to_string(), "globex".to_string()]);
    }

    #[tokio::test]
    async fn default_discover_clients_reports_none() {
        let store = EmptySecretStore;
        assert!(store.discover_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_store_errors() {
        let store = FailingSecretStore;
        assert!(store.get("acme").await.is_err());
    }
}
