//! Static configuration for the LATAM venue binary
//!
//! Per-client credentials (`api_key`, `base_url`, `country`) live in the
//! secret store and are resolved per request; this config only covers the
//! process-wide knobs every adapter shares. This is the one venue that
//! pushes status updates by webhook, so `base.webhook` is expected to be
//! populated in production.

use adapter_core::config::BaseAdapterConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the LATAM venue adapter binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueLatamConfig {
    /// Shared base adapter configuration
    pub base: BaseAdapterConfig,
}

impl VenueLatamConfig {
    /// Load from environment, using the `LATAM` prefix
    pub fn from_env() -> Self {
        Self {
            base: BaseAdapterConfig::from_env("LATAM"),
        }
    }

    /// Validate
    pub fn validate(&self) -> Result<(), String> {
        self.base.validate()
    }
}
