//! Static configuration for the BRL FX venue binary
//!
//! This venue has no webhook channel; `base.webhook` is carried only
//! because it's part of the shared base configuration, and stays
//! unpopulated in production.

use adapter_core::config::BaseAdapterConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the BRL FX venue adapter binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueFxBrlConfig {
    /// Shared base adapter configuration
    pub base: BaseAdapterConfig,
}

impl VenueFxBrlConfig {
    /// Load from environment, using the `FXBRL` prefix
    pub fn from_env() -> Self {
        Self {
            base: BaseAdapterConfig::from_env("FXBRL"),
        }
    }

    /// Validate
    pub fn validate(&self) -> Result<(), String> {
        self.base.validate()
    }
}
