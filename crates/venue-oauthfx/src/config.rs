//! Static configuration for the OAuth2 FX venue binary

use adapter_core::config::BaseAdapterConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for the OAuth2 FX venue adapter binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueOauthFxConfig {
    /// Shared base adapter configuration
    pub base: BaseAdapterConfig,
    /// Venue-wide token endpoint base URL. Unlike the per-client `base_url`
    /// secret field used for trading calls, every client exchanges tokens
    /// against the same issuer.
    pub token_base_url: String,
}

impl VenueOauthFxConfig {
    /// Load from environment, using the `OAUTHFX` prefix
    pub fn from_env() -> Self {
        Self {
            base: BaseAdapterConfig::from_env("OAUTHFX"),
            token_base_url: env::var("OAUTHFX_TOKEN_BASE_URL")
                .unwrap_or_else(|_| "https://auth.oauthfx.example.com".to_string()),
        }
    }

    /// Validate
    pub fn validate(&self) -> Result<(), String> {
        self.base.validate()?;
        if self.token_base_url.is_empty() {
            return Err("token_base_url cannot be empty".to_string());
        }
        Ok(())
    }
}
