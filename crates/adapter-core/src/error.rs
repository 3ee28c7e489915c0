//! Error types for the venue adapter runtime

use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Main error type for adapter operations
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The secret store had no entry, or the entry was missing a required field
    #[error("credential resolution failed for client {client_id}: {reason}")]
    CredentialResolution {
        /// The client whose config could not be resolved
        client_id: String,
        /// Human-readable reason
        reason: String,
    },

    /// Token refresh or login exchange failed
    #[error("authentication failed for client {client_id}: {reason}")]
    AuthenticationFailed {
        /// The client whose auth failed
        client_id: String,
        /// Reason for the failure
        reason: String,
    },

    /// Transport-level failure: connection refused, timeout, DNS, TLS, etc.
    #[error("transport error after {attempts} attempt(s): {source}")]
    Transport {
        /// Number of attempts made before giving up
        attempts: u32,
        /// Underlying error
        source: String,
    },

    /// The venue returned a 4xx/5xx with a business-level error body
    #[error("venue rejected request ({status}): {message}")]
    VenueRejected {
        /// HTTP status code returned by the venue
        status: u16,
        /// Venue-supplied error message, when available
        message: String,
    },

    /// Response body could not be decoded into the expected type
    #[error("failed to decode venue response: {0}")]
    DecodeFailed(String),

    /// Rate limiter wait was cancelled before a token became available
    #[error("rate limit wait cancelled for key {key}: {reason}")]
    RateLimitCancelled {
        /// The rate bucket key
        key: String,
        /// Reason the wait was cancelled (e.g. caller cancellation)
        reason: String,
    },

    /// Persistence (legacy upsert / snapshot write) failed. Logged and
    /// swallowed by callers; constructed mainly for structured logging.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// Event bus publish failed. Logged and swallowed by callers.
    #[error("event publish failed: {0}")]
    Delivery(String),

    /// Instrument, quote or order could not be found
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed or unparseable webhook / request body
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Webhook signature did not match, or was missing while required
    #[error("webhook signature verification failed")]
    SignatureInvalid,

    /// Configuration error in adapter settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Feature not yet implemented by a given venue
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Catch-all for unexpected internal errors
    #[error("internal error: {0}")]
    Internal(String),

    /// Generic wrapped error from a collaborator crate
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdapterError {
    /// Whether the HTTP executor should retry the request that produced
    /// this error. Only transport-level failures are retried; everything
    /// else (bad credentials, rejected orders, decode failures) is a
    /// property of the request itself and retrying won't change the
    /// outcome.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AdapterError::Transport { .. })
    }

    /// Whether this error represents a permanent failure that should stop
    /// an in-flight operation (e.g. the background poller) rather than be
    /// retried on the next tick.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AdapterError::CredentialResolution { .. }
                | AdapterError::AuthenticationFailed { .. }
                | AdapterError::VenueRejected { .. }
                | AdapterError::Configuration(_)
        )
    }
}
