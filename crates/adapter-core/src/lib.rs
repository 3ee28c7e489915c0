//! # Venue Adapter Runtime
//!
//! Shared runtime for a fleet of venue adapters: credential resolution,
//! rate limiting, HTTP execution with retry, status normalization, order
//! tracking, and terminal-status synchronization to the platform's bus,
//! snapshot store and legacy trade ledger.
//!
//! ## Architecture Role
//!
//! Each venue crate (`venue-fxbrl`, `venue-latam`, `venue-oauthfx`, ...)
//! depends on this crate and supplies exactly two things: a
//! [`venue_client::VenueClient`] implementation that knows how to talk to
//! that venue's API, and a [`mapper::Mapper`] that knows that venue's raw
//! status and instrument vocabulary. Everything else — caching resolved
//! credentials, waiting on a rate bucket, retrying a flaky connection,
//! tracking exactly one poller per order, deciding when a webhook should
//! preempt that poller — lives here once.
//!
//! ```text
//! secrets store --> ConfigResolver --> VenueClient --> OrderService
//!                                           ^               |
//!                                     HttpExecutor     ActiveTrackers
//!                                           ^               |
//!                                     RateLimiter      TerminalSync --> bus / store / legacy sink
//! ```
//!
//! ## What this crate is NOT
//!
//! - Not a secrets backend, message bus, or database: those are traits
//!   ([`secrets::SecretStore`], [`bus::EventBus`], [`store::SnapshotStore`],
//!   [`legacy::LegacyTradeSink`]) a venue binary's `main()` wires a real
//!   implementation behind.
//! - Not a venue client: every HTTP call specific to one venue's API lives
//!   in that venue's own crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod config;
pub mod config_resolver;
pub mod error;
pub mod http_executor;
pub mod legacy;
pub mod mapper;
pub mod metrics;
pub mod model;
pub mod order_service;
pub mod rate_limit;
pub mod secrets;
pub mod store;
pub mod terminal_sync;
pub mod token_manager;
pub mod tracker;
pub mod venue_client;
pub mod webhook;

pub use error::{AdapterError, Result};
