//! BRL FX venue adapter
//!
//! Supplies the [`client::FxBrlVenueClient`] and [`mapper::FxBrlMapper`]
//! that `adapter_core` needs to run this venue. This venue has no push
//! channel: every order is driven to a terminal status by the poller
//! alone, so `bin/venue_fxbrl_adapter.rs` never constructs a
//! `WebhookIntake`.

pub mod client;
pub mod config;
pub mod mapper;

pub use client::FxBrlVenueClient;
pub use config::VenueFxBrlConfig;
pub use mapper::FxBrlMapper;
