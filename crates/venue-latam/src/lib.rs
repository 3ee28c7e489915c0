//! LATAM onramp/offramp venue adapter
//!
//! Supplies the [`client::LatamVenueClient`] and [`mapper::LatamMapper`]
//! that `adapter_core` needs to run this venue; see
//! `bin/venue_latam_adapter.rs` for how they're wired into a running
//! service. This is the one venue with a webhook push channel: a pushed
//! status update preempts this venue's poller the same way it would for
//! any tracked order, per `adapter_core::webhook`.

pub mod client;
pub mod config;
pub mod mapper;

pub use client::LatamVenueClient;
pub use config::VenueLatamConfig;
pub use mapper::LatamMapper;
