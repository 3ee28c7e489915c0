//! OAuth2 FX venue adapter
//!
//! Supplies the [`client::OauthFxVenueClient`] and [`mapper::OauthFxMapper`]
//! that `adapter_core` needs to run this venue.

pub mod client;
pub mod config;
pub mod mapper;

pub use client::OauthFxVenueClient;
pub use config::VenueOauthFxConfig;
pub use mapper::OauthFxMapper;
