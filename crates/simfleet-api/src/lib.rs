// simfleet-api: Async Rust client for the simfleet backend HTTP API.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod devices;
mod mqtt;
mod stats;

pub use client::PanelClient;
pub use error::Error;
