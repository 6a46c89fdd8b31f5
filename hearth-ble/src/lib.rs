//! BLE link management for the fireplace bridge
//!
//! One device, one writable characteristic, one live session at a time.
//! [`Link`] owns the transport, keeps it connected with a fixed-backoff
//! retry loop, and serializes every characteristic write.

mod btle;
mod config;
mod error;
mod fake;
mod link;
mod transport;

pub use btle::BtleTransport;
pub use config::LinkConfig;
pub use error::TransportError;
pub use fake::FakeTransport;
pub use link::{Link, LinkState};
pub use transport::GattTransport;

pub use btleplug::api::BDAddr;
