//! dhcp6d - minimal DHCPv6 server
//!
//! Assigns a single IPv6 address per client, derived from the client's
//! link-layer address with modified EUI-64. No lease database: the same
//! client always gets the same address for a given serving prefix.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod telemetry;
pub mod transport;

pub use error::{Error, Result};
