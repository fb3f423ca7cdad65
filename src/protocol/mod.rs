//! Wire protocol types
//!
//! The DHCPv6 codec plus the link-layer address types it carries.

pub mod dhcpv6;
pub mod types;

pub use types::*;
