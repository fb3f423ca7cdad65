//! Configuration types

use crate::protocol::MacAddr;
use crate::server::Prefix;
use crate::telemetry::LogConfig;
use crate::{Error, Result};
use serde::Deserialize;

pub const DEFAULT_INTERFACE: &str = "eth0";
pub const DEFAULT_SUBNET: &str = "dead:beef:2018::/64";

/// User-defined configuration (dhcp6d.toml)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Interface to serve on
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Serving prefix in CIDR notation
    #[serde(default = "default_subnet")]
    pub subnet: String,
    /// MAC used to build the server DUID-LL. Read from the interface
    /// when not set.
    #[serde(default)]
    pub server_mac: Option<String>,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_subnet() -> String {
    DEFAULT_SUBNET.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            subnet: default_subnet(),
            server_mac: None,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parsed serving prefix
    pub fn prefix(&self) -> Result<Prefix> {
        self.subnet.parse()
    }

    /// Parsed `server_mac`, if one is configured
    pub fn server_mac(&self) -> Result<Option<MacAddr>> {
        self.server_mac
            .as_deref()
            .map(|s| {
                s.parse::<MacAddr>()
                    .map_err(|e| Error::Config(format!("server_mac '{}': {}", s, e)))
            })
            .transpose()
    }
}
