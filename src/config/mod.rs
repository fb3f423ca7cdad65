//! Configuration management
//!
//! Handles dhcp6d.toml. Every key is optional; command-line flags
//! override file values.

mod types;
mod validation;

pub use types::*;
pub use validation::{validate, ValidationResult};

use crate::{Error, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Parse configuration from TOML text
pub fn parse(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::LogFormat;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.interface, "eth0");
        assert_eq!(config.subnet, "dead:beef:2018::/64");
    }

    #[test]
    fn test_parse_full() {
        let config = parse(
            r#"
            interface = "lan0"
            subnet = "2001:db8:1::/64"
            server_mac = "02:00:00:00:00:01"

            [log]
            level = "debug"
            format = "compact"
            "#,
        )
        .unwrap();

        assert_eq!(config.interface, "lan0");
        assert_eq!(config.prefix().unwrap().to_string(), "2001:db8:1::/64");
        assert_eq!(
            config.server_mac().unwrap().map(|m| m.0),
            Some([0x02, 0, 0, 0, 0, 0x01])
        );
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Compact);
    }

    #[test]
    fn test_parse_unknown_format_rejected() {
        let err = parse("[log]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/nonexistent/dhcp6d.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
