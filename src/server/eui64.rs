//! Modified EUI-64 address synthesis (RFC 4291 Section 2.5.1, Appendix A)
//!
//! A client's address is the serving prefix's upper 64 bits followed by
//! the interface identifier derived from its link-layer address. The
//! result depends only on (prefix, hardware address), so no lease table
//! is needed to hand the same client the same address again.

use crate::protocol::HardwareAddr;
use crate::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

/// Universal/local bit of the first interface identifier octet
const UNIVERSAL_LOCAL_BIT: u8 = 0x02;

/// Longest prefix that still leaves room for a 64-bit interface identifier
pub const MAX_PREFIX_LEN: u8 = 64;

/// Serving prefix, validated once at startup and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    addr: Ipv6Addr,
    len: u8,
}

impl Prefix {
    pub fn new(addr: Ipv6Addr, len: u8) -> Result<Self> {
        if addr.to_ipv4_mapped().is_some() {
            return Err(Error::Config(format!(
                "{} is an IPv4-mapped address, not an IPv6 prefix",
                addr
            )));
        }
        if len > MAX_PREFIX_LEN {
            return Err(Error::Config(format!(
                "prefix length /{} leaves no room for a 64-bit interface identifier",
                len
            )));
        }
        Ok(Self { addr, len })
    }

    /// Upper 64 bits of the configured address, host half zeroed
    pub fn network(&self) -> Ipv6Addr {
        let mut octets = self.addr.octets();
        octets[8..].fill(0);
        Ipv6Addr::from(octets)
    }

    pub fn len(&self) -> u8 {
        self.len
    }
}

impl FromStr for Prefix {
    type Err = Error;

    /// Parse "addr/len" CIDR notation
    fn from_str(s: &str) -> Result<Self> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| Error::Config(format!("invalid CIDR: {}", s)))?;

        let addr: Ipv6Addr = addr
            .parse()
            .map_err(|_| Error::Config(format!("{} is not an IPv6 address", addr)))?;
        let len: u8 = len
            .parse()
            .map_err(|_| Error::Config(format!("invalid prefix length: {}", len)))?;
        if len > 128 {
            return Err(Error::Config(format!("invalid prefix length: {}", len)));
        }

        Prefix::new(addr, len)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

/// Modified EUI-64 interface identifier for a link-layer address.
///
/// A 48-bit MAC is split in half around `ff:fe`; a 64-bit EUI is used
/// as is. In both cases the universal/local bit is inverted.
pub fn interface_id(hw: &HardwareAddr) -> [u8; 8] {
    let mut id = match hw {
        HardwareAddr::Eui48(mac) => {
            let m = &mac.0;
            [m[0], m[1], m[2], 0xff, 0xfe, m[3], m[4], m[5]]
        }
        HardwareAddr::Eui64(eui) => *eui,
    };
    id[0] ^= UNIVERSAL_LOCAL_BIT;
    id
}

/// Address for `hw` inside the serving prefix
pub fn synthesize(prefix: &Prefix, hw: &HardwareAddr) -> Ipv6Addr {
    let mut octets = prefix.network().octets();
    octets[8..].copy_from_slice(&interface_id(hw));
    Ipv6Addr::from(octets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MacAddr;

    fn default_prefix() -> Prefix {
        "dead:beef:2018::/64".parse().unwrap()
    }

    #[test]
    fn test_interface_id_eui48() {
        let hw = HardwareAddr::Eui48(MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
        assert_eq!(
            interface_id(&hw),
            [0x02, 0x11, 0x22, 0xff, 0xfe, 0x33, 0x44, 0x55]
        );
    }

    #[test]
    fn test_interface_id_clears_local_bit() {
        // Locally administered MAC: U/L bit set, so it is cleared
        let hw = HardwareAddr::Eui48(MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]));
        assert_eq!(interface_id(&hw)[0], 0x00);
    }

    #[test]
    fn test_interface_id_eui64() {
        let hw = HardwareAddr::Eui64([0x00, 0x12, 0x4b, 0x00, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            interface_id(&hw),
            [0x02, 0x12, 0x4b, 0x00, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn test_synthesize() {
        let hw = HardwareAddr::Eui48(MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
        let addr = synthesize(&default_prefix(), &hw);
        assert_eq!(
            addr,
            "dead:beef:2018::211:22ff:fe33:4455".parse::<Ipv6Addr>().unwrap()
        );
    }

    #[test]
    fn test_synthesize_deterministic() {
        let prefix = default_prefix();
        let hw = HardwareAddr::Eui48(MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
        assert_eq!(synthesize(&prefix, &hw), synthesize(&prefix, &hw));

        let other = HardwareAddr::Eui48(MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x00]));
        assert_ne!(synthesize(&prefix, &hw), synthesize(&prefix, &other));
    }

    #[test]
    fn test_synthesize_ignores_host_bits() {
        let hw = HardwareAddr::Eui48(MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
        let with_host: Prefix = "dead:beef:2018::1234/64".parse().unwrap();
        assert_eq!(
            synthesize(&with_host, &hw),
            synthesize(&default_prefix(), &hw)
        );
    }

    #[test]
    fn test_prefix_parse() {
        let prefix = default_prefix();
        assert_eq!(prefix.len(), 64);
        assert_eq!(
            prefix.network(),
            "dead:beef:2018::".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(prefix.to_string(), "dead:beef:2018::/64");

        let wide: Prefix = "2001:db8::/48".parse().unwrap();
        assert_eq!(wide.len(), 48);
    }

    #[test]
    fn test_prefix_rejects_ipv4() {
        assert!("10.0.0.0/8".parse::<Prefix>().is_err());
        assert!("::ffff:10.0.0.1/64".parse::<Prefix>().is_err());
    }

    #[test]
    fn test_prefix_rejects_malformed() {
        assert!("dead:beef:2018::".parse::<Prefix>().is_err());
        assert!("dead:beef:2018::/abc".parse::<Prefix>().is_err());
        assert!("dead:beef:2018::/129".parse::<Prefix>().is_err());
        assert!("dead:beef:2018::/80".parse::<Prefix>().is_err());
        assert!("not-an-address/64".parse::<Prefix>().is_err());
    }
}
