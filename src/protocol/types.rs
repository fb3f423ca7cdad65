//! Link-layer address types

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// MAC address (6 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error type for MAC address parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMacAddrError {
    kind: ParseMacAddrErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseMacAddrErrorKind {
    Length,
    Format,
    Hex,
}

impl fmt::Display for ParseMacAddrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseMacAddrErrorKind::Length => write!(f, "invalid MAC address length"),
            ParseMacAddrErrorKind::Format => write!(f, "invalid MAC address format"),
            ParseMacAddrErrorKind::Hex => write!(f, "invalid hex digit in MAC address"),
        }
    }
}

impl std::error::Error for ParseMacAddrError {}

impl FromStr for MacAddr {
    type Err = ParseMacAddrError;

    /// Parse a MAC address from string
    ///
    /// Supported formats:
    /// - Colon-separated: "00:11:22:33:44:55"
    /// - Hyphen-separated: "00-11-22-33-44-55"
    /// - No separator: "001122334455"
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let groups: Vec<&str> = if s.contains(':') {
            s.split(':').collect()
        } else if s.contains('-') {
            s.split('-').collect()
        } else if s.len() == 12 && s.is_ascii() {
            (0..6).map(|i| &s[i * 2..i * 2 + 2]).collect()
        } else {
            return Err(ParseMacAddrError {
                kind: ParseMacAddrErrorKind::Format,
            });
        };

        if groups.len() != 6 {
            return Err(ParseMacAddrError {
                kind: ParseMacAddrErrorKind::Length,
            });
        }

        let mut result = [0u8; 6];
        for (i, group) in groups.iter().enumerate() {
            if group.len() != 2 {
                return Err(ParseMacAddrError {
                    kind: ParseMacAddrErrorKind::Format,
                });
            }
            result[i] = u8::from_str_radix(group, 16).map_err(|_| ParseMacAddrError {
                kind: ParseMacAddrErrorKind::Hex,
            })?;
        }

        Ok(MacAddr(result))
    }
}

/// Link-layer address carried in a client DUID.
///
/// Ethernet clients send a 48-bit MAC; some link types (IEEE 1394,
/// 802.15.4) already use a 64-bit EUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareAddr {
    Eui48(MacAddr),
    Eui64([u8; 8]),
}

impl HardwareAddr {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HardwareAddr::Eui48(mac) => &mac.0,
            HardwareAddr::Eui64(eui) => eui,
        }
    }
}

impl TryFrom<&[u8]> for HardwareAddr {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            6 => {
                let mut mac = [0u8; 6];
                mac.copy_from_slice(bytes);
                Ok(HardwareAddr::Eui48(MacAddr(mac)))
            }
            8 => {
                let mut eui = [0u8; 8];
                eui.copy_from_slice(bytes);
                Ok(HardwareAddr::Eui64(eui))
            }
            len => Err(Error::InvalidHardwareAddr(len)),
        }
    }
}

impl From<MacAddr> for HardwareAddr {
    fn from(mac: MacAddr) -> Self {
        HardwareAddr::Eui48(mac)
    }
}

impl fmt::Display for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareAddr::Eui48(mac) => fmt::Display::fmt(mac, f),
            HardwareAddr::Eui64(eui) => {
                for (i, b) in eui.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Lowercase hex rendering of raw bytes, for logging opaque identifiers
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
