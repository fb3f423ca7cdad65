//! DHCPv6 protocol - RFC 3315 / RFC 8415
//!
//! Message and option codec for the server side: decodes client messages
//! into an owned option container and encodes Advertise/Reply messages.

use crate::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;

/// DHCPv6 server port
pub const DHCP6_SERVER_PORT: u16 = 547;

/// DHCPv6 client port
pub const DHCP6_CLIENT_PORT: u16 = 546;

/// Fixed header size (msg-type + transaction-id)
pub const DHCP6_HEADER_SIZE: usize = 4;

/// All_DHCP_Relay_Agents_and_Servers multicast address (ff02::1:2)
pub const ALL_DHCP_SERVERS: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 1, 2);

/// Option header size (code + length)
const OPTION_HEADER_SIZE: usize = 4;

/// DHCPv6 message types (RFC 8415 Section 7.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Dhcp6MessageType {
    Solicit = 1,
    Advertise = 2,
    Request = 3,
    Confirm = 4,
    Renew = 5,
    Rebind = 6,
    Reply = 7,
    Release = 8,
    Decline = 9,
    Reconfigure = 10,
    InformationRequest = 11,
    RelayForward = 12,
    RelayReply = 13,
}

impl Dhcp6MessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Dhcp6MessageType::Solicit),
            2 => Some(Dhcp6MessageType::Advertise),
            3 => Some(Dhcp6MessageType::Request),
            4 => Some(Dhcp6MessageType::Confirm),
            5 => Some(Dhcp6MessageType::Renew),
            6 => Some(Dhcp6MessageType::Rebind),
            7 => Some(Dhcp6MessageType::Reply),
            8 => Some(Dhcp6MessageType::Release),
            9 => Some(Dhcp6MessageType::Decline),
            10 => Some(Dhcp6MessageType::Reconfigure),
            11 => Some(Dhcp6MessageType::InformationRequest),
            12 => Some(Dhcp6MessageType::RelayForward),
            13 => Some(Dhcp6MessageType::RelayReply),
            _ => None,
        }
    }
}

impl fmt::Display for Dhcp6MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dhcp6MessageType::Solicit => "Solicit",
            Dhcp6MessageType::Advertise => "Advertise",
            Dhcp6MessageType::Request => "Request",
            Dhcp6MessageType::Confirm => "Confirm",
            Dhcp6MessageType::Renew => "Renew",
            Dhcp6MessageType::Rebind => "Rebind",
            Dhcp6MessageType::Reply => "Reply",
            Dhcp6MessageType::Release => "Release",
            Dhcp6MessageType::Decline => "Decline",
            Dhcp6MessageType::Reconfigure => "Reconfigure",
            Dhcp6MessageType::InformationRequest => "Information-Request",
            Dhcp6MessageType::RelayForward => "Relay-Forward",
            Dhcp6MessageType::RelayReply => "Relay-Reply",
        };
        f.write_str(name)
    }
}

/// DHCPv6 option codes (RFC 8415, RFC 3646, etc.)
pub mod options {
    pub const CLIENT_ID: u16 = 1;
    pub const SERVER_ID: u16 = 2;
    pub const IA_NA: u16 = 3;
    pub const IA_TA: u16 = 4;
    pub const IA_ADDR: u16 = 5;
    pub const ORO: u16 = 6; // Option Request Option
    pub const PREFERENCE: u16 = 7;
    pub const ELAPSED_TIME: u16 = 8;
    pub const RELAY_MSG: u16 = 9;
    pub const AUTH: u16 = 11;
    pub const UNICAST: u16 = 12;
    pub const STATUS_CODE: u16 = 13;
    pub const RAPID_COMMIT: u16 = 14;
    pub const USER_CLASS: u16 = 15;
    pub const VENDOR_CLASS: u16 = 16;
    pub const VENDOR_OPTS: u16 = 17;
    pub const INTERFACE_ID: u16 = 18;
    pub const RECONF_MSG: u16 = 19;
    pub const RECONF_ACCEPT: u16 = 20;
    pub const DNS_SERVERS: u16 = 23; // RFC 3646
    pub const DOMAIN_LIST: u16 = 24; // RFC 3646
    pub const IA_PD: u16 = 25; // Prefix Delegation
    pub const IA_PREFIX: u16 = 26;
    pub const INFO_REFRESH: u16 = 32; // RFC 4242
    pub const SOL_MAX_RT: u16 = 82; // RFC 8415
    pub const INF_MAX_RT: u16 = 83; // RFC 8415

    /// Human readable name of an option code, for logging
    pub fn name(code: u16) -> Option<&'static str> {
        let name = match code {
            CLIENT_ID => "ClientID",
            SERVER_ID => "ServerID",
            IA_NA => "IANA",
            IA_TA => "IATA",
            IA_ADDR => "IAAddr",
            ORO => "ORO",
            PREFERENCE => "Preference",
            ELAPSED_TIME => "ElapsedTime",
            RELAY_MSG => "RelayMsg",
            AUTH => "Auth",
            UNICAST => "Unicast",
            STATUS_CODE => "StatusCode",
            RAPID_COMMIT => "RapidCommit",
            USER_CLASS => "UserClass",
            VENDOR_CLASS => "VendorClass",
            VENDOR_OPTS => "VendorOpts",
            INTERFACE_ID => "InterfaceID",
            RECONF_MSG => "ReconfMsg",
            RECONF_ACCEPT => "ReconfAccept",
            DNS_SERVERS => "DNSServers",
            DOMAIN_LIST => "DomainList",
            IA_PD => "IAPD",
            IA_PREFIX => "IAPrefix",
            INFO_REFRESH => "InformationRefreshTime",
            SOL_MAX_RT => "SolMaxRT",
            INF_MAX_RT => "InfMaxRT",
            _ => return None,
        };
        Some(name)
    }
}

/// Outcome of an option lookup that did not yield a value.
///
/// `Absent` is an ordinary branch for callers; `Malformed` means the
/// option was present but could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("option {0} not present")]
    Absent(u16),

    #[error("malformed option {code}: {reason}")]
    Malformed { code: u16, reason: String },
}

impl OptionError {
    fn malformed(code: u16, reason: impl Into<String>) -> Self {
        OptionError::Malformed {
            code,
            reason: reason.into(),
        }
    }
}

/// A single raw DHCPv6 option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dhcp6Option {
    pub code: u16,
    pub data: Vec<u8>,
}

/// Ordered DHCPv6 option container.
///
/// Options keep their wire order; a code may appear more than once
/// (multiple IA_NA or IAAddr options).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dhcp6Options {
    options: Vec<Dhcp6Option>,
}

impl Dhcp6Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a sequence of options. Any truncated option fails the
    /// whole container.
    pub fn parse(mut data: &[u8]) -> Result<Self> {
        let mut options = Vec::new();

        while !data.is_empty() {
            if data.len() < OPTION_HEADER_SIZE {
                return Err(Error::Parse("truncated option header".into()));
            }
            let code = u16::from_be_bytes([data[0], data[1]]);
            let len = u16::from_be_bytes([data[2], data[3]]) as usize;
            let end = OPTION_HEADER_SIZE + len;
            if end > data.len() {
                return Err(Error::Parse(format!(
                    "option {} length {} exceeds remaining {} bytes",
                    code,
                    len,
                    data.len() - OPTION_HEADER_SIZE
                )));
            }
            options.push(Dhcp6Option {
                code,
                data: data[OPTION_HEADER_SIZE..end].to_vec(),
            });
            data = &data[end..];
        }

        Ok(Self { options })
    }

    /// Append an option with raw data
    pub fn add_raw(&mut self, code: u16, data: impl Into<Vec<u8>>) -> Result<()> {
        let data = data.into();
        if data.len() > u16::MAX as usize {
            return Err(Error::InvalidPacket(format!(
                "option {} data length {} does not fit in 16 bits",
                code,
                data.len()
            )));
        }
        self.options.push(Dhcp6Option { code, data });
        Ok(())
    }

    /// Append an IA_NA option
    pub fn add_ia_na(&mut self, ia: &IaNa) -> Result<()> {
        self.add_raw(options::IA_NA, ia.to_bytes())
    }

    /// Append an IAAddr option
    pub fn add_ia_addr(&mut self, addr: &IaAddr) -> Result<()> {
        self.add_raw(options::IA_ADDR, addr.to_bytes())
    }

    /// Append a Preference option
    pub fn add_preference(&mut self, preference: u8) -> Result<()> {
        self.add_raw(options::PREFERENCE, [preference])
    }

    /// Remove every option with the given code
    pub fn remove(&mut self, code: u16) {
        self.options.retain(|o| o.code != code);
    }

    /// Data of the first option with the given code
    pub fn get_one(&self, code: u16) -> std::result::Result<&[u8], OptionError> {
        self.options
            .iter()
            .find(|o| o.code == code)
            .map(|o| o.data.as_slice())
            .ok_or(OptionError::Absent(code))
    }

    /// Data of every option with the given code, in wire order
    pub fn get(&self, code: u16) -> impl Iterator<Item = &[u8]> + '_ {
        self.options
            .iter()
            .filter(move |o| o.code == code)
            .map(|o| o.data.as_slice())
    }

    /// All IA_NA options
    pub fn ia_nas(&self) -> std::result::Result<Vec<IaNa>, OptionError> {
        let ias = self
            .get(options::IA_NA)
            .map(IaNa::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if ias.is_empty() {
            return Err(OptionError::Absent(options::IA_NA));
        }
        Ok(ias)
    }

    /// All IAAddr options in this container
    pub fn ia_addrs(&self) -> std::result::Result<Vec<IaAddr>, OptionError> {
        let addrs = self
            .get(options::IA_ADDR)
            .map(IaAddr::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if addrs.is_empty() {
            return Err(OptionError::Absent(options::IA_ADDR));
        }
        Ok(addrs)
    }

    /// Option codes listed in the Option Request Option
    pub fn option_request(&self) -> std::result::Result<Vec<u16>, OptionError> {
        let data = self.get_one(options::ORO)?;
        if data.len() % 2 != 0 {
            return Err(OptionError::malformed(options::ORO, "odd length"));
        }
        Ok(data
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect())
    }

    /// Server preference value
    pub fn preference(&self) -> std::result::Result<u8, OptionError> {
        match self.get_one(options::PREFERENCE)? {
            [value] => Ok(*value),
            _ => Err(OptionError::malformed(
                options::PREFERENCE,
                "length must be 1",
            )),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dhcp6Option> + '_ {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Encoded length in bytes
    pub fn encoded_len(&self) -> usize {
        self.options
            .iter()
            .map(|o| OPTION_HEADER_SIZE + o.data.len())
            .sum()
    }

    /// Append the wire encoding to `buf`
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        for opt in &self.options {
            buf.extend_from_slice(&opt.code.to_be_bytes());
            buf.extend_from_slice(&(opt.data.len() as u16).to_be_bytes());
            buf.extend_from_slice(&opt.data);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf
    }
}

/// DUID types (RFC 8415 Section 11)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Duid {
    /// DUID-LLT: Link-layer address plus time (type 1)
    Llt {
        hardware_type: u16,
        time: u32,
        link_layer_addr: Vec<u8>,
    },
    /// DUID-LL: Link-layer address (type 3)
    Ll {
        hardware_type: u16,
        link_layer_addr: Vec<u8>,
    },
}

/// Hardware type for Ethernet (RFC 826)
pub const HARDWARE_TYPE_ETHERNET: u16 = 1;

const DUID_TYPE_LLT: u16 = 1;
const DUID_TYPE_LL: u16 = 3;

impl Duid {
    /// Decode a DUID-LLT, rejecting any other DUID type
    pub fn parse_llt(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::Parse("DUID-LLT too short".into()));
        }
        if u16::from_be_bytes([data[0], data[1]]) != DUID_TYPE_LLT {
            return Err(Error::Parse("not a DUID-LLT".into()));
        }
        Ok(Duid::Llt {
            hardware_type: u16::from_be_bytes([data[2], data[3]]),
            time: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            link_layer_addr: data[8..].to_vec(),
        })
    }

    /// Decode a DUID-LL, rejecting any other DUID type
    pub fn parse_ll(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::Parse("DUID-LL too short".into()));
        }
        if u16::from_be_bytes([data[0], data[1]]) != DUID_TYPE_LL {
            return Err(Error::Parse("not a DUID-LL".into()));
        }
        Ok(Duid::Ll {
            hardware_type: u16::from_be_bytes([data[2], data[3]]),
            link_layer_addr: data[4..].to_vec(),
        })
    }

    /// Link-layer address embedded in the DUID
    pub fn link_layer_addr(&self) -> &[u8] {
        match self {
            Duid::Llt {
                link_layer_addr, ..
            }
            | Duid::Ll {
                link_layer_addr, ..
            } => link_layer_addr,
        }
    }

    /// Serialize DUID to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        match self {
            Duid::Llt {
                hardware_type,
                time,
                link_layer_addr,
            } => {
                bytes.extend_from_slice(&DUID_TYPE_LLT.to_be_bytes());
                bytes.extend_from_slice(&hardware_type.to_be_bytes());
                bytes.extend_from_slice(&time.to_be_bytes());
                bytes.extend_from_slice(link_layer_addr);
            }
            Duid::Ll {
                hardware_type,
                link_layer_addr,
            } => {
                bytes.extend_from_slice(&DUID_TYPE_LL.to_be_bytes());
                bytes.extend_from_slice(&hardware_type.to_be_bytes());
                bytes.extend_from_slice(link_layer_addr);
            }
        }
        bytes
    }
}

/// IA Address option (RFC 8415 Section 21.6)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IaAddr {
    pub address: Ipv6Addr,
    pub preferred_lifetime: u32,
    pub valid_lifetime: u32,
    pub options: Dhcp6Options,
}

impl IaAddr {
    /// Create an IAAddr, lifetimes in seconds.
    pub fn new(
        address: Ipv6Addr,
        preferred_lifetime: u32,
        valid_lifetime: u32,
        options: Dhcp6Options,
    ) -> Result<Self> {
        if preferred_lifetime > valid_lifetime {
            return Err(Error::InvalidLifetimes {
                preferred: preferred_lifetime,
                valid: valid_lifetime,
            });
        }
        Ok(Self {
            address,
            preferred_lifetime,
            valid_lifetime,
            options,
        })
    }

    /// Parse IA Address from option data
    pub fn parse(data: &[u8]) -> std::result::Result<Self, OptionError> {
        if data.len() < 24 {
            return Err(OptionError::malformed(options::IA_ADDR, "too short"));
        }

        let mut addr_bytes = [0u8; 16];
        addr_bytes.copy_from_slice(&data[0..16]);

        let options = Dhcp6Options::parse(&data[24..])
            .map_err(|e| OptionError::malformed(options::IA_ADDR, e.to_string()))?;

        Ok(IaAddr {
            address: Ipv6Addr::from(addr_bytes),
            preferred_lifetime: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
            valid_lifetime: u32::from_be_bytes([data[20], data[21], data[22], data[23]]),
            options,
        })
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(24 + self.options.encoded_len());
        bytes.extend_from_slice(&self.address.octets());
        bytes.extend_from_slice(&self.preferred_lifetime.to_be_bytes());
        bytes.extend_from_slice(&self.valid_lifetime.to_be_bytes());
        self.options.write_to(&mut bytes);
        bytes
    }
}

/// IA_NA option (RFC 8415 Section 21.4)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IaNa {
    pub iaid: [u8; 4],
    pub t1: u32,
    pub t2: u32,
    pub options: Dhcp6Options,
}

impl IaNa {
    pub fn new(iaid: [u8; 4], t1: u32, t2: u32) -> Self {
        Self {
            iaid,
            t1,
            t2,
            options: Dhcp6Options::new(),
        }
    }

    /// Parse IA_NA from option data
    pub fn parse(data: &[u8]) -> std::result::Result<Self, OptionError> {
        if data.len() < 12 {
            return Err(OptionError::malformed(options::IA_NA, "too short"));
        }

        let options = Dhcp6Options::parse(&data[12..])
            .map_err(|e| OptionError::malformed(options::IA_NA, e.to_string()))?;

        Ok(IaNa {
            iaid: [data[0], data[1], data[2], data[3]],
            t1: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            t2: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            options,
        })
    }

    /// Serialize to bytes, nested options included
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12 + self.options.encoded_len());
        bytes.extend_from_slice(&self.iaid);
        bytes.extend_from_slice(&self.t1.to_be_bytes());
        bytes.extend_from_slice(&self.t2.to_be_bytes());
        self.options.write_to(&mut bytes);
        bytes
    }
}

/// Decoded DHCPv6 client/server message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dhcp6Message {
    pub message_type: Dhcp6MessageType,
    pub transaction_id: [u8; 3],
    pub options: Dhcp6Options,
}

impl Dhcp6Message {
    /// Parse a DHCPv6 message from a UDP payload
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < DHCP6_HEADER_SIZE {
            return Err(Error::Parse("DHCPv6 message too short".into()));
        }

        let message_type = Dhcp6MessageType::from_u8(buffer[0]).ok_or_else(|| {
            Error::Parse(format!("unknown DHCPv6 message type {}", buffer[0]))
        })?;

        Ok(Self {
            message_type,
            transaction_id: [buffer[1], buffer[2], buffer[3]],
            options: Dhcp6Options::parse(&buffer[DHCP6_HEADER_SIZE..])?,
        })
    }

    /// Transaction ID as a 24-bit integer
    pub fn xid(&self) -> u32 {
        u32::from_be_bytes([
            0,
            self.transaction_id[0],
            self.transaction_id[1],
            self.transaction_id[2],
        ])
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(DHCP6_HEADER_SIZE + self.options.encoded_len());
        buffer.push(self.message_type as u8);
        buffer.extend_from_slice(&self.transaction_id);
        self.options.write_to(&mut buffer);
        buffer
    }
}

/// DHCPv6 message builder
#[derive(Debug, Clone)]
pub struct Dhcp6Builder {
    msg_type: Dhcp6MessageType,
    transaction_id: [u8; 3],
    options: Dhcp6Options,
}

impl Dhcp6Builder {
    /// Create a new builder with specified message type
    pub fn new(msg_type: Dhcp6MessageType) -> Self {
        Self {
            msg_type,
            transaction_id: [0; 3],
            options: Dhcp6Options::new(),
        }
    }

    /// Set transaction ID (only lower 24 bits used)
    pub fn transaction_id(mut self, xid: u32) -> Self {
        let bytes = xid.to_be_bytes();
        self.transaction_id = [bytes[1], bytes[2], bytes[3]];
        self
    }

    /// Set transaction ID from raw bytes
    pub fn transaction_id_bytes(mut self, xid: [u8; 3]) -> Self {
        self.transaction_id = xid;
        self
    }

    /// Replace the option set
    pub fn options(mut self, options: Dhcp6Options) -> Self {
        self.options = options;
        self
    }

    /// Add Client ID option
    pub fn client_id(self, duid: &Duid) -> Result<Self> {
        self.option(options::CLIENT_ID, duid.to_bytes())
    }

    /// Add Server ID option
    pub fn server_id(self, duid: &Duid) -> Result<Self> {
        self.option(options::SERVER_ID, duid.to_bytes())
    }

    /// Add IA_NA option with its nested options
    pub fn ia_na(self, ia: &IaNa) -> Result<Self> {
        self.option(options::IA_NA, ia.to_bytes())
    }

    /// Add Option Request Option (ORO)
    pub fn option_request(self, codes: &[u16]) -> Result<Self> {
        let data: Vec<u8> = codes.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.option(options::ORO, data)
    }

    /// Add Elapsed Time option
    pub fn elapsed_time(self, centiseconds: u16) -> Result<Self> {
        self.option(options::ELAPSED_TIME, centiseconds.to_be_bytes())
    }

    /// Add raw option
    pub fn option(mut self, code: u16, data: impl Into<Vec<u8>>) -> Result<Self> {
        self.options.add_raw(code, data)?;
        Ok(self)
    }

    /// Finish as a decoded message
    pub fn message(self) -> Dhcp6Message {
        Dhcp6Message {
            message_type: self.msg_type,
            transaction_id: self.transaction_id,
            options: self.options,
        }
    }

    /// Build the DHCPv6 message
    pub fn build(self) -> Vec<u8> {
        self.message().to_bytes()
    }
}
