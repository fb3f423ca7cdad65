use crate::protocol::dhcpv6::OptionError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("interface {name} not found")]
    InterfaceNotFound { name: String },

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error(transparent)]
    Option(#[from] OptionError),

    #[error("unknown DUID type")]
    UnknownDuid,

    #[error("invalid hardware address length {0}, expected 6 or 8 bytes")]
    InvalidHardwareAddr(usize),

    #[error("preferred lifetime {preferred}s exceeds valid lifetime {valid}s")]
    InvalidLifetimes { preferred: u32, valid: u32 },

    #[error("{0} is not a server reply message type")]
    InvalidReplyType(String),
}

pub type Result<T> = std::result::Result<T, Error>;
