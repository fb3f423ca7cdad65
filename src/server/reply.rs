//! Reply assembly
//!
//! A [`ResponseSender`] collects the options of one reply and is consumed
//! by [`ResponseSender::send`], so a request can be answered at most once.

use crate::protocol::dhcpv6::{
    options, Dhcp6Builder, Dhcp6MessageType, Dhcp6Options, Duid, IaAddr, IaNa,
};
use crate::server::Request;
use crate::{Error, Result};
use std::net::{Ipv6Addr, SocketAddr};
use tracing::trace;

/// Preferred lifetime of an offered address (seconds)
pub const PREFERRED_LIFETIME: u32 = 60;

/// Valid lifetime of an offered address (seconds)
pub const VALID_LIFETIME: u32 = 90;

/// Preference value telling clients to pick this server right away
pub const SERVER_PREFERENCE: u8 = 255;

/// What the transport should do once a request is handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dhcp6Action {
    /// Send an encoded reply
    Reply {
        /// Where the request came from
        remote: SocketAddr,
        /// Advertise or Reply
        message_type: Dhcp6MessageType,
        /// DHCPv6 payload (UDP data)
        packet: Vec<u8>,
    },
    /// Request dropped, nothing to send
    None,
}

/// Reply accumulator for a single request
#[derive(Debug)]
pub struct ResponseSender {
    transaction_id: [u8; 3],
    remote: SocketAddr,
    options: Dhcp6Options,
}

impl ResponseSender {
    /// Start a reply to `request`. The Server ID and the client's own
    /// Client ID are always present.
    pub fn new(request: &Request, server_duid: &Duid) -> Result<Self> {
        let mut opts = Dhcp6Options::new();
        opts.add_raw(options::SERVER_ID, server_duid.to_bytes())?;
        if let Ok(client_id) = request.options.get_one(options::CLIENT_ID) {
            opts.add_raw(options::CLIENT_ID, client_id)?;
        }

        Ok(Self {
            transaction_id: request.transaction_id,
            remote: request.remote,
            options: opts,
        })
    }

    /// Top-level options of the reply
    pub fn options(&mut self) -> &mut Dhcp6Options {
        &mut self.options
    }

    /// Finalize the reply as `message_type`.
    pub fn send(self, message_type: Dhcp6MessageType) -> Result<Dhcp6Action> {
        if !matches!(
            message_type,
            Dhcp6MessageType::Advertise | Dhcp6MessageType::Reply
        ) {
            return Err(Error::InvalidReplyType(message_type.to_string()));
        }

        let packet = Dhcp6Builder::new(message_type)
            .transaction_id_bytes(self.transaction_id)
            .options(self.options)
            .build();

        trace!(
            remote = %self.remote,
            msg_type = %message_type,
            len = packet.len(),
            "reply ready"
        );

        Ok(Dhcp6Action::Reply {
            remote: self.remote,
            message_type,
            packet,
        })
    }
}

/// Grant `address` to the identity association and attach it to the
/// reply.
///
/// Any IAAddr the client echoed is replaced, so the reply carries exactly
/// one address per identity association. Call once per request.
pub fn add_address(w: &mut ResponseSender, mut ia: IaNa, address: Ipv6Addr) -> Result<()> {
    let iaaddr = IaAddr::new(
        address,
        PREFERRED_LIFETIME,
        VALID_LIFETIME,
        Dhcp6Options::new(),
    )?;

    ia.options.remove(options::IA_ADDR);
    ia.options.add_ia_addr(&iaaddr)?;
    w.options().add_ia_na(&ia)
}
