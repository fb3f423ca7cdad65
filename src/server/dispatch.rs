//! Per-request entry point
//!
//! Routes each decoded client message to its lease handler. Every request
//! is handled on its own: failures are logged here and never reach the
//! transport or affect other requests.

use crate::protocol::dhcpv6::{options, Dhcp6Message, Dhcp6MessageType, Dhcp6Options, Duid};
use crate::protocol::HexBytes;
use crate::server::eui64::{self, Prefix};
use crate::server::identity;
use crate::server::lease;
use crate::server::reply::{Dhcp6Action, ResponseSender};
use crate::telemetry::ServerStats;
use crate::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A decoded client message and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub message_type: Dhcp6MessageType,
    pub transaction_id: [u8; 3],
    pub remote: SocketAddr,
    pub options: Dhcp6Options,
    /// Datagram length in bytes
    pub length: usize,
}

impl Request {
    /// Decode a UDP payload received from `remote`
    pub fn parse(payload: &[u8], remote: SocketAddr) -> Result<Self> {
        let msg = Dhcp6Message::parse(payload)?;
        Ok(Self {
            message_type: msg.message_type,
            transaction_id: msg.transaction_id,
            remote,
            options: msg.options,
            length: payload.len(),
        })
    }
}

/// Lease handler selected for a message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Solicit,
    Assign,
    Release,
}

impl Handler {
    fn for_message(message_type: Dhcp6MessageType) -> Option<Self> {
        match message_type {
            Dhcp6MessageType::Solicit => Some(Handler::Solicit),
            Dhcp6MessageType::Request
            | Dhcp6MessageType::Renew
            | Dhcp6MessageType::Rebind
            | Dhcp6MessageType::Confirm => Some(Handler::Assign),
            Dhcp6MessageType::Release => Some(Handler::Release),
            _ => None,
        }
    }
}

/// DHCPv6 request dispatcher.
///
/// Holds only read-only configuration, so one instance can be shared by
/// every in-flight request.
#[derive(Debug)]
pub struct Dispatcher {
    prefix: Prefix,
    server_duid: Duid,
    stats: Arc<ServerStats>,
}

impl Dispatcher {
    pub fn new(prefix: Prefix, server_duid: Duid, stats: Arc<ServerStats>) -> Self {
        Self {
            prefix,
            server_duid,
            stats,
        }
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn server_duid(&self) -> &Duid {
        &self.server_duid
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    /// Handle one request. Errors are logged and turn into
    /// [`Dhcp6Action::None`].
    pub fn dispatch(&self, request: &Request) -> Dhcp6Action {
        self.stats.received.inc();

        match self.serve(request) {
            Ok(action) => {
                match &action {
                    Dhcp6Action::Reply {
                        message_type: Dhcp6MessageType::Advertise,
                        ..
                    } => self.stats.advertised.inc(),
                    Dhcp6Action::Reply { .. } => self.stats.replied.inc(),
                    Dhcp6Action::None => self.stats.dropped.inc(),
                }
                action
            }
            Err(e) => {
                warn!(
                    remote = %request.remote,
                    msg_type = %request.message_type,
                    error = %e,
                    "failed to handle request"
                );
                self.stats.errors.inc();
                Dhcp6Action::None
            }
        }
    }

    fn serve(&self, request: &Request) -> Result<Dhcp6Action> {
        let Some(handler) = Handler::for_message(request.message_type) else {
            info!(msg_type = %request.message_type, "ignoring unsupported message type");
            return Ok(Dhcp6Action::None);
        };

        if let Ok(server_id) = request.options.get_one(options::SERVER_ID) {
            if server_id != self.server_duid.to_bytes().as_slice() {
                debug!(
                    server_id = %HexBytes(server_id),
                    "request addressed to another server"
                );
                return Ok(Dhcp6Action::None);
            }
        }

        let Ok(duid) = request.options.get_one(options::CLIENT_ID) else {
            info!(remote = %request.remote, "client ID not found");
            return Ok(Dhcp6Action::None);
        };

        let client = match identity::resolve(duid) {
            Ok(client) => client,
            Err(Error::UnknownDuid) => {
                info!(duid = %HexBytes(duid), "unknown duid type");
                return Ok(Dhcp6Action::None);
            }
            Err(e) => {
                info!(duid = %HexBytes(duid), error = %e, "unusable client identifier");
                return Ok(Dhcp6Action::None);
            }
        };

        info!(
            duid = %HexBytes(duid),
            ipv6 = %eui64::synthesize(&self.prefix, &client.hardware_addr),
            mac = %client.hardware_addr,
            remote = %request.remote,
            msg_type = %request.message_type,
            len = request.length,
            xid = %HexBytes(&request.transaction_id),
            "request"
        );

        if let Ok(codes) = request.options.option_request() {
            for code in codes {
                debug!(
                    code,
                    name = options::name(code).unwrap_or("unknown"),
                    "requested option"
                );
            }
        }

        let w = ResponseSender::new(request, &self.server_duid)?;
        match handler {
            Handler::Solicit => lease::solicit(&self.prefix, &client, request, w),
            Handler::Assign => lease::assign(&self.prefix, &client, request, w),
            Handler::Release => lease::release(&client, w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::dhcpv6::{Dhcp6Builder, IaNa, HARDWARE_TYPE_ETHERNET};

    fn server_duid() -> Duid {
        Duid::Ll {
            hardware_type: HARDWARE_TYPE_ETHERNET,
            link_layer_addr: vec![0x02, 0, 0, 0, 0, 0x01],
        }
    }

    fn client_duid() -> Duid {
        Duid::Llt {
            hardware_type: HARDWARE_TYPE_ETHERNET,
            time: 600_000_000,
            link_layer_addr: vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
        }
    }

    fn make_dispatcher() -> Dispatcher {
        Dispatcher::new(
            "dead:beef:2018::/64".parse().unwrap(),
            server_duid(),
            Arc::new(ServerStats::new()),
        )
    }

    fn make_request(builder: Dhcp6Builder) -> Request {
        let packet = builder.build();
        Request::parse(&packet, "[fe80::211:22ff:fe33:4455]:546".parse().unwrap()).unwrap()
    }

    fn with_client(message_type: Dhcp6MessageType) -> Dhcp6Builder {
        Dhcp6Builder::new(message_type)
            .transaction_id(0x010203)
            .client_id(&client_duid())
            .unwrap()
    }

    #[test]
    fn test_request_parse() {
        let request = make_request(with_client(Dhcp6MessageType::Solicit));
        assert_eq!(request.message_type, Dhcp6MessageType::Solicit);
        assert_eq!(request.transaction_id, [1, 2, 3]);
        assert_eq!(request.length, 4 + 4 + 14);
    }

    #[test]
    fn test_handler_table() {
        assert_eq!(
            Handler::for_message(Dhcp6MessageType::Solicit),
            Some(Handler::Solicit)
        );
        assert_eq!(
            Handler::for_message(Dhcp6MessageType::Confirm),
            Some(Handler::Assign)
        );
        assert_eq!(
            Handler::for_message(Dhcp6MessageType::Release),
            Some(Handler::Release)
        );
        assert_eq!(Handler::for_message(Dhcp6MessageType::Decline), None);
        assert_eq!(
            Handler::for_message(Dhcp6MessageType::InformationRequest),
            None
        );
    }

    #[test]
    fn test_dispatch_solicit() {
        let dispatcher = make_dispatcher();
        let request = make_request(
            with_client(Dhcp6MessageType::Solicit)
                .ia_na(&IaNa::new([0, 0, 0, 1], 0, 0))
                .unwrap(),
        );

        match dispatcher.dispatch(&request) {
            Dhcp6Action::Reply { message_type, .. } => {
                assert_eq!(message_type, Dhcp6MessageType::Advertise)
            }
            Dhcp6Action::None => panic!("Expected Advertise"),
        }
        assert_eq!(dispatcher.stats().advertised.get(), 1);
    }

    #[test]
    fn test_dispatch_unsupported_type() {
        let dispatcher = make_dispatcher();
        let request = make_request(with_client(Dhcp6MessageType::InformationRequest));
        assert_eq!(dispatcher.dispatch(&request), Dhcp6Action::None);
        assert_eq!(dispatcher.stats().dropped.get(), 1);
    }

    #[test]
    fn test_dispatch_missing_client_id() {
        let dispatcher = make_dispatcher();
        let request = make_request(
            Dhcp6Builder::new(Dhcp6MessageType::Release).transaction_id(1),
        );
        assert_eq!(dispatcher.dispatch(&request), Dhcp6Action::None);
    }

    #[test]
    fn test_dispatch_foreign_server_id() {
        let dispatcher = make_dispatcher();
        let other = Duid::Ll {
            hardware_type: HARDWARE_TYPE_ETHERNET,
            link_layer_addr: vec![0x02, 0, 0, 0, 0, 0x99],
        };
        let request = make_request(
            with_client(Dhcp6MessageType::Release)
                .server_id(&other)
                .unwrap(),
        );
        assert_eq!(dispatcher.dispatch(&request), Dhcp6Action::None);

        let request = make_request(
            with_client(Dhcp6MessageType::Release)
                .server_id(&server_duid())
                .unwrap(),
        );
        assert!(matches!(
            dispatcher.dispatch(&request),
            Dhcp6Action::Reply { .. }
        ));
    }

    #[test]
    fn test_dispatch_error_counted() {
        let dispatcher = make_dispatcher();
        let request = make_request(
            with_client(Dhcp6MessageType::Request)
                .option(options::IA_NA, vec![0u8; 2])
                .unwrap(),
        );
        assert_eq!(dispatcher.dispatch(&request), Dhcp6Action::None);
        assert_eq!(dispatcher.stats().errors.get(), 1);
        assert_eq!(dispatcher.stats().received.get(), 1);
    }
}
