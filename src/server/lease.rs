//! Lease handling per message type
//!
//! Nothing is remembered between requests. Every Solicit, Request, Renew,
//! Rebind and Confirm re-derives the client's address from its hardware
//! address, and Release is acknowledged without any state change.

use crate::protocol::dhcpv6::{Dhcp6MessageType, IaNa, OptionError};
use crate::protocol::HexBytes;
use crate::server::eui64::{self, Prefix};
use crate::server::identity::ClientIdentity;
use crate::server::reply::{self, Dhcp6Action, ResponseSender, SERVER_PREFERENCE};
use crate::server::Request;
use crate::Result;
use tracing::{debug, info};

/// Solicit: advertise a freshly derived address.
///
/// An address echoed by the client is ignored; the server decides.
pub fn solicit(
    prefix: &Prefix,
    client: &ClientIdentity,
    request: &Request,
    mut w: ResponseSender,
) -> Result<Dhcp6Action> {
    let Some(ia) = select_identity_association(request)? else {
        return Ok(Dhcp6Action::None);
    };

    let address = eui64::synthesize(prefix, &client.hardware_addr);

    w.options().add_preference(SERVER_PREFERENCE)?;
    reply::add_address(&mut w, ia, address)?;

    info!(ipv6 = %address, mac = %client.hardware_addr, "advertising address");
    w.send(Dhcp6MessageType::Advertise)
}

/// Request, Renew, Rebind and Confirm: reply with the client's address.
///
/// The address is recomputed from the hardware address rather than taken
/// from the request, so a client can only ever hold its own address.
pub fn assign(
    prefix: &Prefix,
    client: &ClientIdentity,
    request: &Request,
    mut w: ResponseSender,
) -> Result<Dhcp6Action> {
    let Some(ia) = select_identity_association(request)? else {
        return Ok(Dhcp6Action::None);
    };

    let address = eui64::synthesize(prefix, &client.hardware_addr);
    reply::add_address(&mut w, ia, address)?;

    info!(
        ipv6 = %address,
        mac = %client.hardware_addr,
        msg_type = %request.message_type,
        "confirming address"
    );
    w.send(Dhcp6MessageType::Reply)
}

/// Release: acknowledge with an empty Reply
pub fn release(client: &ClientIdentity, w: ResponseSender) -> Result<Dhcp6Action> {
    debug!(mac = %client.hardware_addr, "release acknowledged");
    w.send(Dhcp6MessageType::Reply)
}

/// The request's single IA_NA, or `None` when the request should be
/// ignored: no IA_NA, several IA_NAs, or several addresses in it.
fn select_identity_association(request: &Request) -> Result<Option<IaNa>> {
    let mut ias = match request.options.ia_nas() {
        Ok(ias) => ias,
        Err(OptionError::Absent(_)) => {
            debug!("no IANAs provided");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if ias.len() > 1 {
        info!(count = ias.len(), "can only handle one IANA");
        return Ok(None);
    }
    let ia = ias.remove(0);

    debug!(
        iaid = %HexBytes(&ia.iaid),
        t1 = ia.t1,
        t2 = ia.t2,
        "IANA"
    );

    match ia.options.ia_addrs() {
        Ok(addrs) if addrs.len() > 1 => {
            info!(count = addrs.len(), "can only handle one IAAddr per IANA");
            return Ok(None);
        }
        Ok(addrs) => {
            let iaa = &addrs[0];
            debug!(
                ipv6 = %iaa.address,
                preferred = iaa.preferred_lifetime,
                valid = iaa.valid_lifetime,
                "IAAddr requested by client"
            );
        }
        Err(OptionError::Absent(_)) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Some(ia))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::dhcpv6::{
        options, Dhcp6Message, Dhcp6Options, Duid, IaAddr, HARDWARE_TYPE_ETHERNET,
    };
    use crate::protocol::{HardwareAddr, MacAddr};
    use crate::server::reply::{PREFERRED_LIFETIME, VALID_LIFETIME};
    use crate::Error;
    use std::net::Ipv6Addr;

    const MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];

    fn prefix() -> Prefix {
        "dead:beef:2018::/64".parse().unwrap()
    }

    fn expected_address() -> Ipv6Addr {
        "dead:beef:2018::211:22ff:fe33:4455".parse().unwrap()
    }

    fn client() -> ClientIdentity {
        ClientIdentity {
            duid: Duid::Ll {
                hardware_type: HARDWARE_TYPE_ETHERNET,
                link_layer_addr: MAC.to_vec(),
            },
            hardware_addr: HardwareAddr::Eui48(MacAddr(MAC)),
        }
    }

    fn server_duid() -> Duid {
        Duid::Ll {
            hardware_type: HARDWARE_TYPE_ETHERNET,
            link_layer_addr: vec![0x02, 0, 0, 0, 0, 0x01],
        }
    }

    fn make_request(message_type: Dhcp6MessageType, ias: &[IaNa]) -> Request {
        let mut opts = Dhcp6Options::new();
        opts.add_raw(options::CLIENT_ID, client().duid.to_bytes())
            .unwrap();
        for ia in ias {
            opts.add_ia_na(ia).unwrap();
        }
        Request {
            message_type,
            transaction_id: [1, 2, 3],
            remote: "[fe80::211:22ff:fe33:4455]:546".parse().unwrap(),
            options: opts,
            length: 0,
        }
    }

    fn ia_with_addresses(addrs: &[Ipv6Addr]) -> IaNa {
        let mut ia = IaNa::new([0, 0, 0, 1], 0, 0);
        for addr in addrs {
            ia.options
                .add_ia_addr(&IaAddr::new(*addr, 3600, 7200, Dhcp6Options::new()).unwrap())
                .unwrap();
        }
        ia
    }

    fn run(
        handler: fn(&Prefix, &ClientIdentity, &Request, ResponseSender) -> Result<Dhcp6Action>,
        request: &Request,
    ) -> Dhcp6Action {
        let w = ResponseSender::new(request, &server_duid()).unwrap();
        handler(&prefix(), &client(), request, w).unwrap()
    }

    fn decode(action: Dhcp6Action) -> Dhcp6Message {
        match action {
            Dhcp6Action::Reply { packet, .. } => Dhcp6Message::parse(&packet).unwrap(),
            Dhcp6Action::None => panic!("Expected Reply action"),
        }
    }

    fn single_address(msg: &Dhcp6Message) -> IaAddr {
        let ias = msg.options.ia_nas().unwrap();
        assert_eq!(ias.len(), 1);
        let mut addrs = ias[0].options.ia_addrs().unwrap();
        assert_eq!(addrs.len(), 1);
        addrs.remove(0)
    }

    #[test]
    fn test_solicit_advertises() {
        let request = make_request(Dhcp6MessageType::Solicit, &[ia_with_addresses(&[])]);
        let msg = decode(run(solicit, &request));

        assert_eq!(msg.message_type, Dhcp6MessageType::Advertise);
        assert_eq!(msg.transaction_id, [1, 2, 3]);
        assert_eq!(msg.options.preference(), Ok(255));

        let iaa = single_address(&msg);
        assert_eq!(iaa.address, expected_address());
        assert_eq!(iaa.preferred_lifetime, PREFERRED_LIFETIME);
        assert_eq!(iaa.valid_lifetime, VALID_LIFETIME);
    }

    #[test]
    fn test_solicit_ignores_echoed_address() {
        let echoed = "2001:db8::1".parse().unwrap();
        let request = make_request(
            Dhcp6MessageType::Solicit,
            &[ia_with_addresses(&[echoed])],
        );
        let msg = decode(run(solicit, &request));

        assert_eq!(msg.message_type, Dhcp6MessageType::Advertise);
        assert_eq!(single_address(&msg).address, expected_address());
    }

    #[test]
    fn test_solicit_without_ia_dropped() {
        let request = make_request(Dhcp6MessageType::Solicit, &[]);
        assert_eq!(run(solicit, &request), Dhcp6Action::None);
    }

    #[test]
    fn test_solicit_two_ias_dropped() {
        let request = make_request(
            Dhcp6MessageType::Solicit,
            &[ia_with_addresses(&[]), ia_with_addresses(&[])],
        );
        assert_eq!(run(solicit, &request), Dhcp6Action::None);
    }

    #[test]
    fn test_assign_replies() {
        for message_type in [
            Dhcp6MessageType::Request,
            Dhcp6MessageType::Renew,
            Dhcp6MessageType::Rebind,
            Dhcp6MessageType::Confirm,
        ] {
            let echoed = "2001:db8::99".parse().unwrap();
            let request = make_request(message_type, &[ia_with_addresses(&[echoed])]);
            let msg = decode(run(assign, &request));

            assert_eq!(msg.message_type, Dhcp6MessageType::Reply);
            assert!(msg.options.preference().is_err());
            assert_eq!(single_address(&msg).address, expected_address());
        }
    }

    #[test]
    fn test_assign_without_prior_address() {
        let request = make_request(Dhcp6MessageType::Request, &[ia_with_addresses(&[])]);
        let msg = decode(run(assign, &request));
        assert_eq!(single_address(&msg).address, expected_address());
    }

    #[test]
    fn test_two_addresses_dropped() {
        let addrs = [
            "2001:db8::1".parse().unwrap(),
            "2001:db8::2".parse().unwrap(),
        ];
        let request = make_request(Dhcp6MessageType::Renew, &[ia_with_addresses(&addrs)]);
        assert_eq!(run(assign, &request), Dhcp6Action::None);

        let request = make_request(Dhcp6MessageType::Solicit, &[ia_with_addresses(&addrs)]);
        assert_eq!(run(solicit, &request), Dhcp6Action::None);
    }

    #[test]
    fn test_malformed_ia_is_error() {
        let mut request = make_request(Dhcp6MessageType::Request, &[]);
        request
            .options
            .add_raw(options::IA_NA, vec![0u8; 3])
            .unwrap();

        let w = ResponseSender::new(&request, &server_duid()).unwrap();
        let result = assign(&prefix(), &client(), &request, w);
        assert!(matches!(
            result,
            Err(Error::Option(OptionError::Malformed { .. }))
        ));
    }

    #[test]
    fn test_release_empty_reply() {
        let request = make_request(Dhcp6MessageType::Release, &[ia_with_addresses(&[])]);
        let w = ResponseSender::new(&request, &server_duid()).unwrap();
        let msg = decode(release(&client(), w).unwrap());

        assert_eq!(msg.message_type, Dhcp6MessageType::Reply);
        assert_eq!(
            msg.options.ia_nas(),
            Err(OptionError::Absent(options::IA_NA))
        );
        assert!(msg.options.preference().is_err());
    }
}
