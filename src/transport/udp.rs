//! UDP socket on the DHCPv6 server port

use super::{RxInfo, Transport};
use crate::protocol::dhcpv6::{ALL_DHCP_SERVERS, DHCP6_SERVER_PORT};
use crate::{Error, Result};
use std::ffi::CString;
use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};
use tokio::net::UdpSocket;
use tracing::info;

/// UDP socket bound to `[::]:547` and joined to ff02::1:2 on one interface
pub struct UdpTransport {
    socket: UdpSocket,
    ifindex: u32,
}

impl UdpTransport {
    /// Bind the server port and join the All_DHCP_Relay_Agents_and_Servers
    /// group on `ifname`.
    pub async fn bind(ifname: &str) -> Result<Self> {
        let ifindex = Self::get_ifindex(ifname)?;

        let local = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, DHCP6_SERVER_PORT, 0, 0);
        let socket = UdpSocket::bind(local).await.map_err(Error::Io)?;
        socket
            .join_multicast_v6(&ALL_DHCP_SERVERS, ifindex)
            .map_err(Error::Io)?;

        info!(
            interface = ifname,
            ifindex,
            group = %ALL_DHCP_SERVERS,
            port = DHCP6_SERVER_PORT,
            "listening"
        );
        Ok(Self { socket, ifindex })
    }

    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    fn get_ifindex(ifname: &str) -> Result<u32> {
        let ifname_c = CString::new(ifname).map_err(|_| Error::InterfaceNotFound {
            name: ifname.to_string(),
        })?;

        let ifindex = unsafe { libc::if_nametoindex(ifname_c.as_ptr()) };
        if ifindex == 0 {
            return Err(Error::InterfaceNotFound {
                name: ifname.to_string(),
            });
        }

        Ok(ifindex)
    }
}

impl Transport for UdpTransport {
    async fn recv(&self, buf: &mut [u8]) -> Result<RxInfo> {
        let (len, remote) = self.socket.recv_from(buf).await.map_err(Error::Io)?;
        Ok(RxInfo { len, remote })
    }

    async fn send(&self, buf: &[u8], target: SocketAddr) -> Result<usize> {
        self.socket.send_to(buf, target).await.map_err(Error::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_interface() {
        let err = UdpTransport::get_ifindex("nonexistent0").unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound { .. }));
    }

    #[test]
    fn test_interface_name_with_nul() {
        let err = UdpTransport::get_ifindex("eth\0").unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound { .. }));
    }
}
