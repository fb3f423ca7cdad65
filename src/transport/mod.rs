//! Datagram transport
//!
//! The receive loop reads one datagram at a time and hands each to its
//! own task; a slow or failing request never blocks the next one.

mod udp;

pub use udp::UdpTransport;

use crate::server::{Dhcp6Action, Dispatcher, Request};
use crate::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Largest datagram accepted
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// How often counters are written to the log
pub const STATS_INTERVAL: Duration = Duration::from_secs(60);

/// Information about a received datagram
#[derive(Debug, Clone, Copy)]
pub struct RxInfo {
    /// Number of bytes received
    pub len: usize,
    /// Source address and port
    pub remote: SocketAddr,
}

/// Datagram backend trait
pub trait Transport: Send + Sync {
    /// Receive a datagram into the provided buffer
    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = Result<RxInfo>> + Send;

    /// Send a datagram to `target`
    fn send(&self, buf: &[u8], target: SocketAddr) -> impl Future<Output = Result<usize>> + Send;
}

/// Decode and dispatch one datagram. Returns the reply to send, if any.
pub fn handle_datagram(
    dispatcher: &Dispatcher,
    payload: &[u8],
    remote: SocketAddr,
) -> Option<(SocketAddr, Vec<u8>)> {
    let request = match Request::parse(payload, remote) {
        Ok(request) => request,
        Err(e) => {
            debug!(
                remote = %remote,
                len = payload.len(),
                error = %e,
                "dropping malformed datagram"
            );
            dispatcher.stats().rx_errors.inc();
            return None;
        }
    };

    match dispatcher.dispatch(&request) {
        Dhcp6Action::Reply { remote, packet, .. } => Some((remote, packet)),
        Dhcp6Action::None => None,
    }
}

/// Serve requests. Receive errors are logged and counted, never fatal.
pub async fn serve<T: Transport + 'static>(
    transport: Arc<T>,
    dispatcher: Arc<Dispatcher>,
) -> Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut stats_timer = tokio::time::interval(STATS_INTERVAL);

    loop {
        tokio::select! {
            _ = stats_timer.tick() => {
                for (name, value) in dispatcher.stats().export() {
                    debug!(counter = %name, value, "stats");
                }
            }
            rx = transport.recv(&mut buf) => {
                let rx = match rx {
                    Ok(rx) => rx,
                    Err(e) => {
                        error!("Receive error: {}", e);
                        dispatcher.stats().rx_errors.inc();
                        continue;
                    }
                };

                let payload = buf[..rx.len].to_vec();
                let transport = Arc::clone(&transport);
                let dispatcher = Arc::clone(&dispatcher);

                tokio::spawn(async move {
                    let Some((target, packet)) = handle_datagram(&dispatcher, &payload, rx.remote)
                    else {
                        return;
                    };
                    match transport.send(&packet, target).await {
                        Ok(n) => dispatcher.stats().record_tx(n),
                        Err(e) => {
                            warn!(remote = %target, error = %e, "Failed to send reply");
                            dispatcher.stats().tx_errors.inc();
                        }
                    }
                });
            }
        }
    }
}
