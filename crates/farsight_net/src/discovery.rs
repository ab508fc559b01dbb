//! # UDP Discovery
//!
//! Displays find providers by sending a `DISCOVER` datagram to the multicast
//! group. Every provider that is open answers with its TCP port and name.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use farsight_shared::protocol::{DiscoveryHeader, DiscoveryResponse, DiscoveryType};
use farsight_shared::{DEFAULT_PORT, MULTICAST_GROUP};
use tracing::{debug, info, warn};

use crate::error::NetResult;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A provider that answered a probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredProvider {
    /// Provider name.
    pub name: String,
    /// Address to open the TCP session on.
    pub addr: SocketAddr,
}

/// Answers discovery probes on a background thread until dropped.
pub struct DiscoveryResponder {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DiscoveryResponder {
    /// Listens on the default discovery port and joins the multicast group.
    ///
    /// # Errors
    ///
    /// Fails if the port cannot be bound.
    pub fn spawn(name: &str, tcp_port: u16) -> NetResult<Self> {
        Self::bind(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)), name, tcp_port)
    }

    /// Listens on `addr`. Joining the multicast group is attempted but not required.
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot be bound or configured.
    pub fn bind(addr: SocketAddr, name: &str, tcp_port: u16) -> NetResult<Self> {
        let socket = UdpSocket::bind(addr)?;
        if let Err(e) = socket.join_multicast_v4(&MULTICAST_GROUP, &Ipv4Addr::UNSPECIFIED) {
            debug!("Multicast join failed, answering unicast probes only: {e}");
        }
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let local_addr = socket.local_addr()?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let response = DiscoveryResponse::new(name, tcp_port);
        let thread = std::thread::Builder::new()
            .name("farsight-discovery".into())
            .spawn(move || respond_loop(&socket, &flag, &response))?;

        info!("Discovery responder on {local_addr} announcing port {tcp_port}");
        Ok(Self {
            local_addr,
            running,
            thread: Some(thread),
        })
    }

    /// Address the responder listens on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the responder thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for DiscoveryResponder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn respond_loop(socket: &UdpSocket, running: &AtomicBool, response: &DiscoveryResponse) {
    let mut buf = [0u8; 256];
    while running.load(Ordering::Relaxed) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => continue,
            Err(e) => {
                warn!("Discovery socket failed: {e}");
                return;
            }
        };
        let Some(header) = parse_header(&buf[..len]) else {
            continue;
        };
        if header.kind() == Some(DiscoveryType::Discover) {
            debug!("Discovery probe from {from}");
            if let Err(e) = socket.send_to(bytemuck::bytes_of(response), from) {
                warn!("Discovery reply to {from} failed: {e}");
            }
        }
    }
}

fn parse_header(bytes: &[u8]) -> Option<DiscoveryHeader> {
    let size = std::mem::size_of::<DiscoveryHeader>();
    bytes.get(..size).map(bytemuck::pod_read_unaligned)
}

fn parse_response(bytes: &[u8]) -> Option<DiscoveryResponse> {
    let size = std::mem::size_of::<DiscoveryResponse>();
    let response: DiscoveryResponse = bytes.get(..size).map(bytemuck::pod_read_unaligned)?;
    (response.header.kind() == Some(DiscoveryType::RespondDiscover)).then_some(response)
}

/// Probes the multicast group and collects answers until `timeout` elapses.
///
/// # Errors
///
/// Fails if the probe socket cannot be created or the probe cannot be sent.
pub fn discover(timeout: Duration) -> NetResult<Vec<DiscoveredProvider>> {
    discover_at(SocketAddr::V4(SocketAddrV4::new(MULTICAST_GROUP, DEFAULT_PORT)), timeout)
}

/// Probes one address and collects answers until `timeout` elapses.
///
/// # Errors
///
/// Fails if the probe socket cannot be created or the probe cannot be sent.
pub fn discover_at(target: SocketAddr, timeout: Duration) -> NetResult<Vec<DiscoveredProvider>> {
    let bind_ip = if target.ip().is_loopback() {
        Ipv4Addr::LOCALHOST
    } else {
        Ipv4Addr::UNSPECIFIED
    };
    let socket = UdpSocket::bind(SocketAddrV4::new(bind_ip, 0))?;
    socket.set_read_timeout(Some(POLL_INTERVAL))?;
    let probe = DiscoveryHeader::new(DiscoveryType::Discover);
    socket.send_to(bytemuck::bytes_of(&probe), target)?;

    let deadline = Instant::now() + timeout;
    let mut found: Vec<DiscoveredProvider> = Vec::new();
    let mut buf = [0u8; 256];
    while Instant::now() < deadline {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => continue,
            Err(e) => return Err(e.into()),
        };
        let Some(response) = parse_response(&buf[..len]) else {
            continue;
        };
        let addr = SocketAddr::new(from.ip(), response.tcp_port);
        if found.iter().all(|p| p.addr != addr) {
            found.push(DiscoveredProvider {
                name: response.name(),
                addr,
            });
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_foreign_datagrams() {
        assert!(parse_header(&[1, 2]).is_none());
        let mut bytes = bytemuck::bytes_of(&DiscoveryResponse::new("x", 1)).to_vec();
        assert!(parse_response(&bytes).is_some());
        bytes[0] ^= 0xff;
        assert!(parse_response(&bytes).is_none());
    }

    #[test]
    fn test_discover_loopback() {
        let responder =
            DiscoveryResponder::bind("127.0.0.1:0".parse().unwrap(), "kitchen", 4242).unwrap();
        let found = discover_at(responder.local_addr(), Duration::from_millis(500)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "kitchen");
        assert_eq!(found[0].addr.port(), 4242);
    }
}
