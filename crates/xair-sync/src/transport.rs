/// UDP transport for the mixer's OSC port.
///
/// One `Transport` is one ephemeral local socket. The recall path and each
/// discovery run own separate instances so replies can never be read by
/// the wrong consumer.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use xair_protocol::{DEFAULT_MIXER_HOST, DEFAULT_MIXER_PORT, MAX_DATAGRAM_SIZE};

use crate::error::TransportError;

/// Mixer control address. Resolved once per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Blank host or port 0 fall back to the defaults.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let host = match host.trim() {
            "" => DEFAULT_MIXER_HOST.to_string(),
            trimmed => trimmed.to_string(),
        };
        let port = if port == 0 { DEFAULT_MIXER_PORT } else { port };
        Self { host, port }
    }

    /// Resolve to a socket address, preferring IPv4.
    pub async fn resolve(&self) -> Result<SocketAddr, TransportError> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|source| TransportError::Resolve {
                endpoint: self.to_string(),
                source,
            })?
            .collect();

        addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| TransportError::NoAddress(self.to_string()))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_MIXER_HOST, DEFAULT_MIXER_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Outcome of a single bounded receive.
#[derive(Debug)]
pub enum Received {
    Datagram { data: Vec<u8>, from: SocketAddr },
    /// Nothing arrived in time. Expected, not an error.
    Timeout,
}

pub struct Transport {
    socket: UdpSocket,
}

impl Transport {
    /// Bind an ephemeral socket in the same address family as `target`.
    /// Must be called from within a tokio runtime.
    pub fn bind_for(target: SocketAddr) -> Result<Self, TransportError> {
        let (domain, local): (Domain, SocketAddr) = match target {
            SocketAddr::V4(_) => (Domain::IPV4, (Ipv4Addr::UNSPECIFIED, 0).into()),
            SocketAddr::V6(_) => (Domain::IPV6, (Ipv6Addr::UNSPECIFIED, 0).into()),
        };

        let socket = {
            let s = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
                .map_err(TransportError::Bind)?;
            s.bind(&local.into()).map_err(TransportError::Bind)?;
            s.set_nonblocking(true).map_err(TransportError::Bind)?;
            UdpSocket::from_std(s.into()).map_err(TransportError::Bind)?
        };

        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket.local_addr().map_err(TransportError::Bind)
    }

    /// Best-effort send of one datagram. No retry.
    pub async fn send(&self, target: SocketAddr, data: &[u8]) -> Result<(), TransportError> {
        self.socket
            .send_to(data, target)
            .await
            .map(|_| ())
            .map_err(|source| TransportError::Send { target, source })
    }

    /// Wait up to `timeout` for one datagram.
    pub async fn receive(&self, timeout: Duration) -> Result<Received, TransportError> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        match tokio::time::timeout(timeout, self.socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => Ok(Received::Datagram {
                data: buf[..len].to_vec(),
                from,
            }),
            Ok(Err(e)) => Err(TransportError::Receive(e)),
            Err(_) => Ok(Received::Timeout),
        }
    }
}
