use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Host the downstream peer listens on when none is configured.
pub const DEFAULT_PEER_HOST: &str = "127.0.0.1";

/// OSC port the downstream peer listens on when none is configured.
pub const DEFAULT_PEER_PORT: u16 = 12000;

/// The fixed downstream peer every message is sent to.
///
/// Parsed from `host:port` (IPv6 hosts in brackets, `[::1]:12000`) and
/// resolved exactly once, when the transport is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerEndpoint {
    host: String,
    port: u16,
}

impl PeerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve to the first socket address the host maps to.
    pub fn resolve(&self) -> Result<SocketAddr> {
        let endpoint = self.to_string();
        let mut addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                endpoint: endpoint.clone(),
                source,
            })?;
        let addr = addrs.next().ok_or_else(|| TransportError::Resolve {
            endpoint: endpoint.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "host resolved to no addresses",
            ),
        })?;
        debug!(%endpoint, %addr, "resolved peer endpoint");
        Ok(addr)
    }
}

impl Default for PeerEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_HOST, DEFAULT_PEER_PORT)
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for PeerEndpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason| TransportError::InvalidEndpoint {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        let (host, port) = trimmed
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing ':port'"))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        if host.contains(':') && !trimmed.starts_with('[') {
            return Err(invalid("IPv6 hosts must be written as [addr]:port"));
        }

        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;
        if port == 0 {
            return Err(invalid("port must be non-zero"));
        }

        Ok(Self::new(host, port))
    }
}

impl From<SocketAddr> for PeerEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}
