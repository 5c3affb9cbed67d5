//! Transport layer for OFTP sessions.
//!
//! OFTP runs over an ordered, reliable byte stream: plain TCP
//! (odette-ftp, port 3305) or TLS (odette-ftps, port 6619). The transport
//! owns all I/O and all blocking; the session engine only ever sees
//! decoded [`crate::protocol::Command`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            Session engine                │
//! │      (pure, per-connection state)        │
//! └───────────────────┬──────────────────────┘
//!                     │ Command in / Command out
//! ┌───────────────────┴──────────────────────┐
//! │   Framed stream (OftpFrameCodec)         │
//! └───────────────────┬──────────────────────┘
//!           ┌─────────┴─────────┐
//!           ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐
//! │    TcpStream    │ │  TLS over TCP   │
//! │   (port 3305)   │ │   (port 6619)   │
//! └─────────────────┘ └─────────────────┘
//! ```

mod client;
mod config;
mod server;

pub use client::OftpClient;
pub use config::{CertConfig, TlsClientConfig, TlsConfig};
pub use server::OftpServer;

/// Transport kind selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// Plain TCP (default).
    #[default]
    Tcp,
    /// TLS over TCP.
    Tls,
}

impl TransportKind {
    /// Get descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Tls => "TLS",
        }
    }

    /// Well-known port for this transport.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Tcp => 3305,
            Self::Tls => 6619,
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" | "plain" => Ok(Self::Tcp),
            "tls" | "ssl" => Ok(Self::Tls),
            _ => Err(format!("Unknown transport kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!(TransportKind::from_str("tcp").unwrap(), TransportKind::Tcp);
        assert_eq!(TransportKind::from_str("TLS").unwrap(), TransportKind::Tls);
        assert!(TransportKind::from_str("quic").is_err());
    }

    #[test]
    fn test_transport_kind_ports() {
        assert_eq!(TransportKind::Tcp.default_port(), 3305);
        assert_eq!(TransportKind::Tls.default_port(), 6619);
    }
}
