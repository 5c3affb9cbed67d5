//! OFTP error types.

use thiserror::Error;

/// Errors produced outside the session engine.
///
/// The engine itself maps every recognised protocol condition to a
/// response command or a connection close; these variants cover the
/// codec, transport and configuration layers around it.
#[derive(Error, Debug)]
pub enum OftpError {
    /// A received exchange buffer could not be decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// The peer broke the command/response contract during a client
    /// driven exchange (e.g. an unexpected answer to a file start).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The session handshake did not complete.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Server-side error.
    #[error("Server error: {0}")]
    Server(String),

    /// TLS setup or negotiation error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for OFTP operations
pub type Result<T> = std::result::Result<T, OftpError>;

impl From<toml::de::Error> for OftpError {
    fn from(err: toml::de::Error) -> Self {
        OftpError::Config(err.to_string())
    }
}
