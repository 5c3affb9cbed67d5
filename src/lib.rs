//! # OFTP Core - ODETTE File Transfer Protocol Session Engine
//!
//! Session engine for OFTP, the command/response file-transfer protocol
//! used for EDI exchange between trading partners over TCP, optionally
//! secured with TLS.
//!
//! ## Features
//!
//! - **Parameter negotiation**: buffer size, credit window and protocol
//!   level settle on the pairwise minimum of both peers' declarations
//! - **Credit-based flow control**: a sender may transmit exactly as many
//!   data units as the receiver granted before the next credit command
//! - **Both session roles**: the same engine drives the responder and the
//!   initiator with inverse command polarity
//! - **Framed TCP/TLS transport**: stream transmission headers over plain
//!   TCP (port 3305) or TLS (port 6619)
//!
//! ## Protocol Overview
//!
//! ```text
//! Initiator                         Responder
//!    |                                  |
//!    |<-------- SSRM (ready) ----------|
//!    |--------- SSID (proposal) ------>|
//!    |<-------- SSID (negotiated) -----|
//!    |                                  |
//!    |--------- SFID ----------------->|
//!    |<-------- SFPA ------------------|
//!    |========= DATA x credit ========>|
//!    |<-------- CDT -------------------|
//!    |--------- EFID ----------------->|
//!    |<-------- EFPA ------------------|
//!    |                                  |
//!    |--------- ESID ----------------->|
//! ```
//!
//! ## Quick Start
//!
//! ### Engine Only (No Transport)
//!
//! ```rust,ignore
//! use oftp::protocol::{Command, Session, SessionConfiguration};
//!
//! let defaults = SessionConfiguration::new("O0055LOCAL", "SECRET");
//! let mut responder = Session::new(defaults);
//!
//! // Feed decoded commands, write back whatever the engine answers.
//! if let Some(response) = responder.process_command(&incoming) {
//!     send(response);
//! }
//! if responder.is_ended() {
//!     close_connection();
//! }
//! ```
//!
//! ### Responder
//!
//! ```rust,ignore
//! use oftp::{OftpServer, SessionConfiguration};
//!
//! let defaults = SessionConfiguration::new("O0055LOCAL", "SECRET");
//! let server = OftpServer::bind("127.0.0.1:3305", defaults).await?;
//! server.run().await?;
//! ```
//!
//! ### Initiator
//!
//! ```rust,ignore
//! use oftp::{FileStartParams, OftpClient, SessionConfiguration};
//!
//! let defaults = SessionConfiguration::new("O9999REMOTE", "SECRET");
//! let mut client = OftpClient::new("partner.example.net:3305", defaults);
//! client.connect().await?;
//! client
//!     .send_file(FileStartParams::new("INVOICES", "O9999REMOTE", "O0055LOCAL"), &content)
//!     .await?;
//! client.disconnect().await?;
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: command model, negotiation and the session state machine
//! - [`codec`]: exchange buffer encoding and stream transmission framing
//! - [`transport`]: TCP/TLS listener and client
//! - [`config`]: configuration management
//! - [`error`]: error types and result alias

pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use codec::OftpFrameCodec;
pub use config::Config;
pub use error::{OftpError, Result};
pub use protocol::{
    Command, Disposition, EndReason, FileEndParams, FileStartParams, Session,
    SessionConfiguration, SessionLifecycle, SessionStats, OFTP_LEVEL,
};
pub use transport::{OftpClient, OftpServer, TlsClientConfig, TlsConfig, TransportKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
