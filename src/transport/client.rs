//! Initiator-side client: connect, negotiate, send files, disconnect.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info};

use super::config::TlsClientConfig;
use super::TransportKind;
use crate::codec::OftpFrameCodec;
use crate::error::{OftpError, Result};
use crate::protocol::{
    Command, Disposition, EndReason, FileEndParams, FileStartParams, Session,
    SessionConfiguration, SessionStats,
};

/// Object-safe alias over the two stream flavours (plain and TLS).
trait IoStream: AsyncRead + AsyncWrite + Unpin + Send + Sync {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send + Sync> IoStream for T {}

/// OFTP initiator.
///
/// Reproduces the canonical client call pattern: connect (which runs the
/// ready/start handshake), send zero or more files under credit control,
/// disconnect. One client drives one session over one connection.
pub struct OftpClient {
    addr: String,
    kind: TransportKind,
    tls: TlsClientConfig,
    defaults: SessionConfiguration,
    connection: Option<Connection>,
}

struct Connection {
    framed: Framed<Box<dyn IoStream>, OftpFrameCodec>,
    session: Session,
}

impl OftpClient {
    /// Create a plain-TCP client for the given `host:port` address.
    pub fn new(addr: impl Into<String>, defaults: SessionConfiguration) -> Self {
        Self {
            addr: addr.into(),
            kind: TransportKind::Tcp,
            tls: TlsClientConfig::default(),
            defaults,
            connection: None,
        }
    }

    /// Use TLS for the connection.
    pub fn with_tls(mut self, tls: TlsClientConfig) -> Self {
        self.kind = TransportKind::Tls;
        self.tls = tls;
        self
    }

    /// Whether a session is currently established.
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|c| !c.session.is_ended())
    }

    /// Negotiated configuration of the current session.
    pub fn configuration(&self) -> Option<&SessionConfiguration> {
        self.connection.as_ref()?.session.configuration()
    }

    /// Statistics of the current session.
    pub fn stats(&self) -> Option<SessionStats> {
        self.connection.as_ref().map(|c| c.session.stats())
    }

    /// Connect and complete the session start handshake.
    ///
    /// Waits for the responder's ready greeting, proposes this side's
    /// defaults and adopts the negotiated answer.
    pub async fn connect(&mut self) -> Result<()> {
        let stream = self.open_stream().await?;
        let mut framed = Framed::new(stream, OftpFrameCodec::initiator());
        let mut session = Session::new(self.defaults.clone());

        match next_command(&mut framed).await? {
            Command::SessionReady => {}
            other => {
                return Err(OftpError::Handshake(format!(
                    "expected ready greeting, got {other:?}"
                )))
            }
        }

        let proposal = session.create_session_start();
        framed.send(proposal).await?;

        match next_command(&mut framed).await? {
            ack @ Command::SessionStartAck(_) => {
                session.process_command(&ack);
            }
            Command::SessionEnd { reason, .. } => {
                return Err(OftpError::Handshake(format!(
                    "session start refused with reason {}",
                    reason.code()
                )))
            }
            other => {
                return Err(OftpError::Handshake(format!(
                    "expected negotiated answer, got {other:?}"
                )))
            }
        }

        info!(
            session_id = %session.id(),
            addr = %self.addr,
            transport = %self.kind,
            "connected"
        );
        self.connection = Some(Connection { framed, session });
        Ok(())
    }

    /// Transmit one file under credit control.
    ///
    /// Splits `content` into data units of the negotiated buffer size and
    /// waits for a credit grant every time the window is exhausted.
    /// Returns the duration the responder will also have observed.
    pub async fn send_file(
        &mut self,
        params: FileStartParams,
        content: &[u8],
    ) -> Result<Duration> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| OftpError::Protocol("not connected".to_string()))?;
        let config = connection
            .session
            .configuration()
            .ok_or_else(|| OftpError::Protocol("session not established".to_string()))?;
        let buffer_size = config.buffer_size as usize;
        let credit = config.credit;
        if credit == 0 {
            return Err(OftpError::Protocol(
                "negotiated credit window is zero".to_string(),
            ));
        }

        let dataset = params.dataset.clone();
        let file_start = connection.session.create_file_start(params);
        connection.framed.send(file_start).await?;

        let ack = next_non_credit(&mut connection.framed).await?;
        connection.session.process_command(&ack);
        match ack {
            Command::FileStartAck { .. } => {}
            other => {
                return Err(OftpError::Protocol(format!(
                    "expected file start answer, got {other:?}"
                )))
            }
        }

        let mut window = credit;
        let mut unit_count = 0u64;
        for chunk in content.chunks(buffer_size) {
            if window == 0 {
                match next_command(&mut connection.framed).await? {
                    Command::CreditGrant => window = credit,
                    other => {
                        return Err(OftpError::Protocol(format!(
                            "expected credit grant, got {other:?}"
                        )))
                    }
                }
            }
            connection.framed.send(Command::data(chunk.to_vec())).await?;
            window -= 1;
            unit_count += 1;
        }
        debug!(dataset = %dataset, units = unit_count, "data units sent");

        connection
            .framed
            .send(Command::FileEnd(FileEndParams {
                record_count: 0,
                unit_count,
            }))
            .await?;

        let ack = next_non_credit(&mut connection.framed).await?;
        connection.session.process_command(&ack);
        match ack {
            Command::FileEndAck { disposition } => {
                if disposition != Disposition::NoError {
                    return Err(OftpError::Protocol(format!(
                        "file refused with disposition {disposition:?}"
                    )));
                }
            }
            other => {
                return Err(OftpError::Protocol(format!(
                    "expected file end answer, got {other:?}"
                )))
            }
        }

        let elapsed = connection
            .session
            .last_transfer_elapsed()
            .unwrap_or_default();
        info!(
            session_id = %connection.session.id(),
            dataset = %dataset,
            units = unit_count,
            "file sent"
        );
        Ok(elapsed)
    }

    /// End the session and close the connection.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut connection) = self.connection.take() {
            let end = connection.session.create_session_end(EndReason::Normal);
            connection.framed.send(end).await?;
            connection.framed.close().await?;
            info!(session_id = %connection.session.id(), "disconnected");
        }
        Ok(())
    }

    async fn open_stream(&self) -> Result<Box<dyn IoStream>> {
        let tcp = TcpStream::connect(&self.addr).await?;
        match self.kind {
            TransportKind::Tcp => Ok(Box::new(tcp)),
            TransportKind::Tls => {
                let connector = self.tls.build_connector()?;
                let host = self
                    .addr
                    .rsplit_once(':')
                    .map_or(self.addr.as_str(), |(host, _)| host);
                let server_name = rustls::ServerName::try_from(host)
                    .map_err(|e| OftpError::Tls(format!("Invalid server name '{host}': {e}")))?;
                let stream = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(|e| OftpError::Tls(format!("TLS handshake failed: {e}")))?;
                Ok(Box::new(stream))
            }
        }
    }
}

/// Read the next command or fail on end of stream.
async fn next_command(
    framed: &mut Framed<Box<dyn IoStream>, OftpFrameCodec>,
) -> Result<Command> {
    framed
        .next()
        .await
        .ok_or_else(|| OftpError::Protocol("connection closed by peer".to_string()))?
}

/// Like [`next_command`] but skips credit grants left over from a window
/// that was exhausted by the final data unit of a file.
async fn next_non_credit(
    framed: &mut Framed<Box<dyn IoStream>, OftpFrameCodec>,
) -> Result<Command> {
    loop {
        match next_command(framed).await? {
            Command::CreditGrant => continue,
            other => return Ok(other),
        }
    }
}
