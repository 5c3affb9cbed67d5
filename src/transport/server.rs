//! Responder-side listener: one spawned task per accepted connection.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

use super::config::TlsConfig;
use crate::codec::OftpFrameCodec;
use crate::error::Result;
use crate::protocol::{Session, SessionConfiguration};
use tokio_util::codec::Framed;

/// OFTP responder listening for initiator connections.
///
/// Every accepted connection gets its own task and its own [`Session`]
/// seeded from a copy of the default configuration; sessions share
/// nothing and need no locking.
pub struct OftpServer {
    listener: TcpListener,
    defaults: SessionConfiguration,
    tls: Option<TlsAcceptor>,
}

impl OftpServer {
    /// Bind to the given address.
    pub async fn bind(addr: &str, defaults: SessionConfiguration) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("OFTP responder bound to {}", addr);

        Ok(Self {
            listener,
            defaults,
            tls: None,
        })
    }

    /// Serve TLS (odette-ftps) instead of plain TCP.
    pub fn with_tls(mut self, config: &TlsConfig) -> Result<Self> {
        self.tls = Some(config.build_acceptor()?);
        Ok(self)
    }

    /// Get the local address this server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is cancelled.
    pub async fn run(self) -> Result<()> {
        info!(
            transport = if self.tls.is_some() { "TLS" } else { "TCP" },
            "OFTP responder starting"
        );

        loop {
            match self.listener.accept().await {
                Ok((socket, addr)) => {
                    info!("New connection from {}", addr);

                    let defaults = self.defaults.clone();
                    let tls = self.tls.clone();

                    tokio::spawn(async move {
                        let result = match tls {
                            Some(acceptor) => match acceptor.accept(socket).await {
                                Ok(stream) => handle_connection(stream, defaults).await,
                                Err(e) => {
                                    warn!("TLS handshake with {} failed: {}", addr, e);
                                    return;
                                }
                            },
                            None => handle_connection(socket, defaults).await,
                        };
                        if let Err(e) = result {
                            warn!("Connection handler error for {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Drive one session over one connection.
///
/// The responder greets with a ready command, then feeds every decoded
/// command through the engine and writes whatever it answers. The
/// connection is closed as soon as the session ends; a decode failure
/// forces the close (the peer is gone or broken, no recovery).
async fn handle_connection<S>(stream: S, defaults: SessionConfiguration) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, OftpFrameCodec::responder());
    let mut session = Session::new(defaults);
    info!(session_id = %session.id(), "session starting");

    framed.send(session.create_session_ready()).await?;

    while let Some(next) = framed.next().await {
        let command = match next {
            Ok(command) => command,
            Err(e) => {
                warn!(session_id = %session.id(), "closing on receive error: {}", e);
                break;
            }
        };

        if let Some(response) = session.process_command(&command) {
            framed.send(response).await?;
        }
        if session.is_ended() {
            break;
        }
    }

    let stats = session.stats();
    info!(
        session_id = %stats.session_id,
        commands_received = stats.commands_received,
        files_received = stats.files_received,
        "session closed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = OftpServer::bind("127.0.0.1:0", SessionConfiguration::default())
            .await
            .unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }
}
