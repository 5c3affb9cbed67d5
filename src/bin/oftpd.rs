//! OFTP daemon and client CLI.
//!
//! # Commands
//!
//! - `serve` - Run the responder (server) side
//! - `send` - Connect to a responder and transmit a file
//! - `ping` - Connect, negotiate a session and disconnect

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use oftp::{
    Config, FileStartParams, OftpClient, OftpServer, SessionConfiguration, TlsClientConfig,
    TlsConfig, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oftpd")]
#[command(version = VERSION)]
#[command(about = "ODETTE File Transfer Protocol daemon and client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the responder side
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve TLS (odette-ftps)
        #[arg(long)]
        tls: bool,
    },

    /// Connect to a responder and transmit a file
    Send {
        /// Responder address (host:port)
        addr: String,

        /// File to transmit
        #[arg(short, long)]
        file: PathBuf,

        /// Dataset name (defaults to the file name)
        #[arg(short, long)]
        dataset: Option<String>,

        /// Destination identification code
        #[arg(long, default_value = "")]
        destination: String,

        /// Own identification code
        #[arg(short, long, default_value = "")]
        user_code: String,

        /// Own password
        #[arg(long, default_value = "")]
        password: String,

        /// Connect with TLS
        #[arg(long)]
        tls: bool,

        /// PEM bundle of trusted root certificates for TLS
        #[arg(long)]
        ca: Option<PathBuf>,

        /// Skip TLS certificate verification (development only)
        #[arg(long)]
        insecure: bool,
    },

    /// Connect, negotiate a session and disconnect
    Ping {
        /// Responder address (host:port)
        addr: String,

        /// Own identification code
        #[arg(short, long, default_value = "")]
        user_code: String,

        /// Own password
        #[arg(long, default_value = "")]
        password: String,

        /// Connect with TLS
        #[arg(long)]
        tls: bool,

        /// PEM bundle of trusted root certificates for TLS
        #[arg(long)]
        ca: Option<PathBuf>,

        /// Skip TLS certificate verification (development only)
        #[arg(long)]
        insecure: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            config,
            host,
            port,
            tls,
        } => serve(config, host, port, tls).await,
        Commands::Send {
            addr,
            file,
            dataset,
            destination,
            user_code,
            password,
            tls,
            ca,
            insecure,
        } => {
            let defaults = SessionConfiguration::new(user_code.clone(), password);
            let mut client = build_client(addr, defaults, tls, ca, insecure);
            client.connect().await?;

            let content = std::fs::read(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let dataset = dataset.unwrap_or_else(|| {
                file.file_name()
                    .map_or_else(|| "FILE".to_string(), |n| n.to_string_lossy().into_owned())
            });
            let elapsed = client
                .send_file(FileStartParams::new(dataset, user_code, destination), &content)
                .await?;
            println!("transmission took {} ms", elapsed.as_millis());

            client.disconnect().await?;
            Ok(())
        }
        Commands::Ping {
            addr,
            user_code,
            password,
            tls,
            ca,
            insecure,
        } => {
            let defaults = SessionConfiguration::new(user_code, password);
            let mut client = build_client(addr, defaults, tls, ca, insecure);
            client.connect().await?;
            println!("-> {}", client.is_connected());
            client.disconnect().await?;
            Ok(())
        }
    }
}

async fn serve(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    tls: bool,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env(),
    };
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if tls {
        config.server.tls = true;
    }

    let defaults = config.session.to_session_configuration();
    let mut server = OftpServer::bind(&config.server.listen_addr(), defaults).await?;
    if config.server.tls {
        let tls_config = match (&config.server.cert_path, &config.server.key_path) {
            (Some(cert), Some(key)) => TlsConfig::production(cert, key),
            _ => TlsConfig::development(),
        };
        server = server.with_tls(&tls_config)?;
    }
    server.run().await?;
    Ok(())
}

fn build_client(
    addr: String,
    defaults: SessionConfiguration,
    tls: bool,
    ca: Option<PathBuf>,
    insecure: bool,
) -> OftpClient {
    let client = OftpClient::new(addr, defaults);
    if tls {
        let tls_config = if insecure {
            TlsClientConfig::insecure()
        } else if let Some(ca) = ca {
            TlsClientConfig::with_roots(ca)
        } else {
            TlsClientConfig::default()
        };
        client.with_tls(tls_config)
    } else {
        client
    }
}
