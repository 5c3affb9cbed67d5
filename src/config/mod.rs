//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`OFTP_*`)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OftpError, Result};
use crate::protocol::{SessionConfiguration, DEFAULT_BUFFER_SIZE, DEFAULT_CREDIT};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session parameter defaults
    #[serde(default)]
    pub session: SessionDefaults,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| OftpError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| OftpError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("OFTP_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("OFTP_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(code) = std::env::var("OFTP_USER_CODE") {
            config.session.user_code = code;
        }
        if let Ok(password) = std::env::var("OFTP_PASSWORD") {
            config.session.password = password;
        }
        if let Ok(val) = std::env::var("OFTP_BUFFER_SIZE") {
            if let Ok(val) = val.parse() {
                config.session.buffer_size = val;
            }
        }
        if let Ok(val) = std::env::var("OFTP_CREDIT") {
            if let Ok(val) = val.parse() {
                config.session.credit = val;
            }
        }

        config
    }
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Serve TLS (odette-ftps) instead of plain TCP
    pub tls: bool,

    /// PEM certificate file; self-signed when absent
    pub cert_path: Option<PathBuf>,

    /// PEM private key file
    pub key_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3305,
            tls: false,
            cert_path: None,
            key_path: None,
        }
    }
}

impl ServerConfig {
    /// Get the full listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Default session parameters offered to every peer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefaults {
    /// Own identification code
    pub user_code: String,

    /// Own password
    pub password: String,

    /// Data exchange buffer size in bytes
    pub buffer_size: u32,

    /// Credit window in data units
    pub credit: u64,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            user_code: String::new(),
            password: String::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            credit: DEFAULT_CREDIT,
        }
    }
}

impl SessionDefaults {
    /// Build the session configuration template seeded into new sessions
    pub fn to_session_configuration(&self) -> SessionConfiguration {
        SessionConfiguration::new(self.user_code.clone(), self.password.clone())
            .with_buffer_size(self.buffer_size)
            .with_credit(self.credit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3305);
        assert!(!config.server.tls);
        assert_eq!(config.session.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_listen_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr(), "127.0.0.1:3305");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 6619
            tls = true
            cert_path = "server.pem"
            key_path = "server.key"

            [session]
            user_code = "O0055LOCAL"
            password = "SECRET"
            buffer_size = 1024
            credit = 5
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 6619);
        assert!(config.server.tls);
        assert_eq!(config.session.user_code, "O0055LOCAL");
        assert_eq!(config.session.credit, 5);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oftpd.toml");
        std::fs::write(
            &path,
            "[server]\nhost = \"127.0.0.1\"\nport = 13305\ntls = false\n\n[session]\nuser_code = \"O0055LOCAL\"\npassword = \"SECRET\"\nbuffer_size = 512\ncredit = 2\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 13305);
        assert_eq!(config.session.buffer_size, 512);

        assert!(Config::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_session_defaults_to_configuration() {
        let defaults = SessionDefaults {
            user_code: "O0055LOCAL".to_string(),
            password: "SECRET".to_string(),
            buffer_size: 1024,
            credit: 5,
        };
        let config = defaults.to_session_configuration();
        assert_eq!(config.user_code, "O0055LOCAL");
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.credit, 5);
    }
}
