//! TLS configuration for the odette-ftps transport.
//!
//! Handles certificate material for both session roles: the responder
//! presents a certificate, the initiator decides what to trust.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use rcgen::{Certificate, CertificateParams};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::{OftpError, Result};

/// Certificate configuration source.
#[derive(Debug, Clone)]
pub enum CertConfig {
    /// Generate a self-signed certificate (development only).
    SelfSigned {
        /// Common name for the certificate.
        common_name: String,
    },
    /// Load certificate and key from PEM files.
    Files {
        /// Path to PEM certificate file.
        cert_path: PathBuf,
        /// Path to PEM private key file.
        key_path: PathBuf,
    },
}

impl Default for CertConfig {
    fn default() -> Self {
        Self::SelfSigned {
            common_name: "localhost".to_string(),
        }
    }
}

impl CertConfig {
    /// Create development configuration with a self-signed cert.
    pub fn development() -> Self {
        Self::default()
    }

    /// Create production configuration from files.
    pub fn from_files(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self::Files {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// Load the certificate chain and private key.
    pub fn load(&self) -> Result<(Vec<rustls::Certificate>, rustls::PrivateKey)> {
        match self {
            Self::SelfSigned { common_name } => {
                tracing::warn!(
                    "Using self-signed certificate for '{}' - NOT FOR PRODUCTION",
                    common_name
                );

                let mut params = CertificateParams::new(vec![
                    common_name.clone(),
                    "127.0.0.1".to_string(),
                    "::1".to_string(),
                ]);
                params.distinguished_name = rcgen::DistinguishedName::new();
                params
                    .distinguished_name
                    .push(rcgen::DnType::CommonName, common_name.clone());

                let cert = Certificate::from_params(params).map_err(|e| {
                    OftpError::Tls(format!("Failed to generate self-signed cert: {}", e))
                })?;

                let cert_der = rustls::Certificate(
                    cert.serialize_der()
                        .map_err(|e| OftpError::Tls(format!("Failed to serialize cert: {}", e)))?,
                );
                let key_der = rustls::PrivateKey(cert.serialize_private_key_der());

                Ok((vec![cert_der], key_der))
            }
            Self::Files {
                cert_path,
                key_path,
            } => {
                let cert_pem = fs::read(cert_path).map_err(|e| {
                    OftpError::Tls(format!("Failed to read cert file {:?}: {}", cert_path, e))
                })?;
                let key_pem = fs::read(key_path).map_err(|e| {
                    OftpError::Tls(format!("Failed to read key file {:?}: {}", key_path, e))
                })?;

                let certs: Vec<rustls::Certificate> =
                    rustls_pemfile::certs(&mut cert_pem.as_slice())
                        .map_err(|e| OftpError::Tls(format!("Failed to parse cert PEM: {}", e)))?
                        .into_iter()
                        .map(rustls::Certificate)
                        .collect();
                if certs.is_empty() {
                    return Err(OftpError::Tls(
                        "No certificates found in PEM file".to_string(),
                    ));
                }

                let key = rustls_pemfile::pkcs8_private_keys(&mut key_pem.as_slice())
                    .map_err(|e| OftpError::Tls(format!("Failed to parse key PEM: {}", e)))?
                    .into_iter()
                    .next()
                    .map(rustls::PrivateKey)
                    .or_else(|| {
                        rustls_pemfile::rsa_private_keys(&mut key_pem.as_slice())
                            .ok()?
                            .into_iter()
                            .next()
                            .map(rustls::PrivateKey)
                    })
                    .ok_or_else(|| OftpError::Tls("No private key found in PEM file".to_string()))?;

                Ok((certs, key))
            }
        }
    }
}

/// TLS configuration for the responder side.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Certificate source.
    pub cert: CertConfig,
}

impl TlsConfig {
    /// Development config with a self-signed cert.
    pub fn development() -> Self {
        Self {
            cert: CertConfig::development(),
        }
    }

    /// Production config from certificate files.
    pub fn production(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert: CertConfig::from_files(cert_path, key_path),
        }
    }

    /// Build a TLS acceptor for the listener.
    pub fn build_acceptor(&self) -> Result<TlsAcceptor> {
        let (certs, key) = self.cert.load()?;
        let config = rustls::ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| OftpError::Tls(format!("Failed to build TLS config: {}", e)))?;
        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}

/// TLS configuration for the initiator side.
#[derive(Debug, Clone, Default)]
pub struct TlsClientConfig {
    /// PEM bundle of trusted root certificates. When absent only
    /// `accept_invalid` connections can succeed.
    pub roots: Option<PathBuf>,
    /// Skip certificate verification entirely (development only).
    pub accept_invalid: bool,
}

impl TlsClientConfig {
    /// Trust the given PEM root bundle.
    pub fn with_roots(roots: impl Into<PathBuf>) -> Self {
        Self {
            roots: Some(roots.into()),
            accept_invalid: false,
        }
    }

    /// Skip certificate verification (development only).
    pub fn insecure() -> Self {
        Self {
            roots: None,
            accept_invalid: true,
        }
    }

    /// Build a TLS connector for the client.
    pub fn build_connector(&self) -> Result<TlsConnector> {
        let builder = rustls::ClientConfig::builder().with_safe_defaults();

        let config = if self.accept_invalid {
            tracing::warn!("TLS certificate verification disabled - NOT FOR PRODUCTION");
            builder
                .with_custom_certificate_verifier(Arc::new(NoVerification))
                .with_no_client_auth()
        } else {
            let mut store = rustls::RootCertStore::empty();
            if let Some(path) = &self.roots {
                let pem = fs::read(path).map_err(|e| {
                    OftpError::Tls(format!("Failed to read root bundle {:?}: {}", path, e))
                })?;
                let certs = rustls_pemfile::certs(&mut pem.as_slice())
                    .map_err(|e| OftpError::Tls(format!("Failed to parse root PEM: {}", e)))?;
                for cert in certs {
                    store
                        .add(&rustls::Certificate(cert))
                        .map_err(|e| OftpError::Tls(format!("Invalid root certificate: {}", e)))?;
                }
            }
            builder.with_root_certificates(store).with_no_client_auth()
        };

        Ok(TlsConnector::from(Arc::new(config)))
    }
}

/// Accepts any server certificate. Only reachable through
/// [`TlsClientConfig::insecure`].
struct NoVerification;

impl rustls::client::ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> std::result::Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cert_config_self_signed() {
        let config = CertConfig::development();
        let (certs, _key) = config.load().unwrap();
        assert_eq!(certs.len(), 1);
    }

    #[test]
    fn test_acceptor_from_self_signed() {
        let config = TlsConfig::development();
        assert!(config.build_acceptor().is_ok());
    }

    #[test]
    fn test_insecure_connector_builds() {
        let config = TlsClientConfig::insecure();
        assert!(config.build_connector().is_ok());
    }
}
