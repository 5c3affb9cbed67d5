//! Loopback transport tests: a real responder and initiator over
//! 127.0.0.1, plain TCP and TLS.

use oftp::{
    FileStartParams, OftpClient, OftpServer, SessionConfiguration, TlsClientConfig, TlsConfig,
};

fn server_defaults() -> SessionConfiguration {
    SessionConfiguration::new("O0055LOCAL", "SECRET")
        .with_buffer_size(64)
        .with_credit(2)
}

fn client_defaults() -> SessionConfiguration {
    SessionConfiguration::new("O9999REMOTE", "REMOTEPW")
        .with_buffer_size(128)
        .with_credit(5)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tcp_handshake_and_transfer() {
    let server = OftpServer::bind("127.0.0.1:0", server_defaults())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let mut client = OftpClient::new(addr.to_string(), client_defaults());
    client.connect().await.unwrap();
    assert!(client.is_connected());

    // Both limits settle on the responder's smaller values.
    let config = client.configuration().unwrap();
    assert_eq!(config.buffer_size, 64);
    assert_eq!(config.credit, 2);

    // 300 bytes over 64-byte units = 5 data units, two credit rounds.
    let content = vec![7u8; 300];
    client
        .send_file(
            FileStartParams::new("TESTFILE", "O9999REMOTE", "O0055LOCAL"),
            &content,
        )
        .await
        .unwrap();

    client.disconnect().await.unwrap();
    assert!(!client.is_connected());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tcp_empty_file() {
    let server = OftpServer::bind("127.0.0.1:0", server_defaults())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let mut client = OftpClient::new(addr.to_string(), client_defaults());
    client.connect().await.unwrap();
    client
        .send_file(
            FileStartParams::new("EMPTY", "O9999REMOTE", "O0055LOCAL"),
            &[],
        )
        .await
        .unwrap();
    client.disconnect().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_incompatible_level_refused_on_the_wire() {
    let server = OftpServer::bind("127.0.0.1:0", server_defaults())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let mut defaults = client_defaults();
    defaults.level = 3;
    let mut client = OftpClient::new(addr.to_string(), defaults);

    let result = client.connect().await;
    assert!(result.is_err());
    assert!(!client.is_connected());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tls_handshake_and_transfer() {
    let server = OftpServer::bind("127.0.0.1:0", server_defaults())
        .await
        .unwrap()
        .with_tls(&TlsConfig::development())
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let mut client = OftpClient::new(addr.to_string(), client_defaults())
        .with_tls(TlsClientConfig::insecure());
    client.connect().await.unwrap();
    assert!(client.is_connected());

    client
        .send_file(
            FileStartParams::new("SECURE", "O9999REMOTE", "O0055LOCAL"),
            &vec![1u8; 100],
        )
        .await
        .unwrap();
    client.disconnect().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_many_concurrent_sessions() {
    let server = OftpServer::bind("127.0.0.1:0", server_defaults())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let addr = addr.to_string();
            tokio::spawn(async move {
                let mut client = OftpClient::new(addr, client_defaults());
                client.connect().await.unwrap();
                client
                    .send_file(
                        FileStartParams::new(
                            format!("FILE{i}"),
                            "O9999REMOTE",
                            "O0055LOCAL",
                        ),
                        &vec![i as u8; 200],
                    )
                    .await
                    .unwrap();
                client.disconnect().await.unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
}
