//! Low-level SMTP stream handling.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::debug;

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection (local relays, tests).
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Reads a line from the stream, without its line terminator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] at end of stream, or an I/O error.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
        };
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails or exceeds `timeout`.
pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let stream = tcp_connect(hostname, port, timeout).await?;
    Ok(SmtpStream::Tcp(BufReader::new(stream)))
}

/// Connects to an SMTP server over TLS (implicit TLS on port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails or exceeds `timeout`.
pub async fn connect_tls(hostname: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let tcp_stream = tcp_connect(hostname, port, timeout).await?;

    let connector = create_tls_connector()?;
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

    let tls_stream = tokio::time::timeout(timeout, connector.connect(server_name, tcp_stream))
        .await
        .map_err(|_| Error::Timeout("TLS handshake"))??;
    debug!(hostname, port, "TLS session established");
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls_stream))))
}

async fn tcp_connect(hostname: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = format!("{hostname}:{port}");
    let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::Timeout("connect"))??;
    Ok(stream)
}

/// Creates a TLS connector trusting the Mozilla root set.
fn create_tls_connector() -> Result<TlsConnector> {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Protocol(format!("TLS configuration: {e}")))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
