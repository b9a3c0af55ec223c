//! TLS reachability probe
//!
//! Performs a bare TLS handshake against the server with the trust
//! policy from [`crate::trust`], so operators can see up front whether
//! the certificate will be accepted before a migration starts.

use crate::error::{Error, Result};
use crate::trust;
use rustls::pki_types::ServerName;
use serde::Serialize;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

/// Outcome of a handshake attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub host: String,
    pub port: u16,
    pub accepted: bool,
    /// Negotiated protocol, e.g. `TLSv1_3`, when the handshake succeeded.
    pub protocol: Option<String>,
    /// Why the handshake failed.
    pub detail: Option<String>,
}

/// Handshake with `host:port` and report whether the certificate passed.
///
/// A rejected certificate is a normal outcome and comes back as a
/// report with `accepted == false`.
///
/// # Errors
///
/// Returns an error if the TCP connection cannot be established in time
/// or the host name is not a valid TLS server name.
pub async fn probe_tls(host: &str, port: u16, wait: Duration) -> Result<ProbeReport> {
    let addr = format!("{host}:{port}");
    debug!("Probing TLS at {}", addr);

    let tcp_stream = timeout(wait, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::connection(format!("Connecting to {addr} timed out"), None))??;

    let connector = TlsConnector::from(trust::client_config()?);
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    let handshake = timeout(wait, connector.connect(server_name, tcp_stream))
        .await
        .map_err(|_| Error::connection(format!("TLS handshake with {addr} timed out"), None))?;

    let report = match handshake {
        Ok(mut tls_stream) => {
            let protocol = tls_stream
                .get_ref()
                .1
                .protocol_version()
                .map(|v| format!("{v:?}"));
            tls_stream.shutdown().await.ok();
            info!("Certificate of {} accepted", addr);
            ProbeReport {
                host: host.to_string(),
                port,
                accepted: true,
                protocol,
                detail: None,
            }
        }
        Err(e) => {
            warn!("TLS handshake with {} failed: {}", addr, e);
            ProbeReport {
                host: host.to_string(),
                port,
                accepted: false,
                protocol: None,
                detail: Some(e.to_string()),
            }
        }
    };
    Ok(report)
}
