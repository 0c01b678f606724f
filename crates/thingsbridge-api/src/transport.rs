// HTTP client construction.
//
// A host builds one `reqwest::Client` and hands clones to every
// attributes client, so all entries share the connection pool.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::error::Error;

const USER_AGENT: &str = concat!("thingsbridge/", env!("CARGO_PKG_VERSION"));

/// How server certificates are verified.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Platform trust roots.
    #[default]
    System,
    /// Trust the PEM certificate at this path in addition to the roots.
    CustomCa(PathBuf),
    /// No verification. For self-hosted servers with self-signed certs.
    DangerAcceptInvalid,
}

/// Settings for the shared HTTP client.
///
/// `timeout` caps every request; refresh, write, and probe calls set
/// shorter per-request deadlines on top.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: crate::DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout);

        with_tls(builder, &self.tls)?
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }
}

fn with_tls(builder: ClientBuilder, mode: &TlsMode) -> Result<ClientBuilder, Error> {
    Ok(match mode {
        TlsMode::System => builder,
        TlsMode::CustomCa(path) => {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("cannot read CA file {}: {e}", path.display())))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))?;
            builder.add_root_certificate(cert)
        }
        TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
    })
}
