// ── Setup validation ──
//
// One-shot reachability and token check run before an entry is
// created. Never used after set-up.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, error};

use thingsbridge_api::{AttributesClient, Endpoint, StatusCode};

use crate::config::VALIDATE_TIMEOUT;

/// Why a host/token pair was rejected at set-up time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Cannot connect to ThingsBoard: {reason}")]
    CannotConnect { reason: String },

    #[error("Invalid access token")]
    InvalidAuth,
}

impl SetupError {
    /// Stable machine-readable code (`cannot_connect`, `invalid_auth`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::CannotConnect { .. } => "cannot_connect",
            Self::InvalidAuth => "invalid_auth",
        }
    }
}

/// Normalized result of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub title: String,
    pub host: String,
}

/// Strip trailing slashes, then add `https://` unless an http(s) scheme is
/// already present.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("https://{host}")
    }
}

/// Display title for an entry on `host` (already normalized).
pub fn entry_title(host: &str) -> String {
    format!("ThingsBoard ({host})")
}

/// Uniqueness key of a configuration: normalized host plus token.
pub fn unique_id(host: &str, token: &SecretString) -> String {
    format!("{host}_{}", token.expose_secret())
}

/// Probe the attributes endpoint once with a 10s deadline.
///
/// 401 is `InvalidAuth`; any other status >= 400 or a transport failure is
/// `CannotConnect`.
pub async fn validate_input(
    http: &reqwest::Client,
    host: &str,
    token: &SecretString,
) -> Result<ValidatedInput, SetupError> {
    let host = normalize_host(host);
    let endpoint = Endpoint::new(&host, token).map_err(|e| SetupError::CannotConnect {
        reason: e.to_string(),
    })?;
    let client = AttributesClient::with_client(http.clone(), endpoint);

    let status = client.probe(VALIDATE_TIMEOUT).await.map_err(|e| {
        error!(error = %e, "error connecting to ThingsBoard");
        SetupError::CannotConnect {
            reason: e.to_string(),
        }
    })?;

    match status {
        StatusCode::UNAUTHORIZED => Err(SetupError::InvalidAuth),
        s if s.as_u16() >= 400 => Err(SetupError::CannotConnect {
            reason: format!("HTTP {s}"),
        }),
        _ => {
            debug!(%host, "setup validation succeeded");
            Ok(ValidatedInput {
                title: entry_title(&host),
                host,
            })
        }
    }
}
