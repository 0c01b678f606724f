use thiserror::Error;

/// Top-level error type for the `thingsbridge-api` crate.
///
/// Covers every failure mode of the device attributes endpoint:
/// authentication, HTTP status, transport, and payload decoding.
/// `thingsbridge-core` maps these into its own refresh/write taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device access token was rejected (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── HTTP ────────────────────────────────────────────────────────
    /// Any non-success status other than 401.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    ///
    /// The request URL is stripped on conversion since it carries the token.
    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The host parses as a URL but cannot carry an API path
    /// (e.g. `mailto:` or `data:` URLs).
    #[error("Invalid host '{host}': cannot be used as a base URL")]
    InvalidHost { host: String },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

impl Error {
    /// Returns `true` if the remote rejected the access token.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
