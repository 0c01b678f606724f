// ── Core error types ──
//
// Errors surfaced by the coordinator and entry runtime. Consumers never
// see raw HTTP status codes here: a rejected token becomes
// `AuthenticationFailed`, every other fetch problem `FetchFailed`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Refresh errors ───────────────────────────────────────────────
    /// The access token was rejected. Persistent until reconfigured.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Network, status, or payload failure. Retried by the next poll.
    #[error("Failed to fetch attributes: {message}")]
    FetchFailed { message: String },

    /// The first refresh failed transiently; the host should retry set-up.
    #[error("Entry '{entry_id}' is not ready: {reason}")]
    NotReady { entry_id: String, reason: String },

    // ── Entry errors ─────────────────────────────────────────────────
    #[error("Configuration entry '{entry_id}' not found")]
    EntryNotFound { entry_id: String },

    #[error("Configuration entry '{entry_id}' is already loaded")]
    EntryAlreadyLoaded { entry_id: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` when re-entering the same token cannot succeed.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// `true` for failures the next poll or set-up attempt may clear.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::NotReady { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<thingsbridge_api::Error> for CoreError {
    fn from(err: thingsbridge_api::Error) -> Self {
        match err {
            thingsbridge_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            thingsbridge_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            thingsbridge_api::Error::InvalidHost { host } => CoreError::Config {
                message: format!("Invalid host '{host}'"),
            },
            thingsbridge_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            other @ (thingsbridge_api::Error::Status { .. }
            | thingsbridge_api::Error::Transport(_)
            | thingsbridge_api::Error::Deserialization { .. }) => CoreError::FetchFailed {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_auth() {
        let err = CoreError::from(thingsbridge_api::Error::Authentication {
            message: "bad token".into(),
        });
        assert!(err.is_auth());
        assert!(!err.is_retryable());
    }

    #[test]
    fn status_and_payload_map_to_fetch() {
        let status = CoreError::from(thingsbridge_api::Error::Status {
            status: 500,
            body: String::new(),
        });
        let payload = CoreError::from(thingsbridge_api::Error::Deserialization {
            message: "expected object".into(),
            body: "[]".into(),
        });
        assert!(matches!(status, CoreError::FetchFailed { .. }));
        assert!(payload.is_retryable());
    }
}
