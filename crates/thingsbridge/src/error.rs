//! Errors as the user sees them.
//!
//! Maps core, setup, and config errors into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use thingsbridge_config::ConfigError;
use thingsbridge_core::{CoreError, SetupError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const AUTH: u8 = 3;
    pub const NOT_FOUND: u8 = 4;
    pub const CONFLICT: u8 = 6;
    pub const CONNECTION: u8 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach ThingsBoard: {reason}")]
    #[diagnostic(
        code(thingsbridge::connection_failed),
        help(
            "Check that the host is reachable and serves the device API.\n\
             Self-signed certificate? Retry with --insecure (-k)."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Access token rejected")]
    #[diagnostic(
        code(thingsbridge::auth_failed),
        help(
            "Copy the device access token from the ThingsBoard device page,\n\
             then run: thingsbridge setup --host <host> --token <token>"
        )
    )]
    AuthFailed,

    #[error("No access token configured for entry '{entry_id}'")]
    #[diagnostic(
        code(thingsbridge::no_credentials),
        help("Set the variable named by access_token_env, or re-run setup.")
    )]
    NoCredentials { entry_id: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(thingsbridge::not_found),
        help("Run: thingsbridge {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' is already configured")]
    #[diagnostic(code(thingsbridge::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("No configuration entries")]
    #[diagnostic(
        code(thingsbridge::no_entries),
        help(
            "Create one with: thingsbridge setup --host <host> --token <token>\n\
             Config file: {path}"
        )
    )]
    NoEntries { path: String },

    #[error("Several entries are configured; choose one with --entry")]
    #[diagnostic(code(thingsbridge::ambiguous_entry), help("Available entries: {available}"))]
    AmbiguousEntry { available: String },

    // ── Writes ───────────────────────────────────────────────────────
    #[error("ThingsBoard did not accept the attribute write")]
    #[diagnostic(
        code(thingsbridge::write_failed),
        help("Run again with -v for the response status.")
    )]
    WriteFailed,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(thingsbridge::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(thingsbridge::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(thingsbridge::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::NoEntries { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::AmbiguousEntry { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { .. } => CliError::AuthFailed,

            CoreError::FetchFailed { message } => CliError::ConnectionFailed { reason: message },

            CoreError::NotReady { reason, .. } => CliError::ConnectionFailed { reason },

            CoreError::EntryNotFound { entry_id } => CliError::NotFound {
                resource_type: "entry".into(),
                identifier: entry_id,
                list_command: "entries list".into(),
            },

            CoreError::EntryAlreadyLoaded { entry_id } => CliError::Conflict {
                resource_type: "entry".into(),
                identifier: entry_id,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "value".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "host".into(),
                reason: message,
            },
        }
    }
}

impl From<SetupError> for CliError {
    fn from(err: SetupError) -> Self {
        match err {
            SetupError::InvalidAuth => CliError::AuthFailed,
            SetupError::CannotConnect { reason } => CliError::ConnectionFailed { reason },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::AlreadyConfigured { host, .. } => CliError::Conflict {
                resource_type: "host".into(),
                identifier: host,
            },
            ConfigError::EntryNotFound { entry_id } => CliError::NotFound {
                resource_type: "entry".into(),
                identifier: entry_id,
                list_command: "entries list".into(),
            },
            ConfigError::NoCredentials { entry_id } => CliError::NoCredentials { entry_id },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

impl From<thingsbridge_api::Error> for CliError {
    fn from(err: thingsbridge_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
