//! Persisted configuration for thingsbridge.
//!
//! TOML-stored configuration entries (one per device endpoint), global
//! defaults, token resolution (env var, then plaintext), and translation
//! to `thingsbridge_core::EntryConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use thingsbridge_api::{TlsMode, TransportConfig};
use thingsbridge_core::{EntryConfig, REFRESH_TIMEOUT, ValidatedInput, setup};

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{host} is already configured (entry '{entry_id}')")]
    AlreadyConfigured { host: String, entry_id: String },

    #[error("no configuration entry '{entry_id}'")]
    EntryNotFound { entry_id: String },

    #[error("no access token configured for entry '{entry_id}'")]
    NoCredentials { entry_id: String },

    #[error("cannot encode config as TOML: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("cannot read config: {0}")]
    Figment(Box<figment::Error>),

    #[error("config file I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── File layout ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Applied to every entry unless the entry overrides them.
    #[serde(default)]
    pub defaults: Defaults,

    /// Configuration entries keyed by entry id.
    #[serde(default)]
    pub entries: BTreeMap<String, Entry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Poll period in seconds. `0` disables periodic refresh.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Refresh request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_scan_interval() -> u64 {
    thingsbridge_core::DEFAULT_SCAN_INTERVAL.as_secs()
}
fn default_timeout() -> u64 {
    REFRESH_TIMEOUT.as_secs()
}

/// One configured device endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Entry {
    /// Display title, e.g. "ThingsBoard (https://tb.example.com)".
    pub title: String,

    /// Normalized host, scheme included.
    pub host: String,

    /// Device access token (plaintext; prefer `access_token_env`).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Override the default poll period.
    pub scan_interval_secs: Option<u64>,
}

// ── Location ────────────────────────────────────────────────────────

const CONFIG_FILE: &str = "config.toml";

/// Platform config directory (`~/.config/thingsbridge/config.toml` on
/// Linux), falling back to `~/.config/thingsbridge` and finally the
/// working directory when no home directory is known.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "thingsbridge", "thingsbridge")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .or_else(|| BaseDirs::new().map(|base| base.home_dir().join(".config").join("thingsbridge")))
        .unwrap_or_else(|| PathBuf::from(".thingsbridge"))
        .join(CONFIG_FILE)
}

// ── Load / save ─────────────────────────────────────────────────────

/// Load config from `path`, layered over defaults and under
/// `THINGSBRIDGE_` environment variables (`__` separates nesting, e.g.
/// `THINGSBRIDGE_DEFAULTS__SCAN_INTERVAL_SECS=60`). A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("THINGSBRIDGE_").split("__"))
        .extract()?)
}

/// Write `cfg` as pretty TOML, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve an entry's access token: `access_token_env` first, then the
/// plaintext value.
pub fn resolve_token(entry: &Entry, entry_id: &str) -> Result<SecretString, ConfigError> {
    entry
        .access_token_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .or_else(|| entry.access_token.clone())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoCredentials {
            entry_id: entry_id.into(),
        })
}

// ── Entry management ────────────────────────────────────────────────

/// Where a new entry's token is stored.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Written to the file as `access_token`.
    Plaintext(String),
    /// Only the variable name is written, as `access_token_env`.
    Env(String),
}

impl Config {
    /// Add a validated entry and return its new id.
    ///
    /// Rejects a host + token pair that any existing entry already uses.
    /// Entries whose token cannot be resolved are skipped by the check.
    pub fn add_entry(
        &mut self,
        validated: &ValidatedInput,
        token: &SecretString,
        source: TokenSource,
    ) -> Result<String, ConfigError> {
        url::Url::parse(&validated.host).map_err(|e| ConfigError::Validation {
            field: "host".into(),
            reason: format!("{}: {e}", validated.host),
        })?;

        let wanted = setup::unique_id(&validated.host, token);
        let duplicate = self.entries.iter().find(|(id, entry)| {
            resolve_token(entry, id)
                .is_ok_and(|existing| setup::unique_id(&entry.host, &existing) == wanted)
        });
        if let Some((entry_id, _)) = duplicate {
            return Err(ConfigError::AlreadyConfigured {
                host: validated.host.clone(),
                entry_id: entry_id.clone(),
            });
        }

        let (access_token, access_token_env) = match source {
            TokenSource::Plaintext(t) => (Some(t), None),
            TokenSource::Env(name) => (None, Some(name)),
        };
        let entry_id = uuid::Uuid::new_v4().simple().to_string();
        self.entries.insert(
            entry_id.clone(),
            Entry {
                title: validated.title.clone(),
                host: validated.host.clone(),
                access_token,
                access_token_env,
                scan_interval_secs: None,
            },
        );
        Ok(entry_id)
    }

    pub fn remove_entry(&mut self, entry_id: &str) -> Result<Entry, ConfigError> {
        self.entries
            .remove(entry_id)
            .ok_or_else(|| ConfigError::EntryNotFound {
                entry_id: entry_id.into(),
            })
    }

    pub fn entry(&self, entry_id: &str) -> Result<&Entry, ConfigError> {
        self.entries
            .get(entry_id)
            .ok_or_else(|| ConfigError::EntryNotFound {
                entry_id: entry_id.into(),
            })
    }

    /// Resolve an entry into the coordinator's in-memory config.
    pub fn to_entry_config(&self, entry_id: &str) -> Result<EntryConfig, ConfigError> {
        let entry = self.entry(entry_id)?;
        let token = resolve_token(entry, entry_id)?;
        let interval = entry
            .scan_interval_secs
            .unwrap_or(self.defaults.scan_interval_secs);

        let mut config = EntryConfig::new(entry_id, &entry.title, &entry.host, token)
            .with_scan_interval(Duration::from_secs(interval));
        config.refresh_timeout = Duration::from_secs(self.defaults.timeout);
        Ok(config)
    }

    /// Shared HTTP transport settings from the global defaults.
    pub fn transport(&self) -> TransportConfig {
        let tls = if self.defaults.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.defaults.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.defaults.timeout),
        }
    }
}
