//! CLI configuration: thin wrapper around `thingsbridge_config`.
//!
//! Adds resolution that respects `GlobalOpts` overrides (--config,
//! --entry, --insecure).

use std::path::PathBuf;

use thingsbridge_api::{TlsMode, TransportConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use thingsbridge_config::{Config, TokenSource, config_path, load_config_from, save_config_to};

/// Config file in effect: `--config` / `THINGSBRIDGE_CONFIG`, else the
/// platform default.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the active config file (missing file = empty config).
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_path(global))?)
}

pub fn save(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    Ok(save_config_to(cfg, &active_path(global))?)
}

/// Entries to operate on: `--entry` if given, otherwise all of them.
pub fn select_entries(cfg: &Config, global: &GlobalOpts) -> Result<Vec<String>, CliError> {
    if let Some(ref id) = global.entry {
        cfg.entry(id)?;
        return Ok(vec![id.clone()]);
    }
    if cfg.entries.is_empty() {
        return Err(CliError::NoEntries {
            path: active_path(global).display().to_string(),
        });
    }
    Ok(cfg.entries.keys().cloned().collect())
}

/// Exactly one entry: `--entry`, or the only configured one.
pub fn select_entry(cfg: &Config, global: &GlobalOpts) -> Result<String, CliError> {
    let mut ids = select_entries(cfg, global)?;
    if ids.len() > 1 {
        return Err(CliError::AmbiguousEntry {
            available: ids.join(", "),
        });
    }
    ids.pop().ok_or_else(|| CliError::NoEntries {
        path: active_path(global).display().to_string(),
    })
}

/// Transport settings from config defaults, with `--insecure` on top.
pub fn transport(cfg: &Config, global: &GlobalOpts) -> TransportConfig {
    let mut transport = cfg.transport();
    if global.insecure {
        transport.tls = TlsMode::DangerAcceptInvalid;
    }
    transport
}
