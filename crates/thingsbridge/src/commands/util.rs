//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use thingsbridge_core::{AttributeMap, Bridge, EntitySink, Projection};

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::CliError;

/// Build a [`Bridge`] on one shared HTTP client from config + flags.
pub fn bridge(cfg: &Config, global: &GlobalOpts) -> Result<Bridge, CliError> {
    let http = config::transport(cfg, global).build_client()?;
    Ok(Bridge::new(http))
}

/// Set up each entry on `bridge`, blocking on its first refresh.
///
/// `interval` replaces the configured poll period; `Duration::ZERO` gives
/// one-shot entries that never poll in the background.
pub async fn load_entries(
    bridge: &Bridge,
    cfg: &Config,
    ids: &[String],
    interval: Option<Duration>,
    sink: &Arc<dyn EntitySink>,
) -> Result<(), CliError> {
    for id in ids {
        let mut entry = cfg.to_entry_config(id)?;
        if let Some(interval) = interval {
            entry.scan_interval = interval;
        }
        bridge.setup_entry(entry, Arc::clone(sink)).await?;
    }
    Ok(())
}

/// A sink that drops projections; for commands that read the registry.
pub fn discard_sink() -> Arc<dyn EntitySink> {
    Arc::new(|_: Vec<Arc<Projection>>| {})
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse a JSON object of bare name -> scalar for attribute writes.
pub fn parse_attribute_map(raw: &str, field: &str) -> Result<AttributeMap, CliError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid JSON: {e}"),
    })?;
    if !value.is_object() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "expected a JSON object of name -> value".into(),
        });
    }
    Ok(serde_json::from_value(value)?)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_attribute_file(path: &Path) -> Result<AttributeMap, CliError> {
    let contents = std::fs::read_to_string(path)?;
    parse_attribute_map(&contents, "from-file")
}

/// Spinner on stderr while waiting on the network; hidden when quiet or
/// not attached to a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner().with_message(message.to_owned());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use thingsbridge_core::AttributeValue;

    #[test]
    fn parses_attribute_object() {
        let map = parse_attribute_map(r#"{"setpoint": 22.5, "mode": "eco"}"#, "json").unwrap();
        assert_eq!(map["setpoint"], AttributeValue::Float(22.5));
        assert_eq!(map["mode"], AttributeValue::from("eco"));
    }

    #[test]
    fn rejects_non_object() {
        let err = parse_attribute_map("[1, 2]", "json").unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
        assert!(parse_attribute_map("{oops", "json").is_err());
    }
}
