//! `set` / `set-many`: route attribute-write commands to an entry.

use std::time::Duration;

use thingsbridge_core::{AttributeValue, Command as CoreCommand};

use crate::cli::{GlobalOpts, SetArgs, SetManyArgs};
use crate::config;
use crate::error::CliError;
use crate::output::Printer;

use super::util;

pub async fn handle_set(args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let value = AttributeValue::parse_input(&args.value);
    run(global, |entry_id| CoreCommand::SetAttribute {
        entry_id,
        attribute_key: args.attribute_key,
        value,
    })
    .await
}

pub async fn handle_set_many(args: SetManyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let attributes = match (args.json, args.from_file) {
        (Some(raw), _) => util::parse_attribute_map(&raw, "json")?,
        (None, Some(path)) => util::read_attribute_file(&path)?,
        (None, None) => {
            return Err(CliError::Validation {
                field: "json".into(),
                reason: "pass --json or --from-file".into(),
            });
        }
    };
    if attributes.is_empty() {
        return Err(CliError::Validation {
            field: "json".into(),
            reason: "no attributes to set".into(),
        });
    }
    run(global, |entry_id| CoreCommand::SetAttributes {
        entry_id,
        attributes,
    })
    .await
}

/// Load the selected entry, execute the command built for it, and report.
async fn run(
    global: &GlobalOpts,
    build: impl FnOnce(String) -> CoreCommand,
) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let entry_id = config::select_entry(&cfg, global)?;
    let bridge = util::bridge(&cfg, global)?;
    util::load_entries(
        &bridge,
        &cfg,
        std::slice::from_ref(&entry_id),
        Some(Duration::ZERO),
        &util::discard_sink(),
    )
    .await?;

    let accepted = bridge.execute(build(entry_id)).await;
    bridge.shutdown().await;

    if !accepted? {
        return Err(CliError::WriteFailed);
    }
    Printer::new(global).note("Attributes updated");
    Ok(())
}
