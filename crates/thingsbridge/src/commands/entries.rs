//! `entries`: list and remove configuration entries.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{EntriesArgs, EntriesCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output::Printer;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct EntryView {
    id: String,
    title: String,
    host: String,
    token: String,
    scan_interval_secs: u64,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Interval")]
    interval: String,
}

impl From<&EntryView> for EntryRow {
    fn from(e: &EntryView) -> Self {
        Self {
            id: e.id.clone(),
            title: e.title.clone(),
            token: e.token.clone(),
            interval: if e.scan_interval_secs == 0 {
                "off".into()
            } else {
                format!("{}s", e.scan_interval_secs)
            },
        }
    }
}

fn views(cfg: &Config) -> Vec<EntryView> {
    cfg.entries
        .iter()
        .map(|(id, entry)| EntryView {
            id: id.clone(),
            title: entry.title.clone(),
            host: entry.host.clone(),
            token: match (&entry.access_token_env, &entry.access_token) {
                (Some(var), _) => format!("env:{var}"),
                (None, Some(_)) => "plaintext".into(),
                (None, None) => "missing".into(),
            },
            scan_interval_secs: entry
                .scan_interval_secs
                .unwrap_or(cfg.defaults.scan_interval_secs),
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: EntriesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load(global)?;
    let printer = Printer::new(global);

    match args.command {
        EntriesCommand::List => {
            printer.list(&views(&cfg), |e| EntryRow::from(e), |e| e.id.clone())
        }

        EntriesCommand::Remove { id } => {
            let title = cfg.entry(&id)?.title.clone();
            if !util::confirm(&format!("Remove entry '{title}'?"), global.yes)? {
                return Ok(());
            }
            cfg.remove_entry(&id)?;
            config::save(&cfg, global)?;
            printer.note(&format!("Removed entry {id}"));
            Ok(())
        }
    }
}
