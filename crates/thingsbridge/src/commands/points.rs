//! `points`: project every attribute key and print the points, or write
//! one read-write point.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use thingsbridge_core::{AttributeKey, Bridge, PointState};

use crate::cli::{GlobalOpts, PointsArgs, PointsCommand};
use crate::config;
use crate::error::CliError;
use crate::output::Printer;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct PointView {
    entry_id: String,
    #[serde(flatten)]
    state: PointState,
}

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Class")]
    class: String,
}

impl From<&PointView> for PointRow {
    fn from(p: &PointView) -> Self {
        Self {
            key: p.state.key.to_string(),
            name: p.state.name.clone(),
            kind: p.state.kind.to_string(),
            value: value_text(&p.state),
            available: if p.state.available { "yes" } else { "no" }.into(),
            class: p
                .state
                .state_class
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

fn value_text(state: &PointState) -> String {
    state
        .value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn collect_views(bridge: &Bridge) -> Vec<PointView> {
    bridge
        .entry_ids()
        .into_iter()
        .filter_map(|id| bridge.registry(&id).map(|reg| (id, reg)))
        .flat_map(|(id, reg)| {
            reg.projections()
                .into_iter()
                .map(move |p| PointView {
                    entry_id: id.clone(),
                    state: p.render(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn print_views(views: &[PointView], global: &GlobalOpts) -> Result<(), CliError> {
    Printer::new(global).list(
        views,
        |p| PointRow::from(p),
        |p| format!("{}={}", p.state.key, value_text(&p.state)),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: PointsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let bridge = util::bridge(&cfg, global)?;
    let sink = util::discard_sink();

    match args.command {
        None => {
            let ids = config::select_entries(&cfg, global)?;
            util::load_entries(&bridge, &cfg, &ids, Some(Duration::ZERO), &sink).await?;
            let views = collect_views(&bridge);
            bridge.shutdown().await;
            print_views(&views, global)
        }

        Some(PointsCommand::Set { key, value }) => {
            let entry_id = config::select_entry(&cfg, global)?;
            let key: AttributeKey = key.parse()?;
            util::load_entries(
                &bridge,
                &cfg,
                std::slice::from_ref(&entry_id),
                Some(Duration::ZERO),
                &sink,
            )
            .await?;

            let registry = bridge
                .registry(&entry_id)
                .ok_or_else(|| CliError::Internal("entry vanished after set-up".into()))?;
            let projection = registry.get(&key).ok_or_else(|| CliError::NotFound {
                resource_type: "point".into(),
                identifier: key.to_string(),
                list_command: "points".into(),
            })?;
            let point = projection.as_read_write().ok_or_else(|| CliError::Validation {
                field: "key".into(),
                reason: format!("'{key}' is a read-only point"),
            })?;

            let accepted = point.set_value(value).await?;
            let view = PointView {
                entry_id,
                state: point.render(),
            };
            bridge.shutdown().await;

            if !accepted {
                return Err(CliError::WriteFailed);
            }
            print_views(std::slice::from_ref(&view), global)
        }
    }
}
