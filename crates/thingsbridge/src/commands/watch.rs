//! `watch`: keep every selected entry polling until Ctrl-C, printing
//! discovered points and the outcome of each refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use thingsbridge_core::{
    CoordinatorState, EntitySink, FailureKind, Projection, RefreshEvent, Subscription,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{Printer, Tone};

use super::util;

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn describe(event: &RefreshEvent) -> String {
    match event.state {
        CoordinatorState::Ready => {
            let count = event.snapshot.as_ref().map_or(0, |s| s.len());
            format!("ok, {count} attributes")
        }
        CoordinatorState::Degraded(FailureKind::Auth) => "authentication rejected".into(),
        CoordinatorState::Degraded(FailureKind::Fetch) => "fetch failed".into(),
        CoordinatorState::Uninitialized => "not ready".into(),
    }
}

fn announce_sink(printer: Printer) -> Arc<dyn EntitySink> {
    Arc::new(move |added: Vec<Arc<Projection>>| {
        for projection in added {
            let line = format!(
                "{} + {} ({})",
                timestamp(),
                projection.key(),
                projection.kind()
            );
            printer.event(Tone::Discovered, &line);
        }
    })
}

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.interval == Some(0) {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least one second".into(),
        });
    }

    let cfg = config::load(global)?;
    let ids = config::select_entries(&cfg, global)?;
    let bridge = util::bridge(&cfg, global)?;
    let printer = Printer::new(global);

    let interval = args.interval.map(Duration::from_secs);
    let sink = announce_sink(printer.clone());
    util::load_entries(&bridge, &cfg, &ids, interval, &sink).await?;

    let _subscriptions: Vec<Subscription> = ids
        .iter()
        .filter_map(|id| bridge.coordinator(id))
        .map(|coordinator| {
            let entry_id = coordinator.entry_id().to_owned();
            let printer = printer.clone();
            coordinator.subscribe(move |event| {
                let tone = if event.succeeded() {
                    Tone::Refreshed
                } else {
                    Tone::Failed
                };
                printer.event(
                    tone,
                    &format!("{} {entry_id}: {}", timestamp(), describe(event)),
                );
            })
        })
        .collect();

    let noun = if ids.len() == 1 { "entry" } else { "entries" };
    printer.note(&format!("Watching {} {noun}; Ctrl-C to stop", ids.len()));

    tokio::signal::ctrl_c().await?;
    bridge.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_refresh_outcomes() {
        let ok = RefreshEvent {
            snapshot: None,
            state: CoordinatorState::Ready,
        };
        assert_eq!(describe(&ok), "ok, 0 attributes");

        let auth = RefreshEvent {
            snapshot: None,
            state: CoordinatorState::Degraded(FailureKind::Auth),
        };
        assert_eq!(describe(&auth), "authentication rejected");
    }
}
