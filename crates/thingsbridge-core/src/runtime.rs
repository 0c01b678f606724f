// ── Entry runtime ──
//
// Owns every loaded entry: its coordinator, projection registry, and
// the platform subscription that keeps discovery alive. Commands are
// routed through this table by entry id.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{error, info};

use crate::command::Command;
use crate::config::EntryConfig;
use crate::coordinator::{Coordinator, Subscription};
use crate::error::CoreError;
use crate::projection::{EntitySink, ProjectionRegistry, setup_platform};

struct LoadedEntry {
    coordinator: Coordinator,
    registry: Arc<ProjectionRegistry>,
    /// Dropped on unload, which stops discovery and releases the
    /// coordinator held by the observer.
    _platform: Subscription,
}

/// Host-side table of loaded entries sharing one HTTP client.
pub struct Bridge {
    http: reqwest::Client,
    entries: DashMap<String, LoadedEntry>,
}

impl Bridge {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            entries: DashMap::new(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Load an entry: first refresh, project the Snapshot into `sink`,
    /// then start periodic refresh.
    ///
    /// Fails with [`CoreError::NotReady`] when the first fetch fails and
    /// with [`CoreError::AuthenticationFailed`] when the token is rejected.
    /// Nothing is registered in either case.
    pub async fn setup_entry(
        &self,
        config: EntryConfig,
        sink: Arc<dyn EntitySink>,
    ) -> Result<Coordinator, CoreError> {
        let entry_id = config.entry_id.clone();
        if self.entries.contains_key(&entry_id) {
            return Err(CoreError::EntryAlreadyLoaded { entry_id });
        }

        let coordinator = Coordinator::new(config, self.http.clone())?;
        coordinator.first_refresh().await?;

        let registry = Arc::new(ProjectionRegistry::new());
        let platform = setup_platform(&coordinator, Arc::clone(&registry), sink);

        match self.entries.entry(entry_id.clone()) {
            Entry::Occupied(_) => return Err(CoreError::EntryAlreadyLoaded { entry_id }),
            Entry::Vacant(slot) => {
                slot.insert(LoadedEntry {
                    coordinator: coordinator.clone(),
                    registry: Arc::clone(&registry),
                    _platform: platform,
                });
            }
        }

        coordinator.start().await;
        info!(
            %entry_id,
            host = %coordinator.host(),
            points = registry.len(),
            "entry loaded"
        );
        Ok(coordinator)
    }

    /// Stop polling and drop the entry's projections and subscription.
    pub async fn unload_entry(&self, entry_id: &str) -> Result<(), CoreError> {
        let (_, loaded) =
            self.entries
                .remove(entry_id)
                .ok_or_else(|| CoreError::EntryNotFound {
                    entry_id: entry_id.to_owned(),
                })?;
        loaded.coordinator.shutdown().await;
        info!(%entry_id, "entry unloaded");
        Ok(())
    }

    /// Unload (if loaded) and set the entry up again.
    pub async fn reload_entry(
        &self,
        config: EntryConfig,
        sink: Arc<dyn EntitySink>,
    ) -> Result<Coordinator, CoreError> {
        match self.unload_entry(&config.entry_id).await {
            Ok(()) | Err(CoreError::EntryNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        self.setup_entry(config, sink).await
    }

    /// Unload every entry.
    pub async fn shutdown(&self) {
        for entry_id in self.entry_ids() {
            let _ = self.unload_entry(&entry_id).await;
        }
    }

    // ── Lookup ───────────────────────────────────────────────────

    pub fn coordinator(&self, entry_id: &str) -> Option<Coordinator> {
        self.entries.get(entry_id).map(|e| e.coordinator.clone())
    }

    pub fn registry(&self, entry_id: &str) -> Option<Arc<ProjectionRegistry>> {
        self.entries.get(entry_id).map(|e| Arc::clone(&e.registry))
    }

    /// Loaded entry ids, sorted.
    pub fn entry_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Route `command` to its entry's coordinator and write.
    ///
    /// An unknown entry id is logged and returned as
    /// [`CoreError::EntryNotFound`]; no request is issued. Otherwise the
    /// result is the coordinator's write outcome.
    pub async fn execute(&self, command: Command) -> Result<bool, CoreError> {
        let entry_id = command.entry_id().to_owned();
        let Some(coordinator) = self.coordinator(&entry_id) else {
            error!(%entry_id, "config entry not found");
            return Err(CoreError::EntryNotFound { entry_id });
        };
        Ok(coordinator.write(&command.into_body()).await)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("entries", &self.entry_ids())
            .finish_non_exhaustive()
    }
}
