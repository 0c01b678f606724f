// ── Platform set-up ──
//
// Wires a coordinator to a host's entity sink: project every key of the
// current Snapshot once, then keep discovering new keys on every
// refresh notification.

use std::sync::Arc;

use tracing::debug;

use super::point::Projection;
use super::registry::ProjectionRegistry;
use crate::coordinator::{Coordinator, Subscription};
use crate::model::Snapshot;

/// Host-side receiver of newly created projections.
pub trait EntitySink: Send + Sync {
    fn add_entities(&self, entities: Vec<Arc<Projection>>);
}

impl<F> EntitySink for F
where
    F: Fn(Vec<Arc<Projection>>) + Send + Sync,
{
    fn add_entities(&self, entities: Vec<Arc<Projection>>) {
        self(entities);
    }
}

/// Register a projection for every key of `snapshot` not yet in `registry`.
///
/// Idempotent; returns only the projections created by this call, in key
/// order.
pub fn discover(
    coordinator: &Coordinator,
    registry: &ProjectionRegistry,
    snapshot: &Snapshot,
) -> Vec<Arc<Projection>> {
    snapshot
        .iter()
        .filter(|(key, _)| !registry.contains(key))
        .filter_map(|(key, value)| {
            registry.register_with(key, || {
                Projection::for_key(coordinator.clone(), key.clone(), value)
            })
        })
        .collect()
}

/// Project the current Snapshot into `sink` and subscribe for later keys.
///
/// The returned [`Subscription`] keeps discovery running; drop it when the
/// entry unloads. Observers hold a coordinator handle, so dropping the
/// subscription is also what releases the coordinator.
pub fn setup_platform(
    coordinator: &Coordinator,
    registry: Arc<ProjectionRegistry>,
    sink: Arc<dyn EntitySink>,
) -> Subscription {
    if let Some(snapshot) = coordinator.snapshot() {
        add_new(coordinator, &registry, sink.as_ref(), &snapshot);
    }

    let handle = coordinator.clone();
    coordinator.subscribe(move |event| {
        if let Some(snapshot) = &event.snapshot {
            add_new(&handle, &registry, sink.as_ref(), snapshot);
        }
    })
}

fn add_new(
    coordinator: &Coordinator,
    registry: &ProjectionRegistry,
    sink: &dyn EntitySink,
    snapshot: &Snapshot,
) {
    let created = discover(coordinator, registry, snapshot);
    if created.is_empty() {
        return;
    }
    debug!(
        entry_id = %coordinator.entry_id(),
        count = created.len(),
        total = registry.len(),
        "new points discovered"
    );
    sink.add_entities(created);
}
