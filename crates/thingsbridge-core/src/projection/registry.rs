// ── Projection registry ──
//
// Per-entry set of projected keys. Grows monotonically: a key, once
// registered, stays registered for the lifetime of the entry even when
// it disappears from later snapshots.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::point::Projection;
use crate::model::AttributeKey;

/// Concurrent key → projection table.
#[derive(Default)]
pub struct ProjectionRegistry {
    by_key: DashMap<AttributeKey, Arc<Projection>>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the projection built by `make` unless `key` is already
    /// present. Returns the new projection, or `None` if it existed.
    ///
    /// `make` runs under the shard lock, so two racing callers never both
    /// build a projection for the same key.
    pub fn register_with<F>(&self, key: &AttributeKey, make: F) -> Option<Arc<Projection>>
    where
        F: FnOnce() -> Projection,
    {
        match self.by_key.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let projection = Arc::new(make());
                slot.insert(Arc::clone(&projection));
                Some(projection)
            }
        }
    }

    pub fn get(&self, key: &AttributeKey) -> Option<Arc<Projection>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    pub fn contains(&self, key: &AttributeKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// All projections, sorted by key.
    pub fn projections(&self) -> Vec<Arc<Projection>> {
        let mut all: Vec<Arc<Projection>> =
            self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        all.sort_by(|a, b| a.key().cmp(b.key()));
        all
    }
}

impl std::fmt::Debug for ProjectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionRegistry")
            .field("len", &self.len())
            .finish()
    }
}
