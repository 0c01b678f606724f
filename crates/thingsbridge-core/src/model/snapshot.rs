// ── Snapshot ──
//
// One refresh cycle's flattened attributes. Built once, shared as
// `Arc<Snapshot>`, and replaced wholesale by the next successful refresh.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AttributeKey, AttributeValue};

/// Immutable flattened view of the device attributes at `fetched_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    attributes: BTreeMap<AttributeKey, AttributeValue>,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(attributes: BTreeMap<AttributeKey, AttributeValue>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            attributes,
            fetched_at,
        }
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn contains(&self, key: &AttributeKey) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Entries in key order (client group first, then shared).
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeValue)> {
        self.attributes.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AttributeKey> {
        self.attributes.keys()
    }

    /// When the refresh that produced this snapshot completed.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
