// ── Domain model ──
//
// Attribute keys, tagged scalar values, and the per-refresh snapshot.

pub mod key;
pub mod snapshot;
pub mod value;

use std::collections::BTreeMap;

pub use key::{AttributeKey, Namespace};
pub use snapshot::Snapshot;
pub use value::AttributeValue;

/// Bare (unprefixed) attribute name → value, as sent in a write.
pub type AttributeMap = BTreeMap<String, AttributeValue>;
