// ── Attribute flattening ──
//
// `{client: {k: v}, shared: {k: v}}` → `{client_k: v, shared_k: v}`.
// Pure; the coordinator stamps the result into a Snapshot.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thingsbridge_api::AttributesResponse;

use crate::model::{AttributeKey, AttributeValue, Namespace};

/// Flatten both attribute groups into namespace-qualified keys.
///
/// A missing group contributes no keys. Keys are unique per namespace, so
/// the same bare name in both groups yields two distinct entries.
pub fn flatten(response: AttributesResponse) -> BTreeMap<AttributeKey, AttributeValue> {
    let mut flat = BTreeMap::new();
    extend_group(&mut flat, Namespace::Client, response.client);
    extend_group(&mut flat, Namespace::Shared, response.shared);
    flat
}

fn extend_group(
    flat: &mut BTreeMap<AttributeKey, AttributeValue>,
    namespace: Namespace,
    group: Option<Map<String, Value>>,
) {
    let Some(group) = group else { return };
    flat.extend(
        group
            .into_iter()
            .map(|(name, value)| (AttributeKey::new(namespace, name), AttributeValue::from_json(value))),
    );
}
