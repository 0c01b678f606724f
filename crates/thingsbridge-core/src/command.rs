// ── Command API ──
//
// The two externally callable write operations. Both are routed by
// configuration-entry id and end in the entry coordinator's `write()`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AttributeMap, AttributeValue};

/// An attribute write addressed to one configured entry.
///
/// `attribute_key` and the keys of `attributes` are sent to the remote
/// exactly as given; they are bare shared-attribute names, not
/// `shared_`-qualified keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum Command {
    SetAttribute {
        #[serde(alias = "config_entry_id")]
        entry_id: String,
        attribute_key: String,
        value: AttributeValue,
    },
    SetAttributes {
        #[serde(alias = "config_entry_id")]
        entry_id: String,
        attributes: AttributeMap,
    },
}

impl Command {
    pub fn entry_id(&self) -> &str {
        match self {
            Self::SetAttribute { entry_id, .. } | Self::SetAttributes { entry_id, .. } => entry_id,
        }
    }

    /// The POST body this command produces.
    pub fn into_body(self) -> AttributeMap {
        match self {
            Self::SetAttribute {
                attribute_key,
                value,
                ..
            } => BTreeMap::from([(attribute_key, value)]),
            Self::SetAttributes { attributes, .. } => attributes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_attribute_body_is_single_pair() {
        let cmd = Command::SetAttribute {
            entry_id: "e1".into(),
            attribute_key: "setpoint".into(),
            value: AttributeValue::Float(23.5),
        };
        assert_eq!(cmd.entry_id(), "e1");
        assert_eq!(
            serde_json::to_value(cmd.into_body()).unwrap(),
            json!({"setpoint": 23.5})
        );
    }

    #[test]
    fn deserializes_service_call_payload() {
        let cmd: Command = serde_json::from_value(json!({
            "service": "set_attributes",
            "config_entry_id": "e1",
            "attributes": {"mode": "eco", "setpoint": 21}
        }))
        .unwrap();

        assert_eq!(cmd.entry_id(), "e1");
        let body = cmd.into_body();
        assert_eq!(body["mode"], AttributeValue::from("eco"));
        assert_eq!(body["setpoint"], AttributeValue::Int(21));
    }
}
