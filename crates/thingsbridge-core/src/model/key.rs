// ── Attribute keys ──
//
// A key is a bare attribute name qualified by the group it was read
// from. The qualified string form (`client_temp`, `shared_setpoint`)
// is what hosts see as the point identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};

use crate::error::CoreError;

/// The attribute group a key was flattened from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Device-reported, read-only.
    Client,
    /// Server-side, writable through the attributes endpoint.
    Shared,
}

impl Namespace {
    /// Prefix prepended to bare names when flattening (`"client_"`, `"shared_"`).
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Client => "client_",
            Self::Shared => "shared_",
        }
    }
}

/// A namespace-qualified attribute key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
    namespace: Namespace,
    name: String,
}

impl AttributeKey {
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    pub fn client(name: impl Into<String>) -> Self {
        Self::new(Namespace::Client, name)
    }

    pub fn shared(name: impl Into<String>) -> Self {
        Self::new(Namespace::Shared, name)
    }

    /// Parse a qualified key. Returns `None` when the string carries
    /// neither prefix or the bare name is empty.
    pub fn parse(qualified: &str) -> Option<Self> {
        [Namespace::Client, Namespace::Shared]
            .into_iter()
            .find_map(|ns| {
                qualified
                    .strip_prefix(ns.prefix())
                    .filter(|name| !name.is_empty())
                    .map(|name| Self::new(ns, name))
            })
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// The bare name, as the remote knows it.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.namespace.prefix(), self.name)
    }
}

impl FromStr for AttributeKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::ValidationFailed {
            message: format!("attribute key '{s}' must start with 'client_' or 'shared_'"),
        })
    }
}

impl Serialize for AttributeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AttributeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_is_qualified() {
        assert_eq!(AttributeKey::client("temp").to_string(), "client_temp");
        assert_eq!(AttributeKey::shared("setpoint").to_string(), "shared_setpoint");
    }

    #[test]
    fn parse_round_trips_display() {
        let key = AttributeKey::shared("fan_speed");
        assert_eq!(AttributeKey::parse(&key.to_string()), Some(key));
    }

    #[test]
    fn parse_keeps_nested_prefix_in_name() {
        let key = AttributeKey::parse("client_shared_x").unwrap();
        assert_eq!(key.namespace(), Namespace::Client);
        assert_eq!(key.name(), "shared_x");
    }

    #[test]
    fn parse_rejects_unprefixed_and_empty() {
        assert!(AttributeKey::parse("temp").is_none());
        assert!(AttributeKey::parse("shared_").is_none());
        assert!("server_temp".parse::<AttributeKey>().is_err());
    }

    #[test]
    fn namespaces_order_client_first() {
        assert!(AttributeKey::client("z") < AttributeKey::shared("a"));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&AttributeKey::client("temp")).unwrap();
        assert_eq!(json, "\"client_temp\"");
    }
}
