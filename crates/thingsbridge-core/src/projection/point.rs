// ── Projected points ──
//
// Thin host-facing wrappers over a single Snapshot key. A point holds
// no value of its own: every render reads the coordinator's current
// Snapshot.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display};
use tracing::{debug, error};

use crate::coordinator::Coordinator;
use crate::error::CoreError;
use crate::model::{AttributeKey, AttributeMap, AttributeValue, Namespace};

/// Integration domain, used in device identifiers.
pub const DOMAIN: &str = "thingsboard";

const NAME_PREFIX: &str = "ThingsBoard";

// ── Metadata ─────────────────────────────────────────────────────

/// Device grouping shared by every point of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, entry_id)` pairs identifying the device.
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub configuration_url: String,
}

impl DeviceInfo {
    pub fn for_entry(entry_id: &str, host: &str) -> Self {
        Self {
            identifiers: vec![(DOMAIN.to_owned(), entry_id.to_owned())],
            name: "ThingsBoard Device".into(),
            manufacturer: "ThingsBoard".into(),
            model: "HTTP API Device".into(),
            configuration_url: host.to_owned(),
        }
    }
}

/// Hint telling the host how to aggregate a read-only point's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

/// Declared input bounds of a read-write point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumberLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Input widget hint for hosts.
    pub mode: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    ReadOnly,
    ReadWrite,
}

/// One render of a point, as handed to a host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointState {
    pub key: AttributeKey,
    pub unique_id: String,
    pub name: String,
    pub kind: PointKind,
    pub available: bool,
    pub value: Option<AttributeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<NumberLimits>,
    pub attributes: BTreeMap<String, Value>,
}

/// `"ThingsBoard Shared Fan Speed"` from `"shared_fan_speed"`.
///
/// Underscores become spaces one for one. A letter is upper-cased when the
/// character before it is not a letter (so `temp2x` gives `Temp2X`) and
/// lower-cased otherwise.
fn display_name(raw: &str) -> String {
    let mut title = String::with_capacity(raw.len());
    let mut after_letter = false;
    for c in raw.chars().map(|c| if c == '_' { ' ' } else { c }) {
        if after_letter {
            title.extend(c.to_lowercase());
        } else {
            title.extend(c.to_uppercase());
        }
        after_letter = c.is_lowercase() || c.is_uppercase();
    }
    format!("{NAME_PREFIX} {title}")
}

// ── Read-only point ──────────────────────────────────────────────

/// Renders the raw value of one key as-is.
#[derive(Debug, Clone)]
pub struct ReadOnlyPoint {
    coordinator: Coordinator,
    key: AttributeKey,
    unique_id: String,
    name: String,
    device: DeviceInfo,
}

impl ReadOnlyPoint {
    pub fn new(coordinator: Coordinator, key: AttributeKey) -> Self {
        let qualified = key.to_string();
        let unique_id = format!("{}_{qualified}", coordinator.entry_id());
        let device = DeviceInfo::for_entry(coordinator.entry_id(), coordinator.host());
        Self {
            name: display_name(&qualified),
            coordinator,
            key,
            unique_id,
            device,
        }
    }

    pub fn key(&self) -> &AttributeKey {
        &self.key
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    /// Current raw value, if the key is in the current Snapshot.
    pub fn value(&self) -> Option<AttributeValue> {
        self.coordinator.snapshot()?.get(&self.key).cloned()
    }

    /// Recomputed from the current value on every call.
    pub fn state_class(&self) -> Option<StateClass> {
        self.value()
            .filter(AttributeValue::is_numeric)
            .map(|_| StateClass::Measurement)
    }

    pub fn available(&self) -> bool {
        self.coordinator.is_available(&self.key)
    }

    pub fn extra_attributes(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([("attribute_key".to_owned(), Value::String(self.key.to_string()))])
    }

    pub fn render(&self) -> PointState {
        let value = self.value();
        PointState {
            key: self.key.clone(),
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            kind: PointKind::ReadOnly,
            available: self.available(),
            state_class: value
                .as_ref()
                .filter(|v| v.is_numeric())
                .map(|_| StateClass::Measurement),
            value,
            limits: None,
            attributes: self.extra_attributes(),
        }
    }
}

// ── Read-write point ─────────────────────────────────────────────

/// Numeric, writable view of one `shared_*` key.
#[derive(Debug, Clone)]
pub struct ReadWritePoint {
    coordinator: Coordinator,
    key: AttributeKey,
    unique_id: String,
    name: String,
    device: DeviceInfo,
}

impl ReadWritePoint {
    pub const MIN_VALUE: f64 = -1_000_000.0;
    pub const MAX_VALUE: f64 = 1_000_000.0;
    pub const STEP: f64 = 0.1;
    pub const LIMITS: NumberLimits = NumberLimits {
        min: Self::MIN_VALUE,
        max: Self::MAX_VALUE,
        step: Self::STEP,
        mode: "box",
    };

    pub fn new(coordinator: Coordinator, key: AttributeKey) -> Self {
        let unique_id = format!("{}_{key}_number", coordinator.entry_id());
        let device = DeviceInfo::for_entry(coordinator.entry_id(), coordinator.host());
        Self {
            name: display_name(key.name()),
            coordinator,
            key,
            unique_id,
            device,
        }
    }

    pub fn key(&self) -> &AttributeKey {
        &self.key
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device
    }

    pub const fn range() -> RangeInclusive<f64> {
        Self::MIN_VALUE..=Self::MAX_VALUE
    }

    /// Current value as `f64`. `None` when the key is missing or its value
    /// is no longer numeric.
    pub fn native_value(&self) -> Option<f64> {
        self.coordinator.snapshot()?.get(&self.key)?.as_f64()
    }

    pub fn available(&self) -> bool {
        self.coordinator.is_available(&self.key)
    }

    /// `attribute_key` plus `last_update`, the completion time of the
    /// Snapshot currently served.
    pub fn extra_attributes(&self) -> BTreeMap<String, Value> {
        let last_update = self
            .coordinator
            .snapshot()
            .map_or(Value::Null, |snap| Value::String(snap.fetched_at().to_rfc3339()));
        BTreeMap::from([
            ("attribute_key".to_owned(), Value::String(self.key.to_string())),
            ("last_update".to_owned(), last_update),
        ])
    }

    /// Write `value` under the bare attribute name.
    ///
    /// Rejects non-finite or out-of-range input before any request. The
    /// returned flag is the coordinator's write outcome.
    pub async fn set_value(&self, value: f64) -> Result<bool, CoreError> {
        if !value.is_finite() || !Self::range().contains(&value) {
            return Err(CoreError::ValidationFailed {
                message: format!(
                    "{value} is outside {}..={} for '{}'",
                    Self::MIN_VALUE,
                    Self::MAX_VALUE,
                    self.key
                ),
            });
        }

        let body: AttributeMap =
            BTreeMap::from([(self.key.name().to_owned(), AttributeValue::Float(value))]);
        let ok = self.coordinator.write(&body).await;
        if ok {
            debug!(key = %self.key, value, "point value set");
        } else {
            error!(key = %self.key, value, "failed to set point value");
        }
        Ok(ok)
    }

    pub fn render(&self) -> PointState {
        PointState {
            key: self.key.clone(),
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            kind: PointKind::ReadWrite,
            available: self.available(),
            value: self.native_value().map(AttributeValue::Float),
            state_class: None,
            limits: Some(Self::LIMITS),
            attributes: self.extra_attributes(),
        }
    }
}

// ── Projection ───────────────────────────────────────────────────

/// A projected point of either kind.
#[derive(Debug, Clone)]
pub enum Projection {
    ReadOnly(ReadOnlyPoint),
    ReadWrite(ReadWritePoint),
}

impl Projection {
    /// Pick the variant for `key` from its first-seen `value`: read-write
    /// for numeric shared values, read-only otherwise. The choice never
    /// changes afterwards.
    pub fn for_key(coordinator: Coordinator, key: AttributeKey, value: &AttributeValue) -> Self {
        if key.namespace() == Namespace::Shared && value.is_numeric() {
            Self::ReadWrite(ReadWritePoint::new(coordinator, key))
        } else {
            Self::ReadOnly(ReadOnlyPoint::new(coordinator, key))
        }
    }

    pub fn kind(&self) -> PointKind {
        match self {
            Self::ReadOnly(_) => PointKind::ReadOnly,
            Self::ReadWrite(_) => PointKind::ReadWrite,
        }
    }

    pub fn key(&self) -> &AttributeKey {
        match self {
            Self::ReadOnly(p) => p.key(),
            Self::ReadWrite(p) => p.key(),
        }
    }

    pub fn unique_id(&self) -> &str {
        match self {
            Self::ReadOnly(p) => p.unique_id(),
            Self::ReadWrite(p) => p.unique_id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::ReadOnly(p) => p.name(),
            Self::ReadWrite(p) => p.name(),
        }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        match self {
            Self::ReadOnly(p) => p.device_info(),
            Self::ReadWrite(p) => p.device_info(),
        }
    }

    pub fn available(&self) -> bool {
        match self {
            Self::ReadOnly(p) => p.available(),
            Self::ReadWrite(p) => p.available(),
        }
    }

    pub fn render(&self) -> PointState {
        match self {
            Self::ReadOnly(p) => p.render(),
            Self::ReadWrite(p) => p.render(),
        }
    }

    pub fn as_read_write(&self) -> Option<&ReadWritePoint> {
        match self {
            Self::ReadWrite(p) => Some(p),
            Self::ReadOnly(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::EntryConfig;
    use secrecy::SecretString;

    fn coordinator() -> Coordinator {
        let config = EntryConfig::new(
            "abc123",
            "ThingsBoard (https://tb.example.com)",
            "https://tb.example.com",
            SecretString::from("token".to_owned()),
        );
        Coordinator::new(config, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn display_name_title_cases_words() {
        assert_eq!(display_name("client_temp"), "ThingsBoard Client Temp");
        assert_eq!(display_name("fan_SPEED"), "ThingsBoard Fan Speed");
        assert_eq!(display_name("a__b"), "ThingsBoard A  B");
        assert_eq!(display_name("temp2x"), "ThingsBoard Temp2X");
        assert_eq!(display_name("co2_ppm"), "ThingsBoard Co2 Ppm");
    }

    #[test]
    fn read_only_metadata() {
        let point = ReadOnlyPoint::new(coordinator(), AttributeKey::client("temp"));
        assert_eq!(point.unique_id(), "abc123_client_temp");
        assert_eq!(point.name(), "ThingsBoard Client Temp");
        assert_eq!(point.device_info().configuration_url, "https://tb.example.com");
        assert_eq!(
            point.device_info().identifiers,
            vec![(DOMAIN.to_owned(), "abc123".to_owned())]
        );
    }

    #[test]
    fn read_write_metadata_uses_bare_name() {
        let point = ReadWritePoint::new(coordinator(), AttributeKey::shared("setpoint"));
        assert_eq!(point.unique_id(), "abc123_shared_setpoint_number");
        assert_eq!(point.name(), "ThingsBoard Setpoint");

        let state = point.render();
        let limits = state.limits.unwrap();
        assert_eq!(limits.mode, "box");
        assert!((limits.step - 0.1).abs() < f64::EPSILON);
        assert!((limits.max - 1_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn variant_follows_namespace_and_value() {
        let c = coordinator();
        let shared_num =
            Projection::for_key(c.clone(), AttributeKey::shared("sp"), &AttributeValue::Int(22));
        let shared_str =
            Projection::for_key(c.clone(), AttributeKey::shared("mode"), &AttributeValue::from("eco"));
        let shared_bool =
            Projection::for_key(c.clone(), AttributeKey::shared("on"), &AttributeValue::Bool(true));
        let client_num =
            Projection::for_key(c, AttributeKey::client("temp"), &AttributeValue::Float(21.5));

        assert_eq!(shared_num.kind(), PointKind::ReadWrite);
        assert_eq!(shared_str.kind(), PointKind::ReadOnly);
        assert_eq!(shared_bool.kind(), PointKind::ReadOnly);
        assert_eq!(client_num.kind(), PointKind::ReadOnly);
    }

    #[test]
    fn render_without_snapshot_is_unavailable() {
        let point = ReadOnlyPoint::new(coordinator(), AttributeKey::client("temp"));
        let state = point.render();
        assert!(!state.available);
        assert!(state.value.is_none());
        assert!(state.state_class.is_none());
        assert_eq!(state.attributes["attribute_key"], Value::from("client_temp"));
    }

    #[tokio::test]
    async fn out_of_range_write_is_rejected_locally() {
        let point = ReadWritePoint::new(coordinator(), AttributeKey::shared("sp"));
        for bad in [1_000_000.5, -2_000_000.0, f64::NAN, f64::INFINITY] {
            let result = point.set_value(bad).await;
            assert!(matches!(result, Err(CoreError::ValidationFailed { .. })));
        }
    }
}
