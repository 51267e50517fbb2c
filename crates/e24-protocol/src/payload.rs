use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw telemetry for one controller, as returned by the portal for a single
/// poll cycle.
///
/// The vendor schema is semi-stable, so the payload keeps the JSON documents
/// untyped and exposes lookups that return `None` for anything absent or
/// oddly shaped. Produced fresh each cycle and dropped after mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicePayload {
    /// Controller UID the payload belongs to.
    pub device_uid: String,
    /// `getDeviceParams` response (`curr`, `currUnits`, `wifiQuality`, ...).
    pub params: Value,
    /// `getDeviceEditableParams` response, when that request succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<Value>,
}

impl DevicePayload {
    pub fn new(device_uid: impl Into<String>, params: Value) -> Self {
        Self {
            device_uid: device_uid.into(),
            params,
            editable: None,
        }
    }

    pub fn with_editable(mut self, editable: Value) -> Self {
        self.editable = Some(editable);
        self
    }

    /// A live reading from the `curr` map.
    pub fn current(&self, key: &str) -> Option<&Value> {
        self.params.get("curr")?.get(key)
    }

    /// A field at the top level of the params document (e.g. `wifiQuality`).
    pub fn root(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Value of an editable parameter, looked up by its `name` attribute.
    ///
    /// Editable params are keyed by a numeric id in `data`; the name is the
    /// stable handle, so this scans the entries.
    pub fn editable_param(&self, name: &str) -> Option<&Value> {
        self.editable
            .as_ref()?
            .get("data")?
            .as_object()?
            .values()
            .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))?
            .get("value")
    }

    /// Value of an information param, shaped `[visible, [[value, unit, ..]]]`.
    ///
    /// Returns `None` when the entry is missing, malformed, or flagged as not
    /// visible on the controller.
    pub fn information_param(&self, key: &str) -> Option<&Value> {
        let entry = self
            .editable
            .as_ref()?
            .get("informationParams")?
            .get(key)?
            .as_array()?;

        let visible = entry.first()?.as_bool().unwrap_or(false);
        if !visible {
            return None;
        }

        entry.get(1)?.as_array()?.first()?.as_array()?.first()
    }

    /// Keys of the `curr` map, for diagnostics.
    pub fn current_keys(&self) -> impl Iterator<Item = &str> {
        self.params
            .get("curr")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|m| m.keys().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DevicePayload {
        DevicePayload::new(
            "ABC123",
            json!({
                "curr": {"GrantOutgoingTemp": 45.2, "TempCWU": 999.0},
                "wifiQuality": 87,
                "wifiStrength": -61
            }),
        )
        .with_editable(json!({
            "data": {
                "103": {"name": "HDWTSetPoint", "value": 48},
                "104": {"name": "Circuit1ComfortTemp", "value": 21.5}
            },
            "informationParams": {
                "21": [true, [[52, 31, 0]]],
                "22": [false, [[700, 5, 0]]],
                "231": [true, []]
            }
        }))
    }

    #[test]
    fn current_and_root_lookups() {
        let p = sample();
        assert_eq!(p.current("GrantOutgoingTemp"), Some(&json!(45.2)));
        assert_eq!(p.current("Missing"), None);
        assert_eq!(p.root("wifiQuality"), Some(&json!(87)));
    }

    #[test]
    fn editable_by_name() {
        let p = sample();
        assert_eq!(p.editable_param("HDWTSetPoint"), Some(&json!(48)));
        assert_eq!(p.editable_param("Nope"), None);
    }

    #[test]
    fn information_params_respect_visibility_and_shape() {
        let p = sample();
        assert_eq!(p.information_param("21"), Some(&json!(52)));
        assert_eq!(p.information_param("22"), None, "invisible entry");
        assert_eq!(p.information_param("231"), None, "empty value array");
        assert_eq!(p.information_param("999"), None);
    }

    #[test]
    fn missing_sections_are_tolerated() {
        let p = DevicePayload::new("X", json!("not an object"));
        assert_eq!(p.current("a"), None);
        assert_eq!(p.editable_param("a"), None);
        assert_eq!(p.information_param("21"), None);
        assert_eq!(p.current_keys().count(), 0);
    }
}
