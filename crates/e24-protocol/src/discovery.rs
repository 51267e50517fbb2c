use serde::{Deserialize, Serialize};

use crate::sensor::SensorKind;

/// Manufacturer reported in the discovery `device` block.
pub const MANUFACTURER: &str = "Plum";
/// Model reported in the discovery `device` block.
pub const MODEL: &str = "ecoNET";

/// `device` block shared by every entity of one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDevice {
    pub identifiers: Vec<String>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

/// Home-Assistant MQTT discovery config for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryPayload {
    pub name: String,
    pub unique_id: String,
    /// Controls the generated `entity_id`.
    pub object_id: String,
    pub state_topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,
    pub availability_topic: String,
    pub device: DiscoveryDevice,
}

/// A discovery announcement: where to publish and what.
///
/// One per distinct sensor id. Publishing identical content twice is a no-op
/// for Home-Assistant, so records are simply republished on every (re)connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub kind: SensorKind,
    pub topic: String,
    pub payload: DiscoveryPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(kind: SensorKind) -> DiscoveryPayload {
        DiscoveryPayload {
            name: "Pump Speed".into(),
            unique_id: "econet24_grant_pump_speed".into(),
            object_id: "econet24_grant_pump_speed".into(),
            state_topic: "econet24/grant/pump_speed/state".into(),
            unit_of_measurement: Some("RPM".into()),
            device_class: None,
            state_class: Some("measurement".into()),
            icon: Some("mdi:pump".into()),
            payload_on: (kind == SensorKind::BinarySensor).then(|| "ON".into()),
            payload_off: (kind == SensorKind::BinarySensor).then(|| "OFF".into()),
            availability_topic: "econet24/bridge/status".into(),
            device: DiscoveryDevice {
                identifiers: vec!["econet24_grant".into()],
                name: "Grant".into(),
                manufacturer: MANUFACTURER.into(),
                model: MODEL.into(),
            },
        }
    }

    #[test]
    fn optional_fields_are_omitted() {
        let value = serde_json::to_value(sample(SensorKind::Sensor)).unwrap();
        assert!(value.get("device_class").is_none());
        assert!(value.get("payload_on").is_none());
        assert_eq!(value["unit_of_measurement"], "RPM");
        assert_eq!(
            value["device"],
            json!({
                "identifiers": ["econet24_grant"],
                "name": "Grant",
                "manufacturer": "Plum",
                "model": "ecoNET"
            })
        );
    }

    #[test]
    fn binary_payloads_present_for_binary_sensors() {
        let value = serde_json::to_value(sample(SensorKind::BinarySensor)).unwrap();
        assert_eq!(value["payload_on"], "ON");
        assert_eq!(value["payload_off"], "OFF");
    }
}
